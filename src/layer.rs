//! The unit capability contract and the dense (fully connected) layer.
//!
//! Layers and activations share one polymorphic interface, [`Unit`], and are
//! composed as `Box<dyn Unit>` inside a network. A unit owns whatever state
//! its backward pass needs (cached forward input/output) and its own gradient
//! buffers; both are overwritten on every pass, never accumulated.
//! Interleaving forward/backward calls from two conceptual batches on one
//! unit is unsupported — the second forward silently discards the first
//! cached state.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::errors::{NetError, NetResult};
use crate::graph::{GraphLink, GraphNode, NodeRole, UnitGraph};
use crate::tensor::Tensor;

const INPUT_NODE_COLOR: &str = "#1f77b4";
const OUTPUT_NODE_COLOR: &str = "#ff7f0e";

/// Capability interface implemented by every layer and activation variant.
///
/// `forward`/`backward` are required. The parameter accessors default to the
/// no-trainable-parameters case, and `to_graph` defaults to a stub that
/// reports [`NetError::NotImplemented`] — concrete variants override the
/// capabilities they actually carry. The abstract default is never shipped as
/// a unit of its own.
pub trait Unit {
    /// Short variant name for errors and introspection.
    fn name(&self) -> &'static str;

    /// Compute this unit's output from its input, caching whatever state the
    /// backward pass will need. Overwrites any previously cached state.
    fn forward(&mut self, input: &Tensor) -> NetResult<Tensor>;

    /// Given the loss gradient with respect to this unit's output, compute
    /// and cache any parameter gradients, then return the loss gradient with
    /// respect to the input. Requires a preceding matching `forward`.
    fn backward(&mut self, grad_output: &Tensor) -> NetResult<Tensor>;

    /// Read-only views of the trainable parameters, in a fixed order.
    fn params(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    /// Read-only views of the cached gradients, aligned with `params`.
    /// Empty until the first backward pass.
    fn grads(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    /// Aligned mutable-parameter/gradient view pairs for the optimizer.
    /// Mutations through the returned views are observed by the unit.
    fn params_and_grads(&mut self) -> NetResult<Vec<(&mut Tensor, &Tensor)>> {
        Ok(Vec::new())
    }

    /// Number of trainable scalar parameters.
    fn parameter_count(&self) -> usize {
        0
    }

    /// Export this unit's contribution to the topology snapshot.
    ///
    /// `input_ids` carries the output column of the upstream unit, to link
    /// against instead of synthesizing a fresh input column. Must not mutate
    /// any model state.
    fn to_graph(&self, _prefix: &str, _input_ids: Option<&[String]>) -> NetResult<UnitGraph> {
        Err(NetError::NotImplemented {
            unit: self.name(),
            capability: "to_graph",
        })
    }
}

/// Weight initialization strategies for dense layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Normal draw scaled by `sqrt(2 / fan_in)`. Good for ReLU stacks.
    He,
    /// Uniform draw in `±sqrt(6 / (fan_in + fan_out))`. Good for sigmoid/tanh.
    Xavier,
    /// Uniform draw in `[min, max)`.
    Uniform { min: f64, max: f64 },
}

/// Fully connected affine layer: `y = W·x + b`.
///
/// `w` is shaped `(output_size, input_size)`, `b` is `(output_size, 1)`;
/// inputs and outputs are column vectors.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    w: Tensor,
    b: Tensor,
    input_size: usize,
    output_size: usize,
    last_input: Option<Tensor>,
    last_output: Option<Tensor>,
    d_w: Option<Tensor>,
    d_b: Option<Tensor>,
}

impl DenseLayer {
    /// Create a layer with freshly initialized weights and zero biases.
    ///
    /// `seed` makes initialization reproducible; `None` draws a random seed.
    pub fn new(
        input_size: usize,
        output_size: usize,
        init: WeightInit,
        seed: Option<u64>,
    ) -> NetResult<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(NetError::Shape(format!(
                "dense layer sizes must be non-zero, got {input_size} -> {output_size}"
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(|| rand::thread_rng().gen()));
        let w = Tensor::new(init_weight_matrix(output_size, input_size, init, &mut rng)?);
        let b = Tensor::zeros(output_size, 1)?;
        Ok(Self {
            w,
            b,
            input_size,
            output_size,
            last_input: None,
            last_output: None,
            d_w: None,
            d_b: None,
        })
    }

    /// Create a layer from explicit weights and biases.
    ///
    /// Shapes must already agree: `w` is `(out, in)` and `b` is `(out, 1)`.
    pub fn from_weights(w: Tensor, b: Tensor) -> NetResult<Self> {
        let (output_size, input_size) = w.shape();
        if input_size == 0 || output_size == 0 {
            return Err(NetError::Shape(format!(
                "weight matrix must be non-empty, got {:?}",
                w.shape()
            )));
        }
        if b.shape() != (output_size, 1) {
            return Err(NetError::Shape(format!(
                "bias shape {:?} does not match weight rows ({output_size}, 1)",
                b.shape()
            )));
        }
        Ok(Self {
            w,
            b,
            input_size,
            output_size,
            last_input: None,
            last_output: None,
            d_w: None,
            d_b: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Current weight matrix.
    pub fn weights(&self) -> &Tensor {
        &self.w
    }

    /// Current bias vector.
    pub fn bias(&self) -> &Tensor {
        &self.b
    }
}

/// Sample a `(rows, cols)` weight matrix under the given strategy.
///
/// Whatever the strategy, the draw must avoid deterministic collapse — an
/// all-zero matrix would make every gradient degenerate.
fn init_weight_matrix(
    rows: usize,
    cols: usize,
    init: WeightInit,
    rng: &mut ChaCha8Rng,
) -> NetResult<Array2<f64>> {
    match init {
        WeightInit::He => {
            let std_dev = (2.0 / cols as f64).sqrt();
            let normal = Normal::new(0.0, std_dev)
                .map_err(|e| NetError::Shape(format!("invalid normal distribution: {e}")))?;
            Ok(Array2::from_shape_fn((rows, cols), |_| normal.sample(rng)))
        }
        WeightInit::Xavier => {
            let bound = (6.0 / (rows + cols) as f64).sqrt();
            let uniform = Uniform::new(-bound, bound);
            Ok(Array2::from_shape_fn((rows, cols), |_| uniform.sample(rng)))
        }
        WeightInit::Uniform { min, max } => {
            if min >= max {
                return Err(NetError::Shape(format!(
                    "uniform init requires min < max, got [{min}, {max})"
                )));
            }
            let uniform = Uniform::new(min, max);
            Ok(Array2::from_shape_fn((rows, cols), |_| uniform.sample(rng)))
        }
    }
}

impl Unit for DenseLayer {
    fn name(&self) -> &'static str {
        "DenseLayer"
    }

    fn forward(&mut self, input: &Tensor) -> NetResult<Tensor> {
        if input.shape() != (self.input_size, 1) {
            return Err(NetError::Shape(format!(
                "dense forward expected input ({}, 1), got {:?}",
                self.input_size,
                input.shape()
            )));
        }
        let output = Tensor::new(self.w.data().dot(input.data()) + self.b.data());
        self.last_input = Some(input.clone());
        self.last_output = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> NetResult<Tensor> {
        if grad_output.shape() != (self.output_size, 1) {
            return Err(NetError::Shape(format!(
                "dense backward expected gradient ({}, 1), got {:?}",
                self.output_size,
                grad_output.shape()
            )));
        }
        let x = self.last_input.as_ref().ok_or_else(|| {
            NetError::Sequence("dense backward called before any forward pass".to_string())
        })?;
        let g = grad_output.data();

        // dL/dW = g · xᵀ (outer product), dL/db = g, dL/dx = Wᵀ · g.
        let d_w = g.dot(&x.data().t());
        let d_b = g.to_owned();
        let grad_input = Tensor::new(self.w.data().t().dot(g));

        self.d_w = Some(Tensor::new(d_w));
        self.d_b = Some(Tensor::new(d_b));
        Ok(grad_input)
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.w, &self.b]
    }

    fn grads(&self) -> Vec<&Tensor> {
        match (&self.d_w, &self.d_b) {
            (Some(d_w), Some(d_b)) => vec![d_w, d_b],
            _ => Vec::new(),
        }
    }

    fn params_and_grads(&mut self) -> NetResult<Vec<(&mut Tensor, &Tensor)>> {
        let d_w = self.d_w.as_ref().ok_or_else(|| {
            NetError::Sequence(
                "dense gradients requested before any backward pass".to_string(),
            )
        })?;
        let d_b = self.d_b.as_ref().ok_or_else(|| {
            NetError::Sequence(
                "dense gradients requested before any backward pass".to_string(),
            )
        })?;
        Ok(vec![(&mut self.w, d_w), (&mut self.b, d_b)])
    }

    fn parameter_count(&self) -> usize {
        self.output_size * self.input_size + self.output_size
    }

    fn to_graph(&self, prefix: &str, input_ids: Option<&[String]>) -> NetResult<UnitGraph> {
        let mut nodes = Vec::new();
        let mut links = Vec::new();

        // Link against the upstream output column when one exists; otherwise
        // this layer heads the network and contributes its own input column.
        let source_ids: Vec<String> = match input_ids {
            Some(ids) if !ids.is_empty() => {
                if ids.len() != self.input_size {
                    return Err(NetError::Shape(format!(
                        "upstream column has {} nodes, dense layer expects {}",
                        ids.len(),
                        self.input_size
                    )));
                }
                ids.to_vec()
            }
            _ => (0..self.input_size)
                .map(|i| {
                    let id = format!("{prefix}:in:{i}");
                    nodes.push(GraphNode {
                        id: id.clone(),
                        layer: Some(prefix.to_string()),
                        neuron: Some(i),
                        role: Some(NodeRole::Input),
                        activation: self.last_input.as_ref().and_then(|t| t.get(i, 0)),
                        label: Some(format!("in{i}")),
                        color: Some(INPUT_NODE_COLOR.to_string()),
                    });
                    id
                })
                .collect(),
        };

        let output_ids: Vec<String> = (0..self.output_size)
            .map(|j| {
                let id = format!("{prefix}:out:{j}");
                nodes.push(GraphNode {
                    id: id.clone(),
                    layer: Some(prefix.to_string()),
                    neuron: Some(j),
                    role: Some(NodeRole::Output),
                    activation: self.last_output.as_ref().and_then(|t| t.get(j, 0)),
                    label: Some(format!("out{j}")),
                    color: Some(OUTPUT_NODE_COLOR.to_string()),
                });
                id
            })
            .collect();

        for j in 0..self.output_size {
            for i in 0..self.input_size {
                links.push(GraphLink {
                    source: source_ids[i].clone(),
                    target: output_ids[j].clone(),
                    weight: self.w.get(j, i),
                    color: None,
                });
            }
        }

        Ok(UnitGraph {
            nodes,
            links,
            output_ids,
        })
    }
}
