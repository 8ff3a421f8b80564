//! Elementwise activation units.
//!
//! Activations carry no trainable parameters; they cache only what their
//! local derivative needs. Sigmoid keeps its forward *output* (the derivative
//! `y·(1-y)` falls out of it without re-running the exponential), ReLU keeps
//! its forward *input*. In the topology snapshot both are pass-through: they
//! forward the upstream node column unchanged.

use crate::errors::{NetError, NetResult};
use crate::graph::UnitGraph;
use crate::layer::Unit;
use crate::tensor::Tensor;

/// Logistic sigmoid: `f(x) = 1 / (1 + e^-x)`.
#[derive(Debug, Clone, Default)]
pub struct Sigmoid {
    last_output: Option<Tensor>,
}

impl Sigmoid {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clamped evaluation; `exp` overflows f64 well before |x| reaches 750, and
/// the curve is flat to machine precision long before 50.
fn sigmoid(x: f64) -> f64 {
    if x < -50.0 {
        0.0
    } else if x > 50.0 {
        1.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

impl Unit for Sigmoid {
    fn name(&self) -> &'static str {
        "Sigmoid"
    }

    fn forward(&mut self, input: &Tensor) -> NetResult<Tensor> {
        let output = Tensor::new(input.data().mapv(sigmoid));
        self.last_output = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Tensor) -> NetResult<Tensor> {
        let y = self.last_output.as_ref().ok_or_else(|| {
            NetError::Sequence("sigmoid backward called before any forward pass".to_string())
        })?;
        if grad_output.shape() != y.shape() {
            return Err(NetError::Shape(format!(
                "sigmoid backward expected gradient {:?}, got {:?}",
                y.shape(),
                grad_output.shape()
            )));
        }
        // f'(x) = y·(1-y), taken from the cached output.
        let local = y.data().mapv(|v| v * (1.0 - v));
        Ok(Tensor::new(local * grad_output.data()))
    }

    fn to_graph(&self, _prefix: &str, input_ids: Option<&[String]>) -> NetResult<UnitGraph> {
        Ok(UnitGraph {
            output_ids: input_ids.map(<[String]>::to_vec).unwrap_or_default(),
            ..UnitGraph::default()
        })
    }
}

/// Rectified linear unit: `f(x) = max(0, x)`.
#[derive(Debug, Clone, Default)]
pub struct Relu {
    last_input: Option<Tensor>,
}

impl Relu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Unit for Relu {
    fn name(&self) -> &'static str {
        "Relu"
    }

    fn forward(&mut self, input: &Tensor) -> NetResult<Tensor> {
        self.last_input = Some(input.clone());
        Ok(Tensor::new(input.data().mapv(|x| x.max(0.0))))
    }

    fn backward(&mut self, grad_output: &Tensor) -> NetResult<Tensor> {
        let x = self.last_input.as_ref().ok_or_else(|| {
            NetError::Sequence("relu backward called before any forward pass".to_string())
        })?;
        if grad_output.shape() != x.shape() {
            return Err(NetError::Shape(format!(
                "relu backward expected gradient {:?}, got {:?}",
                x.shape(),
                grad_output.shape()
            )));
        }
        // Gate by the cached input: gradient passes only where x > 0.
        let mask = x.data().mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        Ok(Tensor::new(mask * grad_output.data()))
    }

    fn to_graph(&self, _prefix: &str, input_ids: Option<&[String]>) -> NetResult<UnitGraph> {
        Ok(UnitGraph {
            output_ids: input_ids.map(<[String]>::to_vec).unwrap_or_default(),
            ..UnitGraph::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_forward_values() {
        let mut act = Sigmoid::new();
        let out = act
            .forward(&Tensor::column(&[0.0, 100.0, -100.0]).unwrap())
            .unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 0.5);
        assert_relative_eq!(out.get(1, 0).unwrap(), 1.0);
        assert_relative_eq!(out.get(2, 0).unwrap(), 0.0);
    }

    #[test]
    fn sigmoid_backward_uses_cached_output() {
        let mut act = Sigmoid::new();
        let x = Tensor::column(&[0.3, -1.2]).unwrap();
        let y = act.forward(&x).unwrap();
        let grad_output = Tensor::column(&[0.7, 2.0]).unwrap();
        let grad_input = act.backward(&grad_output).unwrap();

        for i in 0..2 {
            let yi = y.get(i, 0).unwrap();
            let expected = yi * (1.0 - yi) * grad_output.get(i, 0).unwrap();
            assert_relative_eq!(grad_input.get(i, 0).unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn relu_gates_gradient_by_input_sign() {
        let mut act = Relu::new();
        let out = act
            .forward(&Tensor::column(&[2.0, -3.0, 0.0]).unwrap())
            .unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 2.0);
        assert_relative_eq!(out.get(1, 0).unwrap(), 0.0);
        assert_relative_eq!(out.get(2, 0).unwrap(), 0.0);

        let grad_input = act
            .backward(&Tensor::column(&[1.0, 1.0, 1.0]).unwrap())
            .unwrap();
        assert_relative_eq!(grad_input.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(grad_input.get(1, 0).unwrap(), 0.0);
        assert_relative_eq!(grad_input.get(2, 0).unwrap(), 0.0);
    }

    #[test]
    fn backward_before_forward_is_a_sequence_error() {
        let g = Tensor::column(&[1.0]).unwrap();
        assert!(matches!(
            Sigmoid::new().backward(&g).unwrap_err(),
            NetError::Sequence(_)
        ));
        assert!(matches!(
            Relu::new().backward(&g).unwrap_err(),
            NetError::Sequence(_)
        ));
    }

    #[test]
    fn activations_have_no_trainable_parameters() {
        let mut act = Sigmoid::new();
        assert!(act.params().is_empty());
        assert!(act.grads().is_empty());
        assert!(act.params_and_grads().unwrap().is_empty());
        assert_eq!(act.parameter_count(), 0);
    }

    #[test]
    fn graph_export_is_pass_through() {
        let ids = vec!["layer-0:out:0".to_string(), "layer-0:out:1".to_string()];
        let g = Sigmoid::new().to_graph("layer-1", Some(&ids)).unwrap();
        assert!(g.nodes.is_empty());
        assert!(g.links.is_empty());
        assert_eq!(g.output_ids, ids);
    }
}
