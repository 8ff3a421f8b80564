//! Ordered composition of units with whole-pass and stepped execution.
//!
//! A network threads each unit's output into the next unit's input. Besides
//! the plain `forward` loop it keeps a cursor so a caller (typically the
//! visualizer) can execute one unit per call and inspect the intermediate
//! activation between steps. The cursor always stays in `[0, len]`; stepping
//! at `len` is the explicit end-of-sequence signal, not an error.

use log::{debug, trace};

use crate::errors::{NetError, NetResult};
use crate::graph::GraphSnapshot;
use crate::layer::Unit;
use crate::tensor::Tensor;

/// A feed-forward network: an ordered sequence of heterogeneous units plus
/// the cursor state for stepped execution.
pub struct Network {
    units: Vec<Box<dyn Unit>>,
    cursor: usize,
    last_output: Option<Tensor>,
}

impl Network {
    /// Build a network from fully initialized units. Shapes are fixed at
    /// construction; there is no resize-after-create.
    pub fn new(units: Vec<Box<dyn Unit>>) -> Self {
        Self {
            units,
            cursor: 0,
            last_output: None,
        }
    }

    /// Append a unit to the end of the sequence.
    pub fn add(&mut self, unit: Box<dyn Unit>) {
        self.units.push(unit);
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total trainable scalar parameters across all units.
    pub fn parameter_count(&self) -> usize {
        self.units.iter().map(|u| u.parameter_count()).sum()
    }

    /// Run every unit in order and return the final output.
    ///
    /// Pure inference path: the stepping cursor and its cached output are
    /// neither consulted nor touched.
    pub fn forward(&mut self, input: &Tensor) -> NetResult<Tensor> {
        debug!("forward pass over {} units", self.units.len());
        let mut out = input.clone();
        for (idx, unit) in self.units.iter_mut().enumerate() {
            trace!("forward unit {idx} ({})", unit.name());
            out = unit.forward(&out)?;
        }
        Ok(out)
    }

    /// Execute exactly one unit and advance the cursor.
    ///
    /// A supplied `input` replaces the pending intermediate output before the
    /// step runs (this is how a stepping sequence begins). At the terminal
    /// cursor position the call returns `Ok(None)` without mutating anything,
    /// so callers detect completion without exception-driven control flow.
    pub fn step_forward(&mut self, input: Option<&Tensor>) -> NetResult<Option<Tensor>> {
        if let Some(input) = input {
            self.last_output = Some(input.clone());
        }
        if self.cursor >= self.units.len() {
            trace!("step_forward at terminal cursor {}", self.cursor);
            return Ok(None);
        }
        let pending = self.last_output.clone().ok_or_else(|| {
            NetError::Sequence(format!(
                "step_forward at position {} has no pending input; supply one or reset",
                self.cursor
            ))
        })?;
        let unit = &mut self.units[self.cursor];
        trace!("step_forward unit {} ({})", self.cursor, unit.name());
        let out = unit.forward(&pending)?;
        self.last_output = Some(out.clone());
        self.cursor += 1;
        Ok(Some(out))
    }

    /// Move the cursor to `pos`, optionally clearing the pending output.
    pub fn reset(&mut self, pos: usize, clear_output: bool) -> NetResult<()> {
        if pos > self.units.len() {
            return Err(NetError::Sequence(format!(
                "reset position {pos} exceeds unit count {}",
                self.units.len()
            )));
        }
        self.cursor = pos;
        if clear_output {
            self.last_output = None;
        }
        Ok(())
    }

    /// Cursor position and the unit it points at (`None` at the terminal
    /// position). Read-only introspection.
    pub fn current_layer(&self) -> (usize, Option<&dyn Unit>) {
        let unit = self.units.get(self.cursor).map(|u| &**u);
        (self.cursor, unit)
    }

    /// Propagate a loss gradient through every unit in reverse order.
    ///
    /// Each unit overwrites its own cached parameter gradients as a side
    /// effect. Returns the gradient with respect to the network's original
    /// input, for composability.
    pub fn backward(&mut self, grad_output: &Tensor) -> NetResult<Tensor> {
        debug!("backward pass over {} units", self.units.len());
        let mut grad = grad_output.clone();
        for (idx, unit) in self.units.iter_mut().enumerate().rev() {
            trace!("backward unit {idx} ({})", unit.name());
            grad = unit.backward(&grad)?;
        }
        Ok(grad)
    }

    /// Read-only parameter views, flattened in layer order.
    pub fn params(&self) -> Vec<&Tensor> {
        self.units.iter().flat_map(|u| u.params()).collect()
    }

    /// Read-only gradient views, flattened in layer order and aligned with
    /// [`Network::params`]. Units that have not seen a backward pass
    /// contribute nothing.
    pub fn grads(&self) -> Vec<&Tensor> {
        self.units.iter().flat_map(|u| u.grads()).collect()
    }

    /// Aligned mutable-parameter/gradient views for the optimizer, flattened
    /// in layer order and split into the two lists [`crate::Sgd::step`]
    /// expects. Fails with a sequence error if any trainable unit has not
    /// yet computed gradients.
    pub fn params_and_grads(&mut self) -> NetResult<(Vec<&mut Tensor>, Vec<&Tensor>)> {
        let mut params = Vec::new();
        let mut grads = Vec::new();
        for unit in &mut self.units {
            for (param, grad) in unit.params_and_grads()? {
                params.push(param);
                grads.push(grad);
            }
        }
        Ok((params, grads))
    }

    /// Export the whole topology as one snapshot, threading each unit's
    /// output column into the next unit's input column. Never mutates model
    /// state.
    pub fn to_graph(&self) -> NetResult<GraphSnapshot> {
        let mut snapshot = GraphSnapshot::default();
        let mut upstream: Option<Vec<String>> = None;
        for (idx, unit) in self.units.iter().enumerate() {
            let prefix = format!("layer-{idx}");
            let fragment = unit.to_graph(&prefix, upstream.as_deref())?;
            snapshot.nodes.extend(fragment.nodes);
            snapshot.links.extend(fragment.links);
            upstream = Some(fragment.output_ids);
        }
        Ok(snapshot)
    }
}
