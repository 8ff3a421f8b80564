//! Gradient-descent parameter updates.

use log::trace;

use crate::errors::{NetError, NetResult};
use crate::tensor::Tensor;

/// Plain stochastic gradient descent: `param -= learning_rate * grad`.
///
/// Stateless between steps; no momentum, decay, or scheduling. The optimizer
/// never owns parameters, it only mutates the views handed to it, so one
/// instance can drive any number of networks.
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Change the step size mid-training. Takes effect on the next `step`.
    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Apply one in-place update to every parameter from its aligned
    /// gradient. The two lists must pair up exactly, in length and in shape.
    pub fn step(&self, params: Vec<&mut Tensor>, grads: &[&Tensor]) -> NetResult<()> {
        if params.len() != grads.len() {
            return Err(NetError::Shape(format!(
                "optimizer got {} parameters but {} gradients",
                params.len(),
                grads.len()
            )));
        }
        trace!(
            "sgd step over {} tensors at lr {}",
            params.len(),
            self.learning_rate
        );
        for (param, grad) in params.into_iter().zip(grads) {
            if param.shape() != grad.shape() {
                return Err(NetError::Shape(format!(
                    "parameter shape {:?} does not match gradient shape {:?}",
                    param.shape(),
                    grad.shape()
                )));
            }
            param.data_mut().scaled_add(-self.learning_rate, grad.data());
        }
        Ok(())
    }
}
