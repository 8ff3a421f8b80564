//! Loss functions and their gradients.

use crate::errors::{NetError, NetResult};
use crate::tensor::Tensor;

fn check_shapes(prediction: &Tensor, target: &Tensor) -> NetResult<()> {
    if prediction.shape() != target.shape() {
        return Err(NetError::Shape(format!(
            "prediction shape {:?} does not match target shape {:?}",
            prediction.shape(),
            target.shape()
        )));
    }
    Ok(())
}

/// Mean squared error over all elements: `mean((prediction - target)^2)`.
pub fn mse(prediction: &Tensor, target: &Tensor) -> NetResult<f64> {
    check_shapes(prediction, target)?;
    let diff = prediction.data() - target.data();
    Ok(diff.mapv(|v| v * v).mean().unwrap_or(0.0))
}

/// Gradient of [`mse`] with respect to the prediction:
/// `2 * (prediction - target) / n`. Feed this to `Network::backward`.
pub fn mse_grad(prediction: &Tensor, target: &Tensor) -> NetResult<Tensor> {
    check_shapes(prediction, target)?;
    let n = (prediction.rows() * prediction.cols()) as f64;
    let grad = (prediction.data() - target.data()).mapv(|v| 2.0 * v / n);
    Ok(Tensor::new(grad))
}
