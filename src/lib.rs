//! A small feed-forward neural network engine built for inspection.
//!
//! The crate trains networks with manual backpropagation and plain SGD, and
//! can run a forward pass one unit at a time so every intermediate activation
//! is observable. Topology and live activations export as a renderer-agnostic
//! [`GraphSnapshot`].
//!
//! Data flows as column vectors: a layer with `n` inputs consumes a `(n, 1)`
//! [`Tensor`] and produces an `(m, 1)` one. Units cache whatever a later
//! backward pass needs, so the calling order is always forward, then
//! backward, then an optimizer step.
//!
//! ```
//! use gradnet::{DenseLayer, Network, Sgd, Sigmoid, Tensor, WeightInit};
//! use gradnet::loss::mse_grad;
//!
//! # fn main() -> gradnet::NetResult<()> {
//! let mut net = Network::new(vec![
//!     Box::new(DenseLayer::new(3, 2, WeightInit::He, Some(42))?),
//!     Box::new(Sigmoid::new()),
//! ]);
//! let opt = Sgd::new(0.1);
//!
//! let x = Tensor::column(&[4.0, 2.0, 3.0])?;
//! let target = Tensor::column(&[1.0, 0.0])?;
//!
//! let y = net.forward(&x)?;
//! net.backward(&mse_grad(&y, &target)?)?;
//! let (params, grads) = net.params_and_grads()?;
//! opt.step(params, &grads)?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod errors;
pub mod graph;
pub mod layer;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod tensor;

pub use activation::{Relu, Sigmoid};
pub use errors::{NetError, NetResult};
pub use graph::{GraphLink, GraphNode, GraphSnapshot, NodeRole, UnitGraph};
pub use layer::{DenseLayer, Unit, WeightInit};
pub use network::Network;
pub use optimizer::Sgd;
pub use tensor::Tensor;
