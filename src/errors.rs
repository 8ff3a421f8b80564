//! Error types for the gradnet engine.
//!
//! Every fallible operation in the crate returns [`NetResult`]. All three
//! error classes are unrecoverable at their point of origin and propagate
//! straight to the caller with `?` — there is no retry or silent coercion
//! (mismatched operands are never padded or truncated), and a failing call
//! leaves the prior network state intact and inspectable.

use thiserror::Error;

/// All error conditions surfaced by the engine.
#[derive(Debug, Error)]
pub enum NetError {
    /// Operand dimensions are incompatible: matrix/vector size mismatch in a
    /// forward pass, a backward pass, or an optimizer step.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A call arrived out of order: backward without a preceding matching
    /// forward, a step with no pending input, or an out-of-range reset
    /// position. Reaching the terminal cursor in `step_forward` is NOT a
    /// sequence error — it yields an explicit `None`.
    #[error("sequence error: {0}")]
    Sequence(String),

    /// An optional unit capability was invoked on a variant that does not
    /// override the default stub.
    #[error("`{capability}` not implemented for unit `{unit}`")]
    NotImplemented {
        unit: &'static str,
        capability: &'static str,
    },
}

pub type NetResult<T> = Result<T, NetError>;
