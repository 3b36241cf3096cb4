//! Differentiable operations.
//!
//! Each operation computes its value eagerly and attaches one local
//! derivative rule per operand. Elementwise binary operations broadcast a
//! scalar operand against any shape; everything else requires exact shape
//! agreement and fails with `AdError::ShapeMismatch` before creating a node.

mod arith;
mod elementwise;
mod functions;
mod products;
mod reductions;

#[cfg(feature = "forward-mode")]
pub(crate) use elementwise::impl_unary_methods;
pub use functions::{BinaryFn, UnaryFn};
