//! revgrad - reverse-mode automatic differentiation
//!
//! This crate differentiates expressions over scalar, vector and matrix
//! values. Expressions are built with ordinary arithmetic on [`Var`]
//! handles; [`backward`] then computes the gradient (or the full Jacobian)
//! of any expression with respect to everything it depends on.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Values (value, linalg modules)
//!     → Value<T> over faer::Mat, Shape, broadcasting, products
//!
//! Level 2: Expression graph (autodiff::Var, autodiff::ops)
//!     → eager evaluation, one local derivative rule per operand
//!
//! Level 3: Passes (autodiff::backward, autodiff::Dual)
//!     → reverse sweep into Gradients, forward-mode JVPs
//! ```
//!
//! # Example
//!
//! ```
//! use revgrad::{Var, backward};
//!
//! let x = Var::scalar(2.0);
//! let y = Var::scalar(3.0);
//! let z = &x * &x + &y;
//!
//! let grads = backward(&z).unwrap();
//! assert_eq!(grads.get(&x).unwrap().as_scalar(), Some(4.0));
//! assert_eq!(grads.get(&y).unwrap().as_scalar(), Some(1.0));
//! ```
//!
//! # Features
//!
//! - `forward-mode` (default): [`autodiff::Dual`] and [`autodiff::jvp`]
//! - `inspect` (default): export the graph with petgraph

pub mod autodiff;
pub mod error;
pub mod linalg;
pub mod random;
pub mod scalar;
pub mod shape;
pub mod value;

pub use autodiff::{
    BackwardOptions, Gradients, Var, backward, backward_with_options, backward_with_seed,
};
pub use error::AdError;
pub use scalar::Scalar;
pub use shape::Shape;
pub use value::Value;
