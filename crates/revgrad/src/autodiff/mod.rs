//! Reverse-mode automatic differentiation.
//!
//! Expressions are built eagerly: every operation on a [`Var`] computes its
//! value immediately and records a node holding strong handles to its
//! operands together with one local derivative rule per operand. A reverse
//! pass walks the ancestors of an output in descending creation order and
//! pushes sensitivities toward the leaves.
//!
//! # Architecture
//!
//! ```text
//! Var<T> ──Rc──► Node<T> ──deps──► (Rc<Node<T>>, VjpRule<T>) ...
//!                  │
//!                  ├── Value<T>            (faer Mat, column-major)
//!                  └── RefCell<Sensitivity<T>>   (k stacked cotangents)
//!
//! backward(&out) ──► ancestors by creation index (max-heap)
//!                ──► reset, seed, propagate_to_inputs in order
//!                ──► drain into Gradients<T>
//! ```
//!
//! # Example
//!
//! ```
//! use revgrad::{Value, Var, backward};
//!
//! let w = Var::new(Value::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap());
//! let x = Var::vector(vec![1.0, -1.0]);
//!
//! let loss = w.matmul(&x).unwrap().squared_norm();
//! let grads = backward(&loss).unwrap();
//!
//! assert_eq!(grads.get(&x).unwrap().shape(), x.shape());
//! ```
//!
//! # Design Notes
//!
//! - No global graph: a node lives while a handle or a consumer refers to it
//! - Thread-local creation counter (no `Arc`, uses `Rc`)
//! - Non-scalar outputs yield a Jacobian from a single pass

mod backward;
#[cfg(feature = "forward-mode")]
mod dual;
mod gradients;
mod graph;
#[cfg(feature = "inspect")]
mod inspect;
pub mod ops;
mod sensitivity;
mod var;

pub use backward::{BackwardOptions, backward, backward_with_options, backward_with_seed};
#[cfg(feature = "forward-mode")]
pub use dual::{Dual, jvp};
pub use gradients::Gradients;
pub use graph::{Dependency, Node, NodeId, OpValues, VjpRule, live_nodes, next_node_id};
#[cfg(feature = "inspect")]
pub use inspect::{NodeSummary, ancestor_graph, to_dot};
pub use ops::{BinaryFn, UnaryFn};
pub use sensitivity::Sensitivity;
pub use var::Var;
