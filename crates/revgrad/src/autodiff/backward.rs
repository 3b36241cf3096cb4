//! Backward pass execution for reverse-mode automatic differentiation.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use log::{debug, trace};

use super::gradients::Gradients;
use super::graph::Node;
use super::sensitivity::Sensitivity;
use super::var::Var;
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::value::Value;

/// Options for a reverse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackwardOptions {
    /// Keep the sensitivity of intermediate nodes in the result.
    ///
    /// When false, only leaves and the output itself are reported.
    pub retain_intermediates: bool,
}

impl Default for BackwardOptions {
    fn default() -> Self {
        Self {
            retain_intermediates: true,
        }
    }
}

/// Differentiate `output` with respect to everything it depends on.
///
/// A scalar output is seeded with 1. A non-scalar output of `k` components
/// is seeded with the `k x k` identity, so the pass produces the full
/// Jacobian (read it with [`Gradients::jacobian`]).
///
/// Repeating a pass on the same graph gives the same result: every reached
/// accumulator is reset first and drained at the end.
///
/// # Example
///
/// ```
/// use revgrad::{Var, backward};
///
/// let x = Var::vector(vec![1.0, 2.0, 3.0]);
/// let loss = x.squared_norm();
///
/// let grads = backward(&loss).unwrap();
/// assert_eq!(grads.get(&x).unwrap().to_vec(), vec![2.0, 4.0, 6.0]);
/// ```
pub fn backward<T: Scalar>(output: &Var<T>) -> Result<Gradients<T>, AdError> {
    backward_with_options(output, None, BackwardOptions::default())
}

/// Vector-Jacobian product: propagate an explicit cotangent `seed`.
///
/// # Errors
///
/// Returns `AdError::SeedShapeMismatch` if `seed` does not have the shape of
/// `output`.
pub fn backward_with_seed<T: Scalar>(
    output: &Var<T>,
    seed: &Value<T>,
) -> Result<Gradients<T>, AdError> {
    backward_with_options(output, Some(seed), BackwardOptions::default())
}

/// Reverse pass with an optional seed and explicit options.
pub fn backward_with_options<T: Scalar>(
    output: &Var<T>,
    seed: Option<&Value<T>>,
    options: BackwardOptions,
) -> Result<Gradients<T>, AdError> {
    let seed = match seed {
        Some(seed) if seed.shape() != output.shape() => {
            return Err(AdError::SeedShapeMismatch {
                expected: output.shape(),
                actual: seed.shape(),
            });
        }
        Some(seed) => Sensitivity::from_seed(seed.clone()),
        None => Sensitivity::identity(output.shape()),
    };
    let rows = seed.num_rows();

    let order = reverse_topological_order(output.node_rc());
    debug!(
        "backward from node {} ({}): {} node(s), {} cotangent row(s)",
        output.id(),
        output.shape(),
        order.len(),
        rows
    );

    for node in &order {
        node.reset(rows);
    }
    output.node().accumulate(&seed)?;

    for node in &order {
        trace!("propagating node {} ({})", node.id(), node.op());
        node.propagate_to_inputs()?;
    }

    let mut grads = HashMap::with_capacity(order.len());
    for node in &order {
        let Some(sensitivity) = node.take_sensitivity() else {
            continue;
        };
        if options.retain_intermediates || node.is_leaf() || Rc::ptr_eq(node, output.node_rc()) {
            grads.insert(node.id(), sensitivity);
        }
    }
    Ok(Gradients::new(output.shape(), rows, grads))
}

/// Max-heap entry ordered by creation index.
struct Pending<T: Scalar>(Rc<Node<T>>);

impl<T: Scalar> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl<T: Scalar> Eq for Pending<T> {}

impl<T: Scalar> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Scalar> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id().cmp(&other.0.id())
    }
}

/// Ancestors of `start` (itself included) in descending creation order.
///
/// Dependencies always have smaller indices than their consumers, so by the
/// time a node is first popped every ancestor that could push it has already
/// been popped. All copies of it are then on top of the heap and are skipped
/// as duplicates. Constant operands are not visited.
fn reverse_topological_order<T: Scalar>(start: &Rc<Node<T>>) -> Vec<Rc<Node<T>>> {
    let mut heap = BinaryHeap::new();
    heap.push(Pending(Rc::clone(start)));

    let mut order: Vec<Rc<Node<T>>> = Vec::new();
    while let Some(Pending(node)) = heap.pop() {
        if order.last().is_some_and(|last| last.id() == node.id()) {
            continue;
        }
        for dep in node.tracked_dependencies() {
            heap.push(Pending(Rc::clone(dep)));
        }
        order.push(node);
    }
    order
}
