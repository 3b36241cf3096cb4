//! User-facing expression handle.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::graph::{Dependency, Node, NodeId, VjpRule};
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// Shared handle to an expression node.
///
/// Cloning a `Var` is cheap and yields another handle to the same node, so
/// both clones see the same gradient. A node lives as long as some handle
/// or some consumer node refers to it.
///
/// # Example
///
/// ```
/// use revgrad::{Var, backward};
///
/// let x = Var::scalar(2.0);
/// let y = Var::scalar(3.0);
/// let z = &x * &x + &y;
///
/// let grads = backward(&z).unwrap();
/// assert_eq!(z.value().as_scalar(), Some(7.0));
/// assert_eq!(grads.get(&x).unwrap().as_scalar(), Some(4.0));
/// assert_eq!(grads.get(&y).unwrap().as_scalar(), Some(1.0));
/// ```
pub struct Var<T: Scalar> {
    node: Rc<Node<T>>,
}

impl<T: Scalar> Var<T> {
    /// Leaf variable that gradients are tracked for.
    pub fn new(value: impl Into<Value<T>>) -> Self {
        Self::leaf(value.into(), true)
    }

    /// Leaf that never receives a gradient.
    ///
    /// Sensitivity reaching a constant is discarded, and an operation whose
    /// operands are all constants produces another constant.
    pub fn constant(value: impl Into<Value<T>>) -> Self {
        Self::leaf(value.into(), false)
    }

    pub fn scalar(value: T) -> Self {
        Self::new(Value::scalar(value))
    }

    pub fn vector(data: Vec<T>) -> Self {
        Self::new(Value::vector(data))
    }

    /// Matrix leaf from column-major data.
    pub fn matrix(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, AdError> {
        Ok(Self::new(Value::matrix(rows, cols, data)?))
    }

    fn leaf(value: Value<T>, requires_grad: bool) -> Self {
        Self {
            node: Node::new("leaf", value, SmallVec::new(), requires_grad),
        }
    }

    /// Build the node for an operation result.
    ///
    /// Each operand is paired with its local derivative rule. If no operand
    /// requires a gradient the result is a constant with no operands.
    pub(crate) fn from_op<const N: usize>(
        op: &'static str,
        value: Value<T>,
        operands: [(&Var<T>, VjpRule<T>); N],
    ) -> Self {
        let requires_grad = operands.iter().any(|(var, _)| var.requires_grad());
        let deps = if requires_grad {
            operands
                .into_iter()
                .map(|(var, rule)| {
                    Dependency::new(Rc::clone(&var.node), var.requires_grad().then_some(rule))
                })
                .collect()
        } else {
            SmallVec::new()
        };
        Self {
            node: Node::new(op, value, deps, requires_grad),
        }
    }

    /// The current value.
    pub fn value(&self) -> &Value<T> {
        self.node.value()
    }

    pub fn shape(&self) -> Shape {
        self.node.shape()
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn requires_grad(&self) -> bool {
        self.node.requires_grad()
    }

    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    /// Name of the operation that produced this expression.
    pub fn op_name(&self) -> &'static str {
        self.node.op()
    }

    /// The underlying node.
    pub fn node(&self) -> &Node<T> {
        &self.node
    }

    pub(crate) fn node_rc(&self) -> &Rc<Node<T>> {
        &self.node
    }

    /// New constant leaf holding a copy of this value.
    pub fn detach(&self) -> Self {
        Self::constant(self.value().clone())
    }

    /// True if both handles refer to the same node.
    pub fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl<T: Scalar> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Scalar> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.id())
            .field("op", &self.op_name())
            .field("requires_grad", &self.requires_grad())
            .field("value", self.value())
            .finish()
    }
}

impl<T: Scalar> From<Value<T>> for Var<T> {
    fn from(value: Value<T>) -> Self {
        Self::new(value)
    }
}
