//! Expression nodes and the implicit computation graph.
//!
//! There is no global graph object: every [`Node`] owns strong handles to
//! the nodes it was computed from, so the graph is exactly the set of nodes
//! reachable from whatever handles the caller still holds. Nodes are
//! immutable after construction apart from their sensitivity accumulator.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::trace;
use smallvec::SmallVec;

use super::sensitivity::Sensitivity;
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
    static LIVE_NODES: Cell<usize> = const { Cell::new(0) };
}

/// Creation index of a node.
///
/// Indices increase strictly with construction order on a thread, and a
/// node can only depend on nodes that already existed, so every dependency
/// has a smaller index than its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw creation index.
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Number of nodes currently alive on this thread.
pub fn live_nodes() -> usize {
    LIVE_NODES.with(Cell::get)
}

/// The id the next node created on this thread will receive.
pub fn next_node_id() -> NodeId {
    NodeId(NEXT_ID.with(Cell::get))
}

fn allocate_id() -> NodeId {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        NodeId(id)
    })
}

/// Operand and output values of the operation that produced a node.
///
/// Local derivative rules read everything they need from here instead of
/// capturing node handles.
pub struct OpValues<'a, T: Scalar> {
    pub output: &'a Value<T>,
    pub inputs: SmallVec<[&'a Value<T>; 2]>,
}

impl<'a, T: Scalar> OpValues<'a, T> {
    /// Value of the operand at `position`.
    pub fn input(&self, position: usize) -> &'a Value<T> {
        self.inputs[position]
    }
}

/// Local derivative rule: maps the consumer's cotangent to this operand's
/// contribution (a vector-Jacobian product).
pub type VjpRule<T> = Box<dyn Fn(&Value<T>, &OpValues<'_, T>) -> Value<T>>;

/// Box a closure as a [`VjpRule`].
pub(crate) fn vjp<T, F>(rule: F) -> VjpRule<T>
where
    T: Scalar,
    F: Fn(&Value<T>, &OpValues<'_, T>) -> Value<T> + 'static,
{
    Box::new(rule)
}

/// One operand of a node.
///
/// `rule` is `None` when the operand does not require a gradient; such an
/// operand is kept only so its value stays readable by sibling rules.
pub struct Dependency<T: Scalar> {
    node: Rc<Node<T>>,
    rule: Option<VjpRule<T>>,
}

impl<T: Scalar> Dependency<T> {
    pub(crate) fn new(node: Rc<Node<T>>, rule: Option<VjpRule<T>>) -> Self {
        Self { node, rule }
    }

    /// The operand node.
    pub fn node(&self) -> &Rc<Node<T>> {
        &self.node
    }

    /// Whether sensitivity flows into this operand.
    pub fn is_tracked(&self) -> bool {
        self.rule.is_some()
    }
}

/// Expression node: a value, its operands and a sensitivity accumulator.
pub struct Node<T: Scalar> {
    id: NodeId,
    op: &'static str,
    value: Value<T>,
    deps: SmallVec<[Dependency<T>; 2]>,
    requires_grad: bool,
    // None reads as the additive identity.
    sensitivity: RefCell<Option<Sensitivity<T>>>,
}

impl<T: Scalar> Node<T> {
    pub(crate) fn new(
        op: &'static str,
        value: Value<T>,
        deps: SmallVec<[Dependency<T>; 2]>,
        requires_grad: bool,
    ) -> Rc<Self> {
        let id = allocate_id();
        LIVE_NODES.with(|live| live.set(live.get() + 1));
        trace!(
            "node {id} ({op}) created: {}, {} operand(s), requires_grad={requires_grad}",
            value.shape(),
            deps.len()
        );
        Rc::new(Self {
            id,
            op,
            value,
            deps,
            requires_grad,
            sensitivity: RefCell::new(None),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the operation that produced this node (`"leaf"` for leaves).
    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn value(&self) -> &Value<T> {
        &self.value
    }

    pub fn shape(&self) -> Shape {
        self.value.shape()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// True if this node has no operands.
    pub fn is_leaf(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn dependencies(&self) -> &[Dependency<T>] {
        &self.deps
    }

    /// Operands that sensitivity flows into.
    pub(crate) fn tracked_dependencies(&self) -> impl Iterator<Item = &Rc<Node<T>>> {
        self.deps.iter().filter(|d| d.is_tracked()).map(|d| &d.node)
    }

    /// Snapshot of the current accumulator, if any sensitivity has arrived.
    pub fn sensitivity(&self) -> Option<Sensitivity<T>> {
        self.sensitivity.borrow().clone()
    }

    /// Start a pass with `rows` zero cotangents.
    pub(crate) fn reset(&self, rows: usize) {
        *self.sensitivity.borrow_mut() = Some(Sensitivity::zeros(self.shape(), rows));
    }

    /// Move the accumulator out, leaving the node cleared.
    pub(crate) fn take_sensitivity(&self) -> Option<Sensitivity<T>> {
        self.sensitivity.borrow_mut().take()
    }

    /// Add `contribution` into this node's accumulator.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` (op `"accumulate"`) if the contribution
    /// does not have this node's shape, or `AdError::SensitivityRows` if it carries a
    /// different number of cotangents than the accumulator.
    pub fn accumulate(&self, contribution: &Sensitivity<T>) -> Result<(), AdError> {
        if contribution.shape() != self.shape() {
            return Err(AdError::ShapeMismatch {
                op: "accumulate",
                lhs: self.shape(),
                rhs: contribution.shape(),
            });
        }
        let mut slot = self.sensitivity.borrow_mut();
        match slot.as_mut() {
            Some(acc) => acc.add_assign(contribution),
            None => {
                *slot = Some(contribution.clone());
                Ok(())
            }
        }
    }

    /// Push this node's accumulated sensitivity into its tracked operands.
    ///
    /// Each operand receives the cotangent mapped through its local rule.
    /// An operand that appears twice (as in `x * x`) receives both
    /// contributions. Does nothing if no sensitivity has arrived.
    pub fn propagate_to_inputs(&self) -> Result<(), AdError> {
        let sensitivity = self.sensitivity.borrow();
        let Some(sensitivity) = sensitivity.as_ref() else {
            return Ok(());
        };
        if !self.deps.iter().any(Dependency::is_tracked) {
            return Ok(());
        }

        let values = OpValues {
            output: &self.value,
            inputs: self.deps.iter().map(|d| d.node.value()).collect(),
        };
        for dep in &self.deps {
            let Some(rule) = &dep.rule else {
                continue;
            };
            let contribution = sensitivity.map_rows(dep.node.shape(), |g| rule(g, &values));
            dep.node.accumulate(&contribution)?;
        }
        Ok(())
    }
}

impl<T: Scalar> Drop for Node<T> {
    fn drop(&mut self) {
        let _ = LIVE_NODES.try_with(|live| live.set(live.get().saturating_sub(1)));

        // Unlink iteratively so a long chain does not recurse once per node.
        let mut stack: Vec<Rc<Node<T>>> = self.deps.drain(..).map(|d| d.node).collect();
        while let Some(node) = stack.pop() {
            if let Ok(mut node) = Rc::try_unwrap(node) {
                stack.extend(node.deps.drain(..).map(|d| d.node));
            }
        }
    }
}

impl<T: Scalar> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("op", &self.op)
            .field("shape", &self.shape())
            .field("requires_grad", &self.requires_grad)
            .field("operands", &self.deps.iter().map(|d| d.node.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(x: f64) -> Rc<Node<f64>> {
        Node::new("leaf", Value::scalar(x), SmallVec::new(), true)
    }

    #[test]
    fn test_ids_increase() {
        let a = leaf(1.0);
        let b = leaf(2.0);
        assert!(a.id() < b.id());
        assert!(next_node_id() > b.id());
    }

    #[test]
    fn test_accumulate_and_take() {
        let a = leaf(1.0);
        let s = Sensitivity::from_seed(Value::scalar(2.0));
        a.accumulate(&s).unwrap();
        a.accumulate(&s).unwrap();
        assert_eq!(a.sensitivity().unwrap().rows()[0].as_scalar(), Some(4.0));

        let taken = a.take_sensitivity().unwrap();
        assert_eq!(taken.rows()[0].as_scalar(), Some(4.0));
        assert!(a.sensitivity().is_none());
    }

    #[test]
    fn test_accumulate_wrong_shape() {
        let a = leaf(1.0);
        let s = Sensitivity::from_seed(Value::vector(vec![1.0, 2.0]));
        assert_eq!(
            a.accumulate(&s),
            Err(AdError::ShapeMismatch {
                op: "accumulate",
                lhs: Shape::Scalar,
                rhs: Shape::Vector(2),
            })
        );
        assert!(a.sensitivity().is_none());
    }

    #[test]
    fn test_propagate_to_inputs() {
        let a = leaf(3.0);
        let deps = SmallVec::from_iter([
            Dependency::new(Rc::clone(&a), Some(vjp(|g: &Value<f64>, v: &OpValues<'_, f64>| {
                g.scale(v.input(1).at_broadcast(0, 0))
            }))),
            Dependency::new(Rc::clone(&a), Some(vjp(|g: &Value<f64>, v: &OpValues<'_, f64>| {
                g.scale(v.input(0).at_broadcast(0, 0))
            }))),
        ]);
        // a * a
        let out = Node::new("mul", Value::scalar(9.0), deps, true);
        out.reset(1);
        a.reset(1);
        out.accumulate(&Sensitivity::identity(Shape::Scalar)).unwrap();
        out.propagate_to_inputs().unwrap();
        assert_eq!(a.sensitivity().unwrap().rows()[0].as_scalar(), Some(6.0));
    }

    #[test]
    fn test_live_nodes_and_deep_drop() {
        let before = live_nodes();
        let mut last = leaf(0.0);
        for _ in 0..100_000 {
            let deps = SmallVec::from_iter([Dependency::new(
                Rc::clone(&last),
                Some(vjp(|g: &Value<f64>, _: &OpValues<'_, f64>| g.clone())),
            )]);
            last = Node::new("identity", Value::scalar(0.0), deps, true);
        }
        assert_eq!(live_nodes(), before + 100_001);
        drop(last);
        assert_eq!(live_nodes(), before);
    }
}
