//! Export the expression graph behind a [`Var`] for inspection.
//!
//! Edges run from operand to consumer and carry the operand position.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

use super::graph::{Node, NodeId};
use super::var::Var;
use crate::scalar::Scalar;
use crate::shape::Shape;

/// Per-node data copied into the exported graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: NodeId,
    pub op: &'static str,
    pub shape: Shape,
    pub requires_grad: bool,
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.op, self.shape)?;
        if !self.requires_grad {
            write!(f, " (const)")?;
        }
        Ok(())
    }
}

/// Every node reachable from `output`, constants included.
pub fn ancestor_graph<T: Scalar>(output: &Var<T>) -> DiGraph<NodeSummary, usize> {
    let mut graph = DiGraph::new();
    let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut stack: Vec<Rc<Node<T>>> = vec![Rc::clone(output.node_rc())];

    let mut index_of = |graph: &mut DiGraph<NodeSummary, usize>, node: &Node<T>| {
        *indices.entry(node.id()).or_insert_with(|| {
            graph.add_node(NodeSummary {
                id: node.id(),
                op: node.op(),
                shape: node.shape(),
                requires_grad: node.requires_grad(),
            })
        })
    };

    let mut expanded = HashSet::new();
    while let Some(node) = stack.pop() {
        if !expanded.insert(node.id()) {
            continue;
        }
        let consumer = index_of(&mut graph, &node);
        for (position, dep) in node.dependencies().iter().enumerate() {
            let operand = index_of(&mut graph, dep.node());
            graph.add_edge(operand, consumer, position);
            stack.push(Rc::clone(dep.node()));
        }
    }
    graph
}

/// Graphviz rendering of [`ancestor_graph`].
pub fn to_dot<T: Scalar>(output: &Var<T>) -> String {
    let graph = ancestor_graph(output);
    format!("{}", Dot::new(&graph))
}
