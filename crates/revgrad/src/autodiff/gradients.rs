//! Gradient storage container.

use std::collections::HashMap;

use faer::Mat;

use super::graph::NodeId;
use super::sensitivity::Sensitivity;
use super::var::Var;
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// Result of one reverse pass.
///
/// Stores the sensitivity of every node the pass reached, keyed by
/// [`NodeId`]. Any node the pass did not reach (a non-ancestor of the
/// output, or a constant) reads as zero.
#[derive(Debug, Clone)]
pub struct Gradients<T: Scalar> {
    output_shape: Shape,
    rows: usize,
    grads: HashMap<NodeId, Sensitivity<T>>,
}

impl<T: Scalar> Gradients<T> {
    pub(crate) fn new(
        output_shape: Shape,
        rows: usize,
        grads: HashMap<NodeId, Sensitivity<T>>,
    ) -> Self {
        Self {
            output_shape,
            rows,
            grads,
        }
    }

    /// Gradient of the output with respect to `var`, in `var`'s shape.
    ///
    /// # Errors
    ///
    /// Returns `AdError::NotScalarOutput` if the pass differentiated a
    /// non-scalar output without a seed; read [`Gradients::jacobian`]
    /// instead.
    pub fn get(&self, var: &Var<T>) -> Result<Value<T>, AdError> {
        if self.rows != 1 {
            return Err(AdError::NotScalarOutput {
                shape: self.output_shape,
                rows: self.rows,
            });
        }
        Ok(self
            .grads
            .get(&var.id())
            .and_then(|s| s.rows().first().cloned())
            .unwrap_or_else(|| Value::zeros(var.shape())))
    }

    /// Jacobian of the output with respect to `var`.
    ///
    /// Row `i` is the derivative of output component `i` (column-major
    /// order), flattened column-major over `var`. The result has one row per
    /// cotangent the pass carried and `var.shape().len()` columns.
    pub fn jacobian(&self, var: &Var<T>) -> Mat<T> {
        match self.grads.get(&var.id()) {
            Some(s) => s.to_jacobian(),
            None => Mat::from_fn(self.rows, var.shape().len(), |_, _| T::zero()),
        }
    }

    /// Raw sensitivity of a node, if the pass reached it.
    pub fn sensitivity(&self, id: NodeId) -> Option<&Sensitivity<T>> {
        self.grads.get(&id)
    }

    /// Check if the pass reached `var`.
    pub fn contains(&self, var: &Var<T>) -> bool {
        self.grads.contains_key(&var.id())
    }

    /// Shape of the differentiated output.
    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    /// Number of cotangents per node (1 for a scalar or seeded pass).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of stored gradients.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Iterate over all stored sensitivities.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Sensitivity<T>)> {
        self.grads.iter()
    }
}
