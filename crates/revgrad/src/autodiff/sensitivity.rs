//! Sensitivity accumulators.

use faer::Mat;

use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// Stack of cotangents carried by one node during a reverse pass.
///
/// Row `i` is the partial derivative of output component `i` with respect
/// to the node, in the node's own shape. A scalar output (or an explicitly
/// seeded pass) has exactly one row; differentiating a `k`-component
/// output with the identity seed carries `k` rows, which is how a single
/// sweep yields a whole Jacobian.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensitivity<T: Scalar> {
    shape: Shape,
    rows: Vec<Value<T>>,
}

impl<T: Scalar> Sensitivity<T> {
    /// `rows` zero cotangents of the given shape.
    pub fn zeros(shape: Shape, rows: usize) -> Self {
        Self {
            shape,
            rows: (0..rows).map(|_| Value::zeros(shape)).collect(),
        }
    }

    /// Seed meaning "differentiate this quantity with respect to itself".
    ///
    /// For a scalar this is the single cotangent 1; otherwise row `i` is
    /// one-hot at column-major flat index `i`.
    pub fn identity(shape: Shape) -> Self {
        Self {
            shape,
            rows: (0..shape.len()).map(|i| Value::unit(shape, i)).collect(),
        }
    }

    /// Single user-supplied cotangent.
    pub fn from_seed(seed: Value<T>) -> Self {
        Self {
            shape: seed.shape(),
            rows: vec![seed],
        }
    }

    /// Shape of each cotangent.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of stacked cotangents.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The stacked cotangents.
    pub fn rows(&self) -> &[Value<T>] {
        &self.rows
    }

    /// Consume and return the stacked cotangents.
    pub fn into_rows(self) -> Vec<Value<T>> {
        self.rows
    }

    /// Add another sensitivity into this one.
    ///
    /// # Errors
    ///
    /// `AdError::ShapeMismatch` if the cotangent shapes differ, or
    /// `AdError::SensitivityRows` if the number of rows differs.
    pub fn add_assign(&mut self, other: &Self) -> Result<(), AdError> {
        if self.shape != other.shape {
            return Err(AdError::ShapeMismatch {
                op: "accumulate",
                lhs: self.shape,
                rhs: other.shape,
            });
        }
        if self.rows.len() != other.rows.len() {
            return Err(AdError::SensitivityRows {
                expected: self.rows.len(),
                actual: other.rows.len(),
            });
        }
        for (row, other_row) in self.rows.iter_mut().zip(&other.rows) {
            row.add_assign(other_row)?;
        }
        Ok(())
    }

    /// Map every cotangent through a local derivative rule producing `shape`.
    pub(crate) fn map_rows(&self, shape: Shape, mut f: impl FnMut(&Value<T>) -> Value<T>) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mapped = f(row);
                debug_assert_eq!(mapped.shape(), shape, "local derivative rule produced wrong shape");
                mapped
            })
            .collect();
        Self { shape, rows }
    }

    /// Jacobian layout: one matrix row per cotangent, flattened column-major.
    pub fn to_jacobian(&self) -> Mat<T> {
        Mat::from_fn(self.rows.len(), self.shape.len(), |i, j| {
            self.rows[i].get_flat(j).unwrap_or_else(T::zero)
        })
    }
}
