//! Linear-algebra operations on [`Value`]s.
//!
//! Products are computed with faer's GEMM; every operation validates its
//! shape rule first and reports `AdError::ShapeMismatch` otherwise.

use faer::linalg::matmul::matmul;
use faer::{Accum, Mat, MatRef, Par};

use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// C = A * B on raw faer views.
pub(crate) fn gemm<T: Scalar>(a: MatRef<'_, T>, b: MatRef<'_, T>) -> Mat<T> {
    let mut c = Mat::from_fn(a.nrows(), b.ncols(), |_, _| T::zero());

    // C = alpha * A * B + beta * C
    // With beta = Replace, alpha = 1
    matmul(c.as_mut(), Accum::Replace, a, b, T::one(), Par::Seq);
    c
}

/// Result shape of a matrix product, if the operands are compatible.
pub fn matmul_shape(lhs: Shape, rhs: Shape) -> Option<Shape> {
    match (lhs, rhs) {
        (Shape::Matrix(m, k1), Shape::Matrix(k2, n)) if k1 == k2 => Some(Shape::Matrix(m, n)),
        (Shape::Matrix(m, k1), Shape::Vector(k2)) if k1 == k2 => Some(Shape::Vector(m)),
        _ => None,
    }
}

/// Shape of the transpose.
pub fn transpose_shape(shape: Shape) -> Shape {
    match shape {
        Shape::Scalar => Shape::Scalar,
        Shape::Vector(n) => Shape::Matrix(1, n),
        Shape::Matrix(rows, cols) => Shape::Matrix(cols, rows),
    }
}

impl<T: Scalar> Value<T> {
    /// Matrix-matrix or matrix-vector product.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` unless `self` is `Matrix(m, k)` and
    /// `other` is `Matrix(k, n)` or `Vector(k)`.
    ///
    /// # Example
    ///
    /// ```
    /// use revgrad::{Shape, Value};
    ///
    /// let a = Value::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    /// let x = Value::vector(vec![1.0, 1.0]);
    /// let y = a.matmul(&x).unwrap();
    /// assert_eq!(y.shape(), Shape::Vector(2));
    /// assert_eq!(y.to_vec(), vec![3.0, 7.0]);
    /// ```
    pub fn matmul(&self, other: &Self) -> Result<Self, AdError> {
        let shape = matmul_shape(self.shape(), other.shape()).ok_or(AdError::ShapeMismatch {
            op: "matmul",
            lhs: self.shape(),
            rhs: other.shape(),
        })?;
        Ok(Value::from_parts(shape, gemm(self.as_mat(), other.as_mat())))
    }

    /// Transpose. A vector becomes a one-row matrix.
    pub fn transpose(&self) -> Self {
        self.transpose_into(transpose_shape(self.shape()))
    }

    /// Transpose the backing matrix and tag it with `shape`.
    ///
    /// Used to map a transposed cotangent back onto the operand shape
    /// (a `Matrix(1, n)` cotangent transposes onto `Vector(n)`).
    pub(crate) fn transpose_into(&self, shape: Shape) -> Self {
        let m = self.as_mat();
        Value::from_parts(
            shape,
            Mat::from_fn(m.ncols(), m.nrows(), |i, j| m[(j, i)]),
        )
    }

    /// Inner product of two vectors of equal length.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` unless both operands are `Vector(n)`.
    pub fn dot(&self, other: &Self) -> Result<T, AdError> {
        match (self.shape(), other.shape()) {
            (Shape::Vector(n), Shape::Vector(m)) if n == m => Ok(self
                .iter()
                .zip(other.iter())
                .fold(T::zero(), |acc, (a, b)| acc + a * b)),
            (lhs, rhs) => Err(AdError::ShapeMismatch {
                op: "dot",
                lhs,
                rhs,
            }),
        }
    }

    /// Outer (tensor) product x * y^T of two vectors.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` unless both operands are vectors.
    pub fn outer(&self, other: &Self) -> Result<Self, AdError> {
        match (self.shape(), other.shape()) {
            (Shape::Vector(_), Shape::Vector(_)) => Ok(Value::from_mat(gemm(
                self.as_mat(),
                other.as_mat().transpose(),
            ))),
            (lhs, rhs) => Err(AdError::ShapeMismatch {
                op: "outer",
                lhs,
                rhs,
            }),
        }
    }
}
