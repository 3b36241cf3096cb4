//! Shaped numeric payload for differentiable expressions.
//!
//! A [`Value`] is a scalar, a column vector or a matrix. All three are
//! stored as a faer [`Mat`] (scalars as 1x1, vectors as n x 1) tagged with
//! a [`Shape`], so elementwise code and matrix products share one layout.
//! Flat indices are column-major, matching faer's storage order.

use faer::{Mat, MatRef};
use std::fmt;

use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;

/// A scalar, vector or matrix value.
#[derive(Clone)]
pub struct Value<T: Scalar> {
    shape: Shape,
    data: Mat<T>,
}

impl<T: Scalar> Value<T> {
    /// Create a scalar value.
    pub fn scalar(value: T) -> Self {
        Self {
            shape: Shape::Scalar,
            data: Mat::from_fn(1, 1, |_, _| value),
        }
    }

    /// Create a column vector.
    ///
    /// # Example
    ///
    /// ```
    /// use revgrad::{Shape, Value};
    ///
    /// let v = Value::vector(vec![1.0, 2.0, 3.0]);
    /// assert_eq!(v.shape(), Shape::Vector(3));
    /// assert_eq!(v.get(2, 0), Some(3.0));
    /// ```
    pub fn vector(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            shape: Shape::Vector(n),
            data: Mat::from_fn(n, 1, |i, _| data[i]),
        }
    }

    /// Create a matrix from column-major data.
    ///
    /// # Errors
    ///
    /// Returns `AdError::DataLength` if `data.len() != rows * cols`.
    ///
    /// # Example
    ///
    /// ```
    /// use revgrad::Value;
    ///
    /// let m = Value::matrix(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.get(1, 0), Some(2.0)); // column-major
    /// assert_eq!(m.get(0, 1), Some(3.0));
    /// ```
    pub fn matrix(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, AdError> {
        if data.len() != rows * cols {
            return Err(AdError::DataLength {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape: Shape::Matrix(rows, cols),
            data: Mat::from_fn(rows, cols, |i, j| data[i + j * rows]),
        })
    }

    /// Create a matrix from a list of rows.
    ///
    /// # Errors
    ///
    /// Returns `AdError::DataLength` if the rows have different lengths.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, AdError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        if let Some(bad) = rows.iter().find(|r| r.as_ref().len() != ncols) {
            return Err(AdError::DataLength {
                expected: ncols,
                actual: bad.as_ref().len(),
            });
        }
        Ok(Self {
            shape: Shape::Matrix(nrows, ncols),
            data: Mat::from_fn(nrows, ncols, |i, j| rows[i].as_ref()[j]),
        })
    }

    /// Create a value of the given shape from a function of (row, col).
    pub fn from_fn(shape: Shape, f: impl FnMut(usize, usize) -> T) -> Self {
        Self {
            shape,
            data: Mat::from_fn(shape.nrows(), shape.ncols(), f),
        }
    }

    /// Wrap a faer matrix as a matrix value.
    pub fn from_mat(mat: Mat<T>) -> Self {
        Self {
            shape: Shape::Matrix(mat.nrows(), mat.ncols()),
            data: mat,
        }
    }

    /// Wrap a faer matrix whose dimensions already match `shape`.
    pub(crate) fn from_parts(shape: Shape, data: Mat<T>) -> Self {
        debug_assert_eq!(data.nrows(), shape.nrows());
        debug_assert_eq!(data.ncols(), shape.ncols());
        Self { shape, data }
    }

    /// Value of the given shape filled with `fill`.
    pub fn full(shape: Shape, fill: T) -> Self {
        Self::from_fn(shape, |_, _| fill)
    }

    /// Additive identity of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Self::full(shape, T::zero())
    }

    /// Value of the given shape filled with ones.
    pub fn ones(shape: Shape) -> Self {
        Self::full(shape, T::one())
    }

    /// One-hot value: 1 at column-major flat index `index`, 0 elsewhere.
    pub fn unit(shape: Shape, index: usize) -> Self {
        let rows = shape.nrows();
        Self::from_fn(shape, |i, j| {
            if i + j * rows == index {
                T::one()
            } else {
                T::zero()
            }
        })
    }

    /// Get the shape.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Get total number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    /// Check if the value has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if this is a scalar.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_scalar()
    }

    /// The number held by a scalar value.
    pub fn as_scalar(&self) -> Option<T> {
        if self.is_scalar() {
            Some(self.data[(0, 0)])
        } else {
            None
        }
    }

    /// Get entry (row, col). Vectors use col 0, scalars (0, 0).
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.data.nrows() && col < self.data.ncols() {
            Some(self.data[(row, col)])
        } else {
            None
        }
    }

    /// Get entry by column-major flat index.
    pub fn get_flat(&self, index: usize) -> Option<T> {
        let rows = self.data.nrows();
        if rows == 0 || index >= self.len() {
            return None;
        }
        Some(self.data[(index % rows, index / rows)])
    }

    /// Entries in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let rows = self.data.nrows();
        (0..self.data.ncols()).flat_map(move |j| (0..rows).map(move |i| self.data[(i, j)]))
    }

    /// Copy entries into a column-major vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// View as a faer matrix.
    pub fn as_mat(&self) -> MatRef<'_, T> {
        self.data.as_ref()
    }

    /// Consume and return the backing faer matrix.
    pub fn into_mat(self) -> Mat<T> {
        self.data
    }

    /// Entry at (row, col) of the broadcast view of this value.
    #[inline]
    pub(crate) fn at_broadcast(&self, row: usize, col: usize) -> T {
        if self.is_scalar() {
            self.data[(0, 0)]
        } else {
            self.data[(row, col)]
        }
    }

    /// Apply `f` to every entry.
    pub fn map(&self, mut f: impl FnMut(T) -> T) -> Self {
        Self::from_fn(self.shape, |i, j| f(self.data[(i, j)]))
    }

    /// Combine two values entrywise with scalar broadcasting.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` (tagged with `op`) if the shapes are
    /// neither equal nor one of them scalar.
    pub fn zip_map(
        &self,
        other: &Self,
        op: &'static str,
        f: impl FnMut(T, T) -> T,
    ) -> Result<Self, AdError> {
        let shape = Shape::broadcast(self.shape, other.shape).ok_or(AdError::ShapeMismatch {
            op,
            lhs: self.shape,
            rhs: other.shape,
        })?;
        Ok(self.zip_broadcast(other, shape, f))
    }

    /// Entrywise combination into `shape`, which the caller has already
    /// validated with [`Shape::broadcast`].
    pub(crate) fn zip_broadcast(
        &self,
        other: &Self,
        shape: Shape,
        mut f: impl FnMut(T, T) -> T,
    ) -> Self {
        Self::from_fn(shape, |i, j| {
            f(self.at_broadcast(i, j), other.at_broadcast(i, j))
        })
    }

    /// Multiply every entry by `alpha`.
    pub fn scale(&self, alpha: T) -> Self {
        self.map(|x| x * alpha)
    }

    /// Add `other` into `self` in place. Shapes must be identical.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` if the shapes differ.
    pub fn add_assign(&mut self, other: &Self) -> Result<(), AdError> {
        if self.shape != other.shape {
            return Err(AdError::ShapeMismatch {
                op: "add_assign",
                lhs: self.shape,
                rhs: other.shape,
            });
        }
        for j in 0..self.data.ncols() {
            for i in 0..self.data.nrows() {
                self.data[(i, j)] += other.data[(i, j)];
            }
        }
        Ok(())
    }

    /// Sum a broadcast result back down to `shape`.
    ///
    /// Only scalar targets need a reduction; any other target already has
    /// the shape of `self`.
    pub(crate) fn reduce_to(&self, shape: Shape) -> Self {
        if shape.is_scalar() && !self.is_scalar() {
            Self::scalar(self.sum())
        } else {
            self.clone()
        }
    }

    /// Sum of all entries.
    pub fn sum(&self) -> T {
        self.iter().fold(T::zero(), |acc, x| acc + x)
    }

    /// Arithmetic mean of all entries.
    pub fn mean(&self) -> T {
        self.sum() / T::from_usize(self.len())
    }

    /// Sum of squared entries.
    pub fn squared_norm(&self) -> T {
        self.iter().fold(T::zero(), |acc, x| acc + x * x)
    }

    /// Euclidean (Frobenius for matrices) norm.
    pub fn norm(&self) -> T {
        self.squared_norm().sqrt()
    }
}

impl<T: Scalar> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Scalar> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("shape", &self.shape)
            .field("data", &self.to_vec())
            .finish()
    }
}

impl<T: Scalar> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Self::scalar(value)
    }
}

impl<T: Scalar> From<Vec<T>> for Value<T> {
    fn from(data: Vec<T>) -> Self {
        Self::vector(data)
    }
}

impl<T: Scalar> From<Mat<T>> for Value<T> {
    fn from(mat: Mat<T>) -> Self {
        Self::from_mat(mat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        let v = Value::scalar(2.5);
        assert_eq!(v.shape(), Shape::Scalar);
        assert_eq!(v.as_scalar(), Some(2.5));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_matrix_column_major() {
        let m = Value::matrix(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.shape(), Shape::Matrix(2, 3));
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(1, 0), Some(2.0));
        assert_eq!(m.get(0, 1), Some(3.0));
        assert_eq!(m.get(1, 2), Some(6.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.get_flat(3), Some(4.0));
        assert_eq!(m.as_scalar(), None);
    }

    #[test]
    fn test_matrix_wrong_length() {
        let result = Value::<f64>::matrix(2, 2, vec![1.0, 2.0, 3.0]);
        assert_eq!(
            result.unwrap_err(),
            AdError::DataLength {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_from_rows() {
        let m = Value::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(m.get(0, 1), Some(2.0));
        assert_eq!(m.get(1, 0), Some(3.0));

        let ragged: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Value::from_rows(&ragged).is_err());
    }

    #[test]
    fn test_unit() {
        let u = Value::<f64>::unit(Shape::Matrix(2, 2), 2);
        assert_eq!(u.to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_zip_map_broadcast() {
        let v = Value::vector(vec![1.0, 2.0, 3.0]);
        let s = Value::scalar(10.0);

        let r = v.zip_map(&s, "add", |a, b| a + b).unwrap();
        assert_eq!(r.to_vec(), vec![11.0, 12.0, 13.0]);

        let r = s.zip_map(&v, "sub", |a, b| a - b).unwrap();
        assert_eq!(r.shape(), Shape::Vector(3));
        assert_eq!(r.to_vec(), vec![9.0, 8.0, 7.0]);
    }

    #[test]
    fn test_zip_map_mismatch() {
        let a = Value::vector(vec![1.0, 2.0, 3.0]);
        let b = Value::vector(vec![1.0, 2.0, 3.0, 4.0]);
        let err = a.zip_map(&b, "add", |x, y| x + y).unwrap_err();
        assert_eq!(
            err,
            AdError::ShapeMismatch {
                op: "add",
                lhs: Shape::Vector(3),
                rhs: Shape::Vector(4)
            }
        );
    }

    #[test]
    fn test_add_assign() {
        let mut a = Value::vector(vec![1.0, 2.0]);
        a.add_assign(&Value::vector(vec![0.5, 0.5])).unwrap();
        assert_eq!(a.to_vec(), vec![1.5, 2.5]);

        assert!(a.add_assign(&Value::scalar(1.0)).is_err());
    }

    #[test]
    fn test_reductions() {
        let v = Value::vector(vec![3.0, 4.0]);
        assert_eq!(v.sum(), 7.0);
        assert_eq!(v.mean(), 3.5);
        assert_eq!(v.squared_norm(), 25.0);
        assert_eq!(v.norm(), 5.0);
        assert_eq!(v.reduce_to(Shape::Scalar).as_scalar(), Some(7.0));
        assert_eq!(v.reduce_to(Shape::Vector(2)), v);
    }

    #[test]
    fn test_from_conversions() {
        let s: Value<f64> = 1.5.into();
        assert!(s.is_scalar());
        let v: Value<f64> = vec![1.0, 2.0].into();
        assert_eq!(v.shape(), Shape::Vector(2));
        let m: Value<f64> = Mat::from_fn(2, 3, |i, j| (i + j) as f64).into();
        assert_eq!(m.shape(), Shape::Matrix(2, 3));
    }
}
