//! Shapes of differentiable quantities.

use std::fmt;

/// Shape of a [`Value`](crate::Value): scalar, column vector or matrix.
///
/// `Vector(n)` and `Matrix(n, 1)` are different shapes. No operation
/// converts between them implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single number.
    Scalar,
    /// A column vector with `n` entries.
    Vector(usize),
    /// A matrix with `rows` x `cols` entries.
    Matrix(usize, usize),
}

impl Shape {
    /// Number of rows of the backing matrix (1 for scalars).
    #[inline]
    pub fn nrows(&self) -> usize {
        match *self {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
            Shape::Matrix(rows, _) => rows,
        }
    }

    /// Number of columns of the backing matrix (1 for scalars and vectors).
    #[inline]
    pub fn ncols(&self) -> usize {
        match *self {
            Shape::Scalar | Shape::Vector(_) => 1,
            Shape::Matrix(_, cols) => cols,
        }
    }

    /// Total number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.nrows() * self.ncols()
    }

    /// Check if the shape has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if this is the scalar shape.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Shape::Scalar)
    }

    /// Result shape of an elementwise binary operation.
    ///
    /// Equal shapes combine to themselves; a scalar operand is broadcast
    /// against the other one. Returns `None` for anything else.
    pub fn broadcast(lhs: Shape, rhs: Shape) -> Option<Shape> {
        if lhs == rhs {
            Some(lhs)
        } else if lhs.is_scalar() {
            Some(rhs)
        } else if rhs.is_scalar() {
            Some(lhs)
        } else {
            None
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "scalar"),
            Shape::Vector(n) => write!(f, "vector({n})"),
            Shape::Matrix(rows, cols) => write!(f, "matrix({rows}x{cols})"),
        }
    }
}
