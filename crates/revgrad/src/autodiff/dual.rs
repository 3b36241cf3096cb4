//! Dual values for forward-mode automatic differentiation.
//!
//! Forward mode propagates a tangent alongside every value. Given `f` and
//! an input `x` with tangent `v` it computes:
//!   - primal: f(x)
//!   - tangent: J_f(x) * v (Jacobian-vector product)
//!
//! One forward sweep gives one directional derivative, which is cheaper than
//! a reverse pass when there are few inputs and many outputs. The local
//! derivatives come from the same [`UnaryFn`]/[`BinaryFn`] table reverse
//! mode uses, so the two modes agree.
//!
//! # Example
//!
//! ```
//! use revgrad::Value;
//! use revgrad::autodiff::Dual;
//!
//! // d/dx (x * sin x) at x = 1, direction 1
//! let x = Dual::with_tangent(Value::scalar(1.0), Value::scalar(1.0)).unwrap();
//! let y = x.try_mul(&x.sin()).unwrap();
//!
//! let expected = 1.0_f64.sin() + 1.0_f64.cos();
//! let tangent = y.tangent().unwrap().as_scalar().unwrap();
//! assert!((tangent - expected).abs() < 1e-12);
//! ```

use super::ops::{BinaryFn, UnaryFn, impl_unary_methods};
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// A value with an associated tangent for forward-mode AD.
///
/// The tangent can be `None` to represent a zero tangent (a constant), so
/// constants never allocate one.
#[derive(Debug, Clone, PartialEq)]
pub struct Dual<T: Scalar> {
    primal: Value<T>,
    tangent: Option<Value<T>>,
}

impl<T: Scalar> Dual<T> {
    /// Dual with zero tangent (constant).
    pub fn new(primal: impl Into<Value<T>>) -> Self {
        Self {
            primal: primal.into(),
            tangent: None,
        }
    }

    /// Dual with an explicit tangent.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` if the tangent shape doesn't match
    /// the primal shape.
    pub fn with_tangent(primal: Value<T>, tangent: Value<T>) -> Result<Self, AdError> {
        if primal.shape() != tangent.shape() {
            return Err(AdError::ShapeMismatch {
                op: "with_tangent",
                lhs: primal.shape(),
                rhs: tangent.shape(),
            });
        }
        Ok(Self {
            primal,
            tangent: Some(tangent),
        })
    }

    pub fn primal(&self) -> &Value<T> {
        &self.primal
    }

    /// Get the tangent (None if zero).
    pub fn tangent(&self) -> Option<&Value<T>> {
        self.tangent.as_ref()
    }

    /// The tangent, materializing a zero one if absent.
    pub fn tangent_or_zero(&self) -> Value<T> {
        self.tangent
            .clone()
            .unwrap_or_else(|| Value::zeros(self.primal.shape()))
    }

    pub fn has_tangent(&self) -> bool {
        self.tangent.is_some()
    }

    pub fn shape(&self) -> Shape {
        self.primal.shape()
    }

    /// Consume and return primal and tangent.
    pub fn into_parts(self) -> (Value<T>, Option<Value<T>>) {
        (self.primal, self.tangent)
    }

    /// Drop the tangent.
    pub fn detach(&self) -> Self {
        Self::new(self.primal.clone())
    }

    /// Apply an elementwise function.
    pub fn apply(&self, f: UnaryFn) -> Self {
        let primal = self.primal.map(|x| f.value(x));
        let tangent = self.tangent.as_ref().map(|t| {
            Value::from_fn(primal.shape(), |i, j| {
                let (x, y) = (self.primal.at_broadcast(i, j), primal.at_broadcast(i, j));
                t.at_broadcast(i, j) * f.derivative(x, y)
            })
        });
        Self { primal, tangent }
    }

    /// Apply an elementwise binary function with scalar broadcasting.
    pub fn binary(&self, other: &Self, f: BinaryFn) -> Result<Self, AdError> {
        let primal = self
            .primal
            .zip_map(&other.primal, f.name(), |x, y| f.value(x, y))?;
        let shape = primal.shape();
        let (x, y) = (&self.primal, &other.primal);

        let lhs = self.tangent.as_ref().map(|t| {
            Value::from_fn(shape, |i, j| {
                t.at_broadcast(i, j) * f.partial_lhs(x.at_broadcast(i, j), y.at_broadcast(i, j))
            })
        });
        let rhs = other.tangent.as_ref().map(|t| {
            Value::from_fn(shape, |i, j| {
                t.at_broadcast(i, j) * f.partial_rhs(x.at_broadcast(i, j), y.at_broadcast(i, j))
            })
        });
        Ok(Self {
            primal,
            tangent: sum_tangents(lhs, rhs),
        })
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Add)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Sub)
    }

    pub fn try_mul(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Mul)
    }

    pub fn try_div(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Div)
    }

    pub fn pow(&self, exponent: &Self) -> Result<Self, AdError> {
        self.binary(exponent, BinaryFn::Pow)
    }

    /// Product rule: `d(AB) = dA B + A dB`.
    pub fn matmul(&self, other: &Self) -> Result<Self, AdError> {
        let primal = self.primal.matmul(&other.primal)?;
        let lhs = self
            .tangent
            .as_ref()
            .map(|da| da.matmul(&other.primal))
            .transpose()?;
        let rhs = other
            .tangent
            .as_ref()
            .map(|db| self.primal.matmul(db))
            .transpose()?;
        Ok(Self {
            primal,
            tangent: sum_tangents(lhs, rhs),
        })
    }

    pub fn transpose(&self) -> Self {
        Self {
            primal: self.primal.transpose(),
            tangent: self.tangent.as_ref().map(Value::transpose),
        }
    }

    pub fn dot(&self, other: &Self) -> Result<Self, AdError> {
        let primal = Value::scalar(self.primal.dot(&other.primal)?);
        let lhs = self
            .tangent
            .as_ref()
            .map(|dx| dx.dot(&other.primal).map(Value::scalar))
            .transpose()?;
        let rhs = other
            .tangent
            .as_ref()
            .map(|dy| self.primal.dot(dy).map(Value::scalar))
            .transpose()?;
        Ok(Self {
            primal,
            tangent: sum_tangents(lhs, rhs),
        })
    }

    pub fn outer(&self, other: &Self) -> Result<Self, AdError> {
        let primal = self.primal.outer(&other.primal)?;
        let lhs = self
            .tangent
            .as_ref()
            .map(|dx| dx.outer(&other.primal))
            .transpose()?;
        let rhs = other
            .tangent
            .as_ref()
            .map(|dy| self.primal.outer(dy))
            .transpose()?;
        Ok(Self {
            primal,
            tangent: sum_tangents(lhs, rhs),
        })
    }

    pub fn sum(&self) -> Self {
        Self {
            primal: Value::scalar(self.primal.sum()),
            tangent: self.tangent.as_ref().map(|t| Value::scalar(t.sum())),
        }
    }

    pub fn mean(&self) -> Self {
        Self {
            primal: Value::scalar(self.primal.mean()),
            tangent: self.tangent.as_ref().map(|t| Value::scalar(t.mean())),
        }
    }

    pub fn squared_norm(&self) -> Self {
        Self {
            primal: Value::scalar(self.primal.squared_norm()),
            tangent: self.tangent.as_ref().map(|t| {
                let d = inner(&self.primal, t);
                Value::scalar(d + d)
            }),
        }
    }

    pub fn norm(&self) -> Self {
        let norm = self.primal.norm();
        Self {
            primal: Value::scalar(norm),
            tangent: self
                .tangent
                .as_ref()
                .map(|t| Value::scalar(inner(&self.primal, t) / norm)),
        }
    }
}

impl_unary_methods!(Dual);

/// Directional derivative of `f` at `x` along `direction`.
///
/// Returns `(f(x), J_f(x) * direction)`.
///
/// # Errors
///
/// Returns `AdError::ShapeMismatch` if `direction` does not have the shape
/// of `x`, or whatever `f` returns.
pub fn jvp<T, F>(f: F, x: &Value<T>, direction: &Value<T>) -> Result<(Value<T>, Value<T>), AdError>
where
    T: Scalar,
    F: FnOnce(&Dual<T>) -> Result<Dual<T>, AdError>,
{
    let input = Dual::with_tangent(x.clone(), direction.clone())?;
    let output = f(&input)?;
    let tangent = output.tangent_or_zero();
    let (primal, _) = output.into_parts();
    Ok((primal, tangent))
}

fn sum_tangents<T: Scalar>(a: Option<Value<T>>, b: Option<Value<T>>) -> Option<Value<T>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.zip_broadcast(&b, a.shape(), |x, y| x + y)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Entrywise inner product of two values of equal shape.
fn inner<T: Scalar>(a: &Value<T>, b: &Value<T>) -> T {
    a.iter().zip(b.iter()).fold(T::zero(), |acc, (x, y)| acc + x * y)
}
