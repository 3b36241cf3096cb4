//! Elementwise operations on [`Var`].

use super::functions::{BinaryFn, UnaryFn};
use crate::autodiff::graph::{OpValues, vjp};
use crate::autodiff::var::Var;
use crate::error::AdError;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// Named methods for every [`UnaryFn`], for any type with an
/// `apply(&self, UnaryFn) -> Self` method.
macro_rules! impl_unary_methods {
    ($ty:ident) => {
        impl<T: $crate::scalar::Scalar> $ty<T> {
            pub fn exp(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Exp)
            }
            /// Natural logarithm.
            pub fn ln(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Ln)
            }
            pub fn sin(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Sin)
            }
            pub fn cos(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Cos)
            }
            pub fn tan(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Tan)
            }
            pub fn cot(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Cot)
            }
            pub fn asin(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Asin)
            }
            pub fn acos(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Acos)
            }
            pub fn atan(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Atan)
            }
            pub fn acot(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Acot)
            }
            pub fn sinh(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Sinh)
            }
            pub fn cosh(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Cosh)
            }
            pub fn tanh(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Tanh)
            }
            pub fn sqrt(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Sqrt)
            }
            pub fn square(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Square)
            }
            /// Keep negative entries, zero the rest.
            pub fn min0(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Min0)
            }
            /// Keep positive entries, zero the rest.
            pub fn max0(&self) -> Self {
                self.apply($crate::autodiff::ops::UnaryFn::Max0)
            }
        }
    };
}

#[cfg(feature = "forward-mode")]
pub(crate) use impl_unary_methods;

impl_unary_methods!(Var);

impl<T: Scalar> Var<T> {
    /// Apply an elementwise function.
    pub fn apply(&self, f: UnaryFn) -> Self {
        let value = self.value().map(|x| f.value(x));
        let rule = vjp(move |g: &Value<T>, v: &OpValues<'_, T>| {
            let (x, y) = (v.input(0), v.output);
            Value::from_fn(g.shape(), |i, j| {
                let (xi, yi) = (x.at_broadcast(i, j), y.at_broadcast(i, j));
                g.at_broadcast(i, j) * f.derivative(xi, yi)
            })
        });
        Var::from_op(f.name(), value, [(self, rule)])
    }

    /// Apply an elementwise binary function with scalar broadcasting.
    ///
    /// # Errors
    ///
    /// Returns `AdError::ShapeMismatch` if the shapes are neither equal nor
    /// one of them scalar. No node is created in that case.
    pub fn binary(&self, other: &Self, f: BinaryFn) -> Result<Self, AdError> {
        let value = self
            .value()
            .zip_map(other.value(), f.name(), |x, y| f.value(x, y))?;

        let lhs_rule = vjp(move |g: &Value<T>, v: &OpValues<'_, T>| {
            let (x, y) = (v.input(0), v.input(1));
            broadcast_vjp(g, x.shape(), |i, j| {
                f.partial_lhs(x.at_broadcast(i, j), y.at_broadcast(i, j))
            })
        });
        let rhs_rule = vjp(move |g: &Value<T>, v: &OpValues<'_, T>| {
            let (x, y) = (v.input(0), v.input(1));
            broadcast_vjp(g, y.shape(), |i, j| {
                f.partial_rhs(x.at_broadcast(i, j), y.at_broadcast(i, j))
            })
        });
        Ok(Var::from_op(
            f.name(),
            value,
            [(self, lhs_rule), (other, rhs_rule)],
        ))
    }

    pub fn try_add(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Add)
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Sub)
    }

    /// Elementwise (Hadamard) product.
    pub fn try_mul(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Mul)
    }

    pub fn try_div(&self, other: &Self) -> Result<Self, AdError> {
        self.binary(other, BinaryFn::Div)
    }

    /// Elementwise power `self^exponent`.
    pub fn pow(&self, exponent: &Self) -> Result<Self, AdError> {
        self.binary(exponent, BinaryFn::Pow)
    }

    /// Power with a constant exponent.
    pub fn powf(&self, exponent: T) -> Self {
        // a scalar exponent broadcasts against any shape
        let exponent = Var::constant(exponent);
        match self.pow(&exponent) {
            Ok(var) => var,
            Err(err) => unreachable!("scalar broadcast failed: {err}"),
        }
    }
}

/// Cotangent times local partial, summed back onto the operand shape.
fn broadcast_vjp<T: Scalar>(
    g: &Value<T>,
    operand: Shape,
    mut partial: impl FnMut(usize, usize) -> T,
) -> Value<T> {
    Value::from_fn(g.shape(), |i, j| g.at_broadcast(i, j) * partial(i, j)).reduce_to(operand)
}
