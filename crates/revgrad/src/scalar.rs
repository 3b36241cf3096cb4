//! Scalar trait for value element types.

use faer_traits::ComplexField;
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Trait for scalar types supported by revgrad.
///
/// This trait wraps faer's `ComplexField` (needed for matrix products) with
/// the arithmetic and elementary functions the differentiation rules use.
/// Only real types implement it: every rule assumes an ordered field.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Display
    + Default
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + 'static
{
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Lossy conversion from a count (used by `mean`).
    fn from_usize(value: usize) -> Self;

    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn sinh(self) -> Self;
    fn cosh(self) -> Self;
    fn tanh(self) -> Self;
    fn sqrt(self) -> Self;
    fn powf(self, exponent: Self) -> Self;
}

macro_rules! impl_real_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            fn one() -> Self {
                1.0
            }

            fn from_usize(value: usize) -> Self {
                value as $t
            }

            fn exp(self) -> Self {
                <$t>::exp(self)
            }

            fn ln(self) -> Self {
                <$t>::ln(self)
            }

            fn sin(self) -> Self {
                <$t>::sin(self)
            }

            fn cos(self) -> Self {
                <$t>::cos(self)
            }

            fn tan(self) -> Self {
                <$t>::tan(self)
            }

            fn asin(self) -> Self {
                <$t>::asin(self)
            }

            fn acos(self) -> Self {
                <$t>::acos(self)
            }

            fn atan(self) -> Self {
                <$t>::atan(self)
            }

            fn sinh(self) -> Self {
                <$t>::sinh(self)
            }

            fn cosh(self) -> Self {
                <$t>::cosh(self)
            }

            fn tanh(self) -> Self {
                <$t>::tanh(self)
            }

            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }

            fn powf(self, exponent: Self) -> Self {
                <$t>::powf(self, exponent)
            }
        }
    };
}

impl_real_scalar!(f64);
impl_real_scalar!(f32);
