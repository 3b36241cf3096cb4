//! Operator overloads for [`Var`].
//!
//! `+ - * /` work on any mix of owned and borrowed handles and on `f64`/`f32`
//! literals, which are wrapped as constants. Literal impls exist for both
//! float types, so one side must fix the type (`Var::vector(vec![1.0_f64])`
//! or `&x * 2.0_f64`) when the data was written with unsuffixed literals.
//!
//! # Panics
//!
//! The operators panic on incompatible shapes. Use the `try_*` methods to
//! get an `AdError` instead.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::functions::UnaryFn;
use crate::autodiff::var::Var;
use crate::scalar::Scalar;

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $try_method:ident) => {
        impl<T: Scalar> $trait<&Var<T>> for &Var<T> {
            type Output = Var<T>;

            fn $method(self, rhs: &Var<T>) -> Var<T> {
                self.$try_method(rhs).unwrap_or_else(|err| panic!("{err}"))
            }
        }

        impl<T: Scalar> $trait<Var<T>> for Var<T> {
            type Output = Var<T>;

            fn $method(self, rhs: Var<T>) -> Var<T> {
                (&self).$method(&rhs)
            }
        }

        impl<T: Scalar> $trait<&Var<T>> for Var<T> {
            type Output = Var<T>;

            fn $method(self, rhs: &Var<T>) -> Var<T> {
                (&self).$method(rhs)
            }
        }

        impl<T: Scalar> $trait<Var<T>> for &Var<T> {
            type Output = Var<T>;

            fn $method(self, rhs: Var<T>) -> Var<T> {
                self.$method(&rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, try_add);
impl_binary_operator!(Sub, sub, try_sub);
impl_binary_operator!(Mul, mul, try_mul);
impl_binary_operator!(Div, div, try_div);

macro_rules! impl_literal_operator {
    ($t:ty, $trait:ident, $method:ident) => {
        impl $trait<$t> for &Var<$t> {
            type Output = Var<$t>;

            fn $method(self, rhs: $t) -> Var<$t> {
                self.$method(&Var::constant(rhs))
            }
        }

        impl $trait<$t> for Var<$t> {
            type Output = Var<$t>;

            fn $method(self, rhs: $t) -> Var<$t> {
                (&self).$method(&Var::constant(rhs))
            }
        }

        impl $trait<&Var<$t>> for $t {
            type Output = Var<$t>;

            fn $method(self, rhs: &Var<$t>) -> Var<$t> {
                (&Var::constant(self)).$method(rhs)
            }
        }

        impl $trait<Var<$t>> for $t {
            type Output = Var<$t>;

            fn $method(self, rhs: Var<$t>) -> Var<$t> {
                (&Var::constant(self)).$method(&rhs)
            }
        }
    };
}

macro_rules! impl_literal_operators {
    ($($t:ty),*) => {
        $(
            impl_literal_operator!($t, Add, add);
            impl_literal_operator!($t, Sub, sub);
            impl_literal_operator!($t, Mul, mul);
            impl_literal_operator!($t, Div, div);
        )*
    };
}

impl_literal_operators!(f64, f32);

impl<T: Scalar> Neg for &Var<T> {
    type Output = Var<T>;

    fn neg(self) -> Var<T> {
        self.apply(UnaryFn::Neg)
    }
}

impl<T: Scalar> Neg for Var<T> {
    type Output = Var<T>;

    fn neg(self) -> Var<T> {
        self.apply(UnaryFn::Neg)
    }
}
