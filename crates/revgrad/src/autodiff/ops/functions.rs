//! Scalar function table shared by reverse and forward mode.
//!
//! Each variant knows its value and its local derivative(s). Reverse mode
//! multiplies a cotangent by the derivative; forward mode multiplies a
//! tangent by it.

use crate::scalar::Scalar;

/// Elementwise unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryFn {
    Neg,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Cot,
    Asin,
    Acos,
    Atan,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Square,
    /// `x` where `x < 0`, else 0.
    Min0,
    /// `x` where `x > 0`, else 0.
    Max0,
}

impl UnaryFn {
    pub fn name(self) -> &'static str {
        match self {
            UnaryFn::Neg => "neg",
            UnaryFn::Exp => "exp",
            UnaryFn::Ln => "ln",
            UnaryFn::Sin => "sin",
            UnaryFn::Cos => "cos",
            UnaryFn::Tan => "tan",
            UnaryFn::Cot => "cot",
            UnaryFn::Asin => "asin",
            UnaryFn::Acos => "acos",
            UnaryFn::Atan => "atan",
            UnaryFn::Acot => "acot",
            UnaryFn::Sinh => "sinh",
            UnaryFn::Cosh => "cosh",
            UnaryFn::Tanh => "tanh",
            UnaryFn::Sqrt => "sqrt",
            UnaryFn::Square => "square",
            UnaryFn::Min0 => "min0",
            UnaryFn::Max0 => "max0",
        }
    }

    pub fn value<T: Scalar>(self, x: T) -> T {
        let zero = T::zero();
        match self {
            UnaryFn::Neg => -x,
            UnaryFn::Exp => x.exp(),
            UnaryFn::Ln => x.ln(),
            UnaryFn::Sin => x.sin(),
            UnaryFn::Cos => x.cos(),
            UnaryFn::Tan => x.tan(),
            UnaryFn::Cot => T::one() / x.tan(),
            UnaryFn::Asin => x.asin(),
            UnaryFn::Acos => x.acos(),
            UnaryFn::Atan => x.atan(),
            UnaryFn::Acot => (T::one() / x).atan(),
            UnaryFn::Sinh => x.sinh(),
            UnaryFn::Cosh => x.cosh(),
            UnaryFn::Tanh => x.tanh(),
            UnaryFn::Sqrt => x.sqrt(),
            UnaryFn::Square => x * x,
            UnaryFn::Min0 => {
                if x < zero {
                    x
                } else {
                    zero
                }
            }
            UnaryFn::Max0 => {
                if x > zero {
                    x
                } else {
                    zero
                }
            }
        }
    }

    /// df/dx at `x`, given `y = f(x)`.
    pub fn derivative<T: Scalar>(self, x: T, y: T) -> T {
        let one = T::one();
        let zero = T::zero();
        match self {
            UnaryFn::Neg => -one,
            UnaryFn::Exp => y,
            UnaryFn::Ln => one / x,
            UnaryFn::Sin => x.cos(),
            UnaryFn::Cos => -x.sin(),
            UnaryFn::Tan => one + y * y,
            UnaryFn::Cot => -(one + y * y),
            UnaryFn::Asin => one / (one - x * x).sqrt(),
            UnaryFn::Acos => -one / (one - x * x).sqrt(),
            UnaryFn::Atan => one / (one + x * x),
            UnaryFn::Acot => -one / (one + x * x),
            UnaryFn::Sinh => x.cosh(),
            UnaryFn::Cosh => x.sinh(),
            UnaryFn::Tanh => one - y * y,
            UnaryFn::Sqrt => one / (y + y),
            UnaryFn::Square => x + x,
            UnaryFn::Min0 => {
                if x < zero {
                    one
                } else {
                    zero
                }
            }
            UnaryFn::Max0 => {
                if x > zero {
                    one
                } else {
                    zero
                }
            }
        }
    }
}

/// Elementwise binary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFn {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryFn {
    pub fn name(self) -> &'static str {
        match self {
            BinaryFn::Add => "add",
            BinaryFn::Sub => "sub",
            BinaryFn::Mul => "mul",
            BinaryFn::Div => "div",
            BinaryFn::Pow => "pow",
        }
    }

    pub fn value<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            BinaryFn::Add => x + y,
            BinaryFn::Sub => x - y,
            BinaryFn::Mul => x * y,
            BinaryFn::Div => x / y,
            BinaryFn::Pow => x.powf(y),
        }
    }

    /// df/dx at `(x, y)`.
    pub fn partial_lhs<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            BinaryFn::Add | BinaryFn::Sub => T::one(),
            BinaryFn::Mul => y,
            BinaryFn::Div => T::one() / y,
            BinaryFn::Pow => y * x.powf(y - T::one()),
        }
    }

    /// df/dy at `(x, y)`.
    ///
    /// For `Pow` this is `x^y ln x`, which is NaN for `x <= 0`; it is only
    /// evaluated when the exponent itself is differentiated.
    pub fn partial_rhs<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            BinaryFn::Add => T::one(),
            BinaryFn::Sub => -T::one(),
            BinaryFn::Mul => x,
            BinaryFn::Div => -x / (y * y),
            BinaryFn::Pow => x.powf(y) * x.ln(),
        }
    }
}
