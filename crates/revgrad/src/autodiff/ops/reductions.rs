//! Reductions to a scalar.

use crate::autodiff::graph::{OpValues, vjp};
use crate::autodiff::var::Var;
use crate::scalar::Scalar;
use crate::value::Value;

impl<T: Scalar> Var<T> {
    /// Sum of all entries.
    pub fn sum(&self) -> Self {
        let value = Value::scalar(self.value().sum());
        let rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            Value::full(v.input(0).shape(), g.at_broadcast(0, 0))
        });
        Var::from_op("sum", value, [(self, rule)])
    }

    /// Arithmetic mean of all entries.
    pub fn mean(&self) -> Self {
        let value = Value::scalar(self.value().mean());
        let rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let x = v.input(0);
            Value::full(x.shape(), g.at_broadcast(0, 0) / T::from_usize(x.len()))
        });
        Var::from_op("mean", value, [(self, rule)])
    }

    /// Sum of squared entries.
    pub fn squared_norm(&self) -> Self {
        let value = Value::scalar(self.value().squared_norm());
        let rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let g = g.at_broadcast(0, 0);
            v.input(0).scale(g + g)
        });
        Var::from_op("squared_norm", value, [(self, rule)])
    }

    /// Euclidean norm (Frobenius for matrices).
    ///
    /// The gradient at the zero vector is NaN.
    pub fn norm(&self) -> Self {
        let value = Value::scalar(self.value().norm());
        let rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            v.input(0).scale(g.at_broadcast(0, 0) / v.output.at_broadcast(0, 0))
        });
        Var::from_op("norm", value, [(self, rule)])
    }
}
