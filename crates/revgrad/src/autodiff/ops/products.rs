//! Matrix products and transpose on [`Var`].

use crate::autodiff::graph::{OpValues, vjp};
use crate::autodiff::var::Var;
use crate::error::AdError;
use crate::linalg::gemm;
use crate::scalar::Scalar;
use crate::value::Value;

impl<T: Scalar> Var<T> {
    /// Matrix-matrix or matrix-vector product.
    ///
    /// VJP: `dA = G * B^T`, `dB = A^T * G`.
    pub fn matmul(&self, other: &Self) -> Result<Self, AdError> {
        let value = self.value().matmul(other.value())?;

        let lhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let (a, b) = (v.input(0), v.input(1));
            Value::from_parts(a.shape(), gemm(g.as_mat(), b.as_mat().transpose()))
        });
        let rhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let (a, b) = (v.input(0), v.input(1));
            Value::from_parts(b.shape(), gemm(a.as_mat().transpose(), g.as_mat()))
        });
        Ok(Var::from_op(
            "matmul",
            value,
            [(self, lhs_rule), (other, rhs_rule)],
        ))
    }

    /// Transpose. A vector becomes a one-row matrix.
    pub fn transpose(&self) -> Self {
        let value = self.value().transpose();
        let rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| g.transpose_into(v.input(0).shape()));
        Var::from_op("transpose", value, [(self, rule)])
    }

    /// Short for [`Var::transpose`].
    pub fn t(&self) -> Self {
        self.transpose()
    }

    /// Inner product of two vectors; the result is a scalar.
    pub fn dot(&self, other: &Self) -> Result<Self, AdError> {
        let value = Value::scalar(self.value().dot(other.value())?);

        let lhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            v.input(1).scale(g.at_broadcast(0, 0))
        });
        let rhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            v.input(0).scale(g.at_broadcast(0, 0))
        });
        Ok(Var::from_op("dot", value, [(self, lhs_rule), (other, rhs_rule)]))
    }

    /// Outer product `x * y^T` of two vectors.
    ///
    /// VJP: `dx = G * y`, `dy = G^T * x`.
    pub fn outer(&self, other: &Self) -> Result<Self, AdError> {
        let value = self.value().outer(other.value())?;

        let lhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let (x, y) = (v.input(0), v.input(1));
            Value::from_parts(x.shape(), gemm(g.as_mat(), y.as_mat()))
        });
        let rhs_rule = vjp(|g: &Value<T>, v: &OpValues<'_, T>| {
            let (x, y) = (v.input(0), v.input(1));
            Value::from_parts(y.shape(), gemm(g.as_mat().transpose(), x.as_mat()))
        });
        Ok(Var::from_op("outer", value, [(self, lhs_rule), (other, rhs_rule)]))
    }
}
