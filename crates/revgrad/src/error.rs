//! Error types for revgrad.

use crate::shape::Shape;
use thiserror::Error;

/// Errors that can occur while building or differentiating expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdError {
    /// Operand shapes are incompatible with the requested operation.
    #[error("shape mismatch in {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// Data length does not match the requested shape.
    #[error("data length mismatch: expected {expected} elements, got {actual}")]
    DataLength { expected: usize, actual: usize },

    /// Seed cotangent does not have the shape of the differentiated output.
    #[error("seed shape {actual} does not match output shape {expected}")]
    SeedShapeMismatch { expected: Shape, actual: Shape },

    /// A single gradient was requested from a pass that produced a Jacobian.
    #[error("output of shape {shape} produced {rows} cotangent rows; use jacobian() instead")]
    NotScalarOutput { shape: Shape, rows: usize },

    /// A sensitivity contribution carries a different number of cotangents.
    #[error("sensitivity with {actual} rows cannot be accumulated into {expected} rows")]
    SensitivityRows { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = AdError::ShapeMismatch {
            op: "add",
            lhs: Shape::Vector(3),
            rhs: Shape::Vector(4),
        };
        assert_eq!(err.to_string(), "shape mismatch in add: vector(3) vs vector(4)");
    }

    #[test]
    fn test_not_scalar_output_message() {
        let err = AdError::NotScalarOutput {
            shape: Shape::Matrix(2, 2),
            rows: 4,
        };
        assert!(err.to_string().contains("jacobian()"));
        assert!(err.to_string().contains("matrix(2x2)"));
    }
}
