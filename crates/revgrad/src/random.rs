//! Random value construction.
//!
//! This module provides functions for creating values with random entries,
//! mostly used to check gradients at arbitrary points.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::value::Value;

/// Trait for types that can be randomly sampled from a uniform distribution.
pub trait RandomUniform: Scalar {
    /// Sample a random value from the uniform distribution [0, 1).
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;
}

impl RandomUniform for f64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for f32 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

/// Trait for types that can be randomly sampled from a normal distribution.
pub trait RandomNormal: Scalar {
    /// Sample a random value from the standard normal distribution.
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for f32 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl<T: RandomUniform> Value<T> {
    /// Create a value with uniform random entries in [0, 1).
    ///
    /// # Example
    ///
    /// ```
    /// use revgrad::{Shape, Value};
    ///
    /// let v: Value<f64> = Value::random(Shape::Matrix(2, 3));
    /// assert_eq!(v.shape(), Shape::Matrix(2, 3));
    /// assert!(v.iter().all(|x| (0.0..1.0).contains(&x)));
    /// ```
    pub fn random(shape: Shape) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Create a value with uniform random entries using a specific RNG.
    ///
    /// This is useful for reproducible results with a seeded RNG.
    pub fn random_with_rng<R: Rng>(shape: Shape, rng: &mut R) -> Self {
        Self::from_fn(shape, |_, _| T::sample_uniform(rng))
    }
}

impl<T: RandomNormal> Value<T> {
    /// Create a value with standard normal random entries.
    pub fn random_normal(shape: Shape) -> Self {
        Self::random_normal_with_rng(shape, &mut rand::rng())
    }

    /// Create a value with standard normal random entries using a specific RNG.
    pub fn random_normal_with_rng<R: Rng>(shape: Shape, rng: &mut R) -> Self {
        Self::from_fn(shape, |_, _| T::sample_normal(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_range() {
        let v: Value<f64> = Value::random(Shape::Vector(50));
        assert_eq!(v.len(), 50);
        assert!(v.iter().all(|x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_random_with_seed_reproducible() {
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let a: Value<f64> = Value::random_with_rng(Shape::Matrix(3, 3), &mut rng1);
        let b: Value<f64> = Value::random_with_rng(Shape::Matrix(3, 3), &mut rng2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_normal_f32() {
        let mut rng = StdRng::seed_from_u64(7);
        let v: Value<f32> = Value::random_normal_with_rng(Shape::Vector(1000), &mut rng);
        let mean = v.mean();
        assert!(mean.abs() < 0.2);
    }
}
