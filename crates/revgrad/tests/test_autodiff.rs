//! Integration tests for reverse-mode differentiation.
//!
//! Analytical gradients are checked against central differences.

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use revgrad::autodiff::{UnaryFn, live_nodes, next_node_id};
use revgrad::{
    AdError, BackwardOptions, Shape, Value, Var, backward, backward_with_options,
    backward_with_seed,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

/// Rebuild a value of `shape` from column-major data.
fn from_flat(shape: Shape, data: &[f64]) -> Value<f64> {
    Value::from_fn(shape, |i, j| data[i + j * shape.nrows()])
}

/// Compare the reverse-mode gradient of a scalar expression with central
/// differences at `x`.
fn check_gradient<F>(build: F, x: &Value<f64>)
where
    F: Fn(&Var<f64>) -> Var<f64>,
{
    let var = Var::new(x.clone());
    let out = build(&var);
    let grads = backward(&out).unwrap();
    let analytical = grads.get(&var).unwrap();
    assert_eq!(analytical.shape(), x.shape());

    let shape = x.shape();
    let numerical = numerical_gradient(
        |data| {
            let perturbed = Var::constant(from_flat(shape, data));
            build(&perturbed).value().as_scalar().unwrap()
        },
        &x.to_vec(),
        1e-5,
    );
    for (a, n) in analytical.iter().zip(numerical.iter()) {
        assert_relative_eq!(a, *n, epsilon = 1e-6, max_relative = 1e-5);
    }
}

fn unit_interval(shape: Shape, seed: u64) -> Value<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    // keep away from 0 and 1 so every function's domain is respected
    Value::random_with_rng(shape, &mut rng).map(|u| 0.1 + 0.8 * u)
}

#[test]
fn test_z_equals_x_squared_plus_y_at_two_and_three() {
    init_logger();
    let x = Var::scalar(2.0);
    let y = Var::scalar(3.0);
    let z = &x * &x + &y;

    let grads = backward(&z).unwrap();
    assert_relative_eq!(z.value().as_scalar().unwrap(), 7.0);
    assert_relative_eq!(grads.get(&x).unwrap().as_scalar().unwrap(), 4.0);
    assert_relative_eq!(grads.get(&y).unwrap().as_scalar().unwrap(), 1.0);

    // the same expression over constant leaves has nothing to differentiate
    let cx = Var::constant(2.0);
    let cy = Var::constant(3.0);
    let cz = &cx * &cx + &cy;
    assert_relative_eq!(cz.value().as_scalar().unwrap(), 7.0);
    let grads = backward(&cz).unwrap();
    assert_eq!(grads.get(&cx).unwrap().as_scalar(), Some(0.0));
    assert_eq!(grads.get(&cy).unwrap().as_scalar(), Some(0.0));
}

#[test]
fn test_numerical_gradient_every_unary_function() {
    init_logger();
    let x = unit_interval(Shape::Vector(4), 1);
    for f in [
        UnaryFn::Neg,
        UnaryFn::Exp,
        UnaryFn::Ln,
        UnaryFn::Sin,
        UnaryFn::Cos,
        UnaryFn::Tan,
        UnaryFn::Cot,
        UnaryFn::Asin,
        UnaryFn::Acos,
        UnaryFn::Atan,
        UnaryFn::Acot,
        UnaryFn::Sinh,
        UnaryFn::Cosh,
        UnaryFn::Tanh,
        UnaryFn::Sqrt,
        UnaryFn::Square,
        UnaryFn::Min0,
        UnaryFn::Max0,
    ] {
        check_gradient(|v| v.apply(f).sum(), &x);
    }
}

#[test]
fn test_numerical_gradient_arithmetic() {
    init_logger();
    let x = unit_interval(Shape::Vector(5), 2);
    check_gradient(|v| (v.sin().exp() * v / (v.square() + 1.0)).sum(), &x);
    check_gradient(|v| (2.0 - v).pow(&v.cos()).unwrap().mean(), &x);
    check_gradient(|v| v.norm() * v.sum() - v.squared_norm(), &x);
}

#[test]
fn test_numerical_gradient_matmul() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(3);
    let a: Value<f64> = Value::random_normal_with_rng(Shape::Matrix(2, 3), &mut rng);
    let b: Value<f64> = Value::random_normal_with_rng(Shape::Matrix(3, 4), &mut rng);

    let b_const = b.clone();
    check_gradient(
        move |a| a.matmul(&Var::constant(b_const.clone())).unwrap().tanh().sum(),
        &a,
    );

    let a_const = a.clone();
    check_gradient(
        move |b| Var::constant(a_const.clone()).matmul(b).unwrap().tanh().sum(),
        &b,
    );
}

#[test]
fn test_numerical_gradient_transpose_outer_dot() {
    init_logger();
    let m = unit_interval(Shape::Matrix(3, 2), 4);
    check_gradient(|a| a.t().matmul(a).unwrap().sum(), &m);

    let x = unit_interval(Shape::Vector(3), 5);
    let y = Value::vector(vec![0.5, -1.0]);
    check_gradient(
        move |x| x.outer(&Var::constant(y.clone())).unwrap().sin().sum(),
        &x,
    );
    check_gradient(|x| x.dot(&x.exp()).unwrap(), &x);
}

#[test]
fn test_linearity() {
    init_logger();
    let x = Var::new(unit_interval(Shape::Vector(3), 6));
    let f = x.sin().sum();
    let g = (&x * &x).mean();
    let h = 3.0 * &f - 0.5 * &g;

    let gf = backward(&f).unwrap().get(&x).unwrap();
    let gg = backward(&g).unwrap().get(&x).unwrap();
    let gh = backward(&h).unwrap().get(&x).unwrap();
    for i in 0..3 {
        let expected = 3.0 * gf.get_flat(i).unwrap() - 0.5 * gg.get_flat(i).unwrap();
        assert_relative_eq!(gh.get_flat(i).unwrap(), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_diamond_dependency() {
    init_logger();
    // y = sin x feeds two branches that rejoin in z
    let x = Var::scalar(0.7);
    let y = x.sin();
    let z = &y * &y + y.exp();

    let grads = backward(&z).unwrap();
    let s = 0.7_f64.sin();
    let expected = (2.0 * s + s.exp()) * 0.7_f64.cos();
    assert_relative_eq!(grads.get(&x).unwrap().as_scalar().unwrap(), expected);
    assert_relative_eq!(
        grads.get(&y).unwrap().as_scalar().unwrap(),
        2.0 * s + s.exp()
    );
}

#[test]
fn test_non_ancestor_reads_zero_after_other_pass() {
    init_logger();
    let x = Var::scalar(1.5);
    let w = Var::scalar(2.0);
    let z = &w * &x;
    let y = x.exp();

    let first = backward(&z).unwrap();
    assert_eq!(first.get(&w).unwrap().as_scalar(), Some(1.5));

    // w took part in the previous pass but is not an ancestor of y
    let second = backward(&y).unwrap();
    assert!(!second.contains(&w));
    assert_eq!(second.get(&w).unwrap().as_scalar(), Some(0.0));
    assert_eq!(second.get(&z).unwrap().as_scalar(), Some(0.0));
}

#[test]
fn test_repeated_passes_agree() {
    init_logger();
    let x = Var::new(unit_interval(Shape::Matrix(2, 2), 7));
    let loss = x.tanh().squared_norm();
    let first = backward(&loss).unwrap().get(&x).unwrap();
    for _ in 0..3 {
        assert_eq!(backward(&loss).unwrap().get(&x).unwrap(), first);
    }
}

#[test]
fn test_shape_mismatch_leaves_graph_unchanged() {
    init_logger();
    let a = Var::vector(vec![1.0, 2.0, 3.0]);
    let b = Var::new(Value::<f64>::zeros(Shape::Matrix(2, 2)));

    let id_before = next_node_id();
    let live_before = live_nodes();

    let err = a.try_add(&b).unwrap_err();
    assert_eq!(
        err,
        AdError::ShapeMismatch {
            op: "add",
            lhs: Shape::Vector(3),
            rhs: Shape::Matrix(2, 2),
        }
    );
    assert!(b.matmul(&a).is_err());
    assert!(a.dot(&b).is_err());
    assert!(a.outer(&b).is_err());

    assert_eq!(next_node_id(), id_before);
    assert_eq!(live_nodes(), live_before);
}

#[test]
fn test_jacobian_of_matrix_vector_product() {
    init_logger();
    let a_value = Value::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
    let a = Var::new(a_value.clone());
    let x = Var::vector(vec![0.5, -2.0]);
    let y = a.matmul(&x).unwrap();

    let grads = backward(&y).unwrap();
    assert_eq!(grads.rows(), 3);
    assert!(matches!(
        grads.get(&x),
        Err(AdError::NotScalarOutput { rows: 3, .. })
    ));

    // dy/dx = A
    let jx = grads.jacobian(&x);
    assert_eq!((jx.nrows(), jx.ncols()), (3, 2));
    for i in 0..3 {
        for j in 0..2 {
            assert_relative_eq!(jx[(i, j)], a_value.get(i, j).unwrap());
        }
    }

    // dy_i/dA[r, c] = delta(i, r) * x[c], columns flattened column-major
    let ja = grads.jacobian(&a);
    assert_eq!((ja.nrows(), ja.ncols()), (3, 6));
    let xs = [0.5, -2.0];
    for i in 0..3 {
        for c in 0..2 {
            for r in 0..3 {
                let expected = if i == r { xs[c] } else { 0.0 };
                assert_relative_eq!(ja[(i, r + 3 * c)], expected);
            }
        }
    }
}

#[test]
fn test_jacobian_elementwise_is_diagonal() {
    init_logger();
    let x = Var::vector(vec![1.0, 2.0, 3.0]);
    let y = x.square();
    let jac = backward(&y).unwrap().jacobian(&x);
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 2.0 * (i as f64 + 1.0) } else { 0.0 };
            assert_relative_eq!(jac[(i, j)], expected);
        }
    }
}

#[test]
fn test_seeded_pass_is_vector_jacobian_product() {
    init_logger();
    let x = Var::new(unit_interval(Shape::Vector(3), 8));
    let a = Var::constant(unit_interval(Shape::Matrix(2, 3), 9));
    let y = a.matmul(&x.sin()).unwrap();

    let seed = Value::vector(vec![0.3, -1.2]);
    let vjp = backward_with_seed(&y, &seed).unwrap().get(&x).unwrap();
    let jac = backward(&y).unwrap().jacobian(&x);
    for j in 0..3 {
        let expected = 0.3 * jac[(0, j)] - 1.2 * jac[(1, j)];
        assert_relative_eq!(vjp.get_flat(j).unwrap(), expected, epsilon = 1e-12);
    }

    assert!(matches!(
        backward_with_seed(&y, &Value::vector(vec![1.0])),
        Err(AdError::SeedShapeMismatch { .. })
    ));
}

#[test]
fn test_intermediates_can_be_dropped_from_result() {
    init_logger();
    let x = Var::scalar(0.2);
    let h = x.exp();
    let out = h.sin();

    let all = backward(&out).unwrap();
    assert!(all.contains(&h));

    let options = BackwardOptions {
        retain_intermediates: false,
    };
    let lean = backward_with_options(&out, None, options).unwrap();
    assert!(!lean.contains(&h));
    assert_eq!(
        lean.get(&x).unwrap().as_scalar(),
        all.get(&x).unwrap().as_scalar()
    );
}

#[test]
fn test_nodes_released_when_handles_drop() {
    init_logger();
    let before = live_nodes();
    {
        let x = Var::vector(vec![1.0, 2.0]);
        let y = (&x * 2.0_f64).exp().sum();
        // x, literal, mul, exp, sum
        assert_eq!(live_nodes(), before + 5);
        drop(x);
        // still reachable from y
        assert_eq!(live_nodes(), before + 5);
        drop(y);
    }
    assert_eq!(live_nodes(), before);
}

#[test]
fn test_deep_chain() {
    init_logger();
    let x = Var::scalar(0.5);
    let one = Var::constant(1.0);
    let mut y = x.clone();
    for _ in 0..100_000 {
        y = &y + &one;
    }
    let grads = backward(&y).unwrap();
    assert_eq!(grads.get(&x).unwrap().as_scalar(), Some(1.0));
    assert_relative_eq!(y.value().as_scalar().unwrap(), 100_000.5);
    drop(grads);
    drop(y);
}

#[test]
fn test_f32() {
    init_logger();
    let x = Var::vector(vec![1.0_f32, 2.0]);
    let loss = (&x * &x).sum() * 0.5_f32;
    let grads = backward(&loss).unwrap();
    assert_eq!(grads.get(&x).unwrap().to_vec(), vec![1.0_f32, 2.0]);
}
