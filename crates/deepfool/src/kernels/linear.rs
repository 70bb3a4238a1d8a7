//! Linear projection `y = xW^T + b` and its input gradient `dx = dy W`.

use super::ops;

/// Linear projection.
///
/// Computes `y = x @ W^T + bias` where:
/// - `x` is `batch x in_features` (row-major)
/// - `weight` is `out_features x in_features` (row-major, transposed during multiply)
/// - `bias` is `out_features` (optional, pass empty slice for no bias)
/// - `output` is `batch x out_features`
///
/// # Panics
/// Panics if dimensions are inconsistent.
pub fn linear(
    x: &[f32],
    weight: &[f32],
    bias: &[f32],
    batch: usize,
    in_features: usize,
    out_features: usize,
    output: &mut [f32],
) {
    assert_eq!(x.len(), batch * in_features, "x dimension mismatch");
    assert_eq!(weight.len(), out_features * in_features, "weight dimension mismatch");
    assert_eq!(output.len(), batch * out_features, "output dimension mismatch");
    assert!(
        bias.is_empty() || bias.len() == out_features,
        "bias must be empty or out_features={out_features}, got {}",
        bias.len()
    );

    for b in 0..batch {
        let x_row = &x[b * in_features..(b + 1) * in_features];
        for o in 0..out_features {
            let w_row = &weight[o * in_features..(o + 1) * in_features];
            let mut val = ops::dot(x_row, w_row);
            if !bias.is_empty() {
                val += bias[o];
            }
            output[b * out_features + o] = val;
        }
    }
}

/// Vector-Jacobian product of [`linear`] w.r.t. its input.
///
/// Given the cotangent `grad_output` (`batch x out_features`), writes
/// `grad_input = grad_output @ W` (`batch x in_features`). The bias does not
/// contribute.
///
/// # Panics
/// Panics if dimensions are inconsistent.
pub fn linear_input_grad(
    grad_output: &[f32],
    weight: &[f32],
    batch: usize,
    in_features: usize,
    out_features: usize,
    grad_input: &mut [f32],
) {
    assert_eq!(grad_output.len(), batch * out_features, "grad_output dimension mismatch");
    assert_eq!(weight.len(), out_features * in_features, "weight dimension mismatch");
    assert_eq!(grad_input.len(), batch * in_features, "grad_input dimension mismatch");

    grad_input.fill(0.0);
    for b in 0..batch {
        let gi = &mut grad_input[b * in_features..(b + 1) * in_features];
        for o in 0..out_features {
            let g = grad_output[b * out_features + o];
            if g == 0.0 {
                continue;
            }
            let w_row = &weight[o * in_features..(o + 1) * in_features];
            for (dst, w) in gi.iter_mut().zip(w_row) {
                *dst += g * w;
            }
        }
    }
}
