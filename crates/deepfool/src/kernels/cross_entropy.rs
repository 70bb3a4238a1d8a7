//! Cross-entropy against a hard class label, with log-softmax.
//!
//! `ce(logits, c) = -log_softmax(logits)_c`, where log-softmax uses the
//! log-sum-exp trick for numerical stability:
//!   `log_softmax(x)_i = x_i - max(x) - log(sum(exp(x_j - max(x))))`
//!
//! The gradient w.r.t. the logits is `softmax(logits) - onehot(c)`.

/// Compute numerically stable log-softmax via log-sum-exp.
///
/// For each element: `output_i = logits_i - max(logits) - log(sum(exp(logits_j - max(logits))))`.
/// All output values are <= 0.
///
/// # Panics
/// Panics if `logits.len() != output.len()` or `logits.is_empty()`.
pub fn log_softmax(logits: &[f32], output: &mut [f32]) {
    assert_eq!(logits.len(), output.len(), "logits/output length mismatch");
    assert!(!logits.is_empty(), "logits must not be empty");

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum_exp: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
    let lse = max + sum_exp.ln();

    for (x, y) in logits.iter().zip(output.iter_mut()) {
        *y = x - lse;
    }
}

/// Cross-entropy of `logits` against the hard label `class`.
///
/// Returns a non-negative scalar.
///
/// # Panics
/// Panics if `logits` is empty or `class` is out of range.
pub fn cross_entropy(logits: &[f32], class: usize) -> f32 {
    assert!(
        class < logits.len(),
        "class {class} out of range for {} logits",
        logits.len()
    );
    let mut log_sm = vec![0.0f32; logits.len()];
    log_softmax(logits, &mut log_sm);
    -log_sm[class]
}

/// Gradient of [`cross_entropy`] w.r.t. the logits: `softmax(logits) - onehot(class)`.
///
/// # Panics
/// Panics if lengths differ, `logits` is empty, or `class` is out of range.
pub fn cross_entropy_grad(logits: &[f32], class: usize, grad: &mut [f32]) {
    assert!(
        class < logits.len(),
        "class {class} out of range for {} logits",
        logits.len()
    );
    log_softmax(logits, grad);
    for g in grad.iter_mut() {
        *g = g.exp();
    }
    grad[class] -= 1.0;
}
