//! Shared helpers for the attack falsification tests.

#![allow(dead_code)]

use deepfool::{Batch, Bounds, LinearModel, ReluMlp};

/// Asserts every element in a slice is finite (not NaN or infinite).
pub fn assert_all_finite(slice: &[f32]) {
    for (i, &val) in slice.iter().enumerate() {
        assert!(val.is_finite(), "Element [{i}] is not finite: {val}");
    }
}

/// Asserts every element lies inside `bounds`.
pub fn assert_within_bounds(slice: &[f32], bounds: Bounds) {
    for (i, &val) in slice.iter().enumerate() {
        assert!(
            val >= bounds.min && val <= bounds.max,
            "Element [{i}] = {val} outside [{}, {}]",
            bounds.min,
            bounds.max
        );
    }
}

/// L2 distance between two vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// L-infinity distance between two vectors.
pub fn linf_distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(0.0f32, |acc, (x, y)| acc.max((x - y).abs()))
}

/// Dot product of two vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Deterministic pseudo-random weights in `[-1, 1]`.
pub fn pattern_weights(len: usize, seed: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (((i * 7 + seed * 13 + 3) % 17) as f32 / 8.0) - 1.0)
        .collect()
}

/// Linear classifier with `classes` outputs over `features` inputs.
pub fn pattern_linear(features: usize, classes: usize, bounds: Bounds) -> LinearModel {
    LinearModel::new(
        pattern_weights(features * classes, 1),
        pattern_weights(classes, 2),
        features,
        bounds,
    )
    .unwrap()
}

/// One-hidden-layer ReLU network.
pub fn pattern_mlp(features: usize, hidden: usize, classes: usize, bounds: Bounds) -> ReluMlp {
    ReluMlp::new(
        (pattern_weights(hidden * features, 3), pattern_weights(hidden, 4)),
        (pattern_weights(classes * hidden, 5), pattern_weights(classes, 6)),
        features,
        bounds,
    )
    .unwrap()
}

/// `n x d` batch with values spread over `bounds`.
pub fn spread_batch(n: usize, d: usize, bounds: Bounds) -> Batch {
    let span = bounds.max - bounds.min;
    let data = (0..n * d)
        .map(|i| bounds.min + span * (((i * 5 + 1) % 11) as f32 + 0.5) / 11.5)
        .collect();
    Batch::new(data, &[n, d]).unwrap()
}
