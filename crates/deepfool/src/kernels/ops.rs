//! Shared primitives: dot product, vector norms, sign, argmax.

/// Dot product of two slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0f32;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

/// Euclidean norm `sqrt(sum(v_i^2))`.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Manhattan norm `sum(|v_i|)`, the dual of the Chebyshev norm.
#[inline]
pub fn l1_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x.abs()).sum()
}

/// Chebyshev norm `max(|v_i|)`; zero for an empty slice.
#[inline]
pub fn linf_norm(v: &[f32]) -> f32 {
    v.iter().fold(0.0f32, |acc, x| acc.max(x.abs()))
}

/// Elementwise sign with `sign(0) = 0`.
///
/// Unlike [`f32::signum`], zero (of either sign) maps to zero.
#[inline]
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Index of the largest element; the first one wins on ties.
///
/// # Panics
/// Panics if `row` is empty.
pub fn argmax(row: &[f32]) -> usize {
    assert!(!row.is_empty(), "argmax of empty row");
    let mut best = 0;
    for i in 1..row.len() {
        if row[i] > row[best] {
            best = i;
        }
    }
    best
}

/// `out[i] = a[i] - b[i]`.
#[inline]
pub fn sub(a: &[f32], b: &[f32], out: &mut [f32]) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x - y;
    }
}
