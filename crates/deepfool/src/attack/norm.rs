//! Norm geometry of the minimal step.
//!
//! Under the linearization `f(x + r) ~ loss + <grad, r>`, the smallest `r`
//! (in norm `p`) reaching the boundary has size `|loss| / ||grad||_q` with
//! `q` the dual norm, and points along the steepest-ascent direction of that
//! dual pairing.

use crate::kernels::ops::{l1_norm, l2_norm, linf_norm, sign};

/// Guards divisions by a vanishing gradient norm.
pub const EPSILON: f32 = 1e-8;

pub trait Norm {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Distance from the current point to the linearized boundary.
    fn distance(&self, loss: f32, grad: &[f32]) -> f32;

    /// Perturbation of size `distance` (in this norm) along `grad`.
    ///
    /// # Panics
    /// Panics if `out.len() != grad.len()`.
    fn step(&self, distance: f32, grad: &[f32], out: &mut [f32]);

    /// Size of `v` in this norm.
    fn measure(&self, v: &[f32]) -> f32;
}

/// Euclidean geometry: `r = |loss| / ||grad||_2^2 * grad`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L2;

impl Norm for L2 {
    fn name(&self) -> &'static str {
        "L2"
    }

    fn distance(&self, loss: f32, grad: &[f32]) -> f32 {
        loss.abs() / (l2_norm(grad) + EPSILON)
    }

    fn step(&self, distance: f32, grad: &[f32], out: &mut [f32]) {
        assert_eq!(grad.len(), out.len(), "grad/out length mismatch");
        let scale = distance / (l2_norm(grad) + EPSILON);
        for (o, g) in out.iter_mut().zip(grad) {
            *o = scale * g;
        }
    }

    fn measure(&self, v: &[f32]) -> f32 {
        l2_norm(v)
    }
}

/// Chebyshev geometry: `r = |loss| / ||grad||_1 * sign(grad)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linf;

impl Norm for Linf {
    fn name(&self) -> &'static str {
        "Linf"
    }

    fn distance(&self, loss: f32, grad: &[f32]) -> f32 {
        loss.abs() / (l1_norm(grad) + EPSILON)
    }

    fn step(&self, distance: f32, grad: &[f32], out: &mut [f32]) {
        assert_eq!(grad.len(), out.len(), "grad/out length mismatch");
        for (o, g) in out.iter_mut().zip(grad) {
            *o = distance * sign(*g);
        }
    }

    fn measure(&self, v: &[f32]) -> f32 {
        linf_norm(v)
    }
}
