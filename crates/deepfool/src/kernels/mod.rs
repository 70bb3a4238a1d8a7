//! Scalar numeric kernels shared by the reference models and the margin oracle.
//!
//! All kernels work on flat row-major `f32` slices with explicit dimensions.

// Kernel code naturally uses single-character math variable names (m, n, k, etc.).
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::needless_range_loop,
    clippy::cast_precision_loss
)]

pub mod cross_entropy;
pub mod linear;
pub mod ops;
