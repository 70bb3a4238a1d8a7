//! Linearized margin oracle.
//!
//! For candidate position `k` the per-sample margin is
//! `loss_i = f(x_i)[cand(i, k)] - f(x_i)[cand(i, 0)]`, on raw scores or on
//! negative cross-entropies. One forward pass gives the scores, one
//! vector-Jacobian product gives `d(sum_i loss_i)/dx`, which per sample is
//! exactly `d loss_i / dx_i` because the samples do not interact.

use crate::attack::candidates::CandidateSet;
use crate::config::LossKind;
use crate::error::{ensure_len, Result};
use crate::kernels::cross_entropy::{cross_entropy_grad, log_softmax};
use crate::model::Model;
use crate::tensor::{Batch, Logits};

/// Result of one oracle evaluation.
#[derive(Debug, Clone)]
pub struct MarginEval {
    /// Sum of the per-sample losses; the scalar that was differentiated.
    pub total: f32,
    pub losses: Vec<f32>,
    pub logits: Logits,
    /// Gradient of `total` w.r.t. the input, same shape as the input.
    pub grad: Batch,
}

pub struct MarginOracle<'a, M: ?Sized> {
    model: &'a M,
    candidates: &'a CandidateSet,
    loss: LossKind,
}

impl<'a, M: Model + ?Sized> MarginOracle<'a, M> {
    pub fn new(model: &'a M, candidates: &'a CandidateSet, loss: LossKind) -> Self {
        Self {
            model,
            candidates,
            loss,
        }
    }

    /// Margin and gradient towards candidate position `k` at `x`.
    ///
    /// # Errors
    ///
    /// Propagates model failures and returns
    /// [`crate::AttackError::ShapeMismatch`] when the model's scores do not
    /// match the batch or the candidate set.
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0 or not a valid candidate position.
    pub fn evaluate(&self, x: &Batch, k: usize) -> Result<MarginEval> {
        assert!(
            k >= 1 && k < self.candidates.len(),
            "candidate position {k} out of range 1..{}",
            self.candidates.len()
        );
        let n = x.len();
        let logits = self.model.forward(x)?;
        ensure_len("logits rows", n, logits.len())?;
        ensure_len("candidate rows", n, self.candidates.samples())?;
        let c = logits.classes();
        ensure_len("logits classes", self.model.num_classes(), c)?;

        let mut losses = vec![0.0f32; n];
        let mut cotangent = vec![0.0f32; n * c];
        match self.loss {
            LossKind::Logits => {
                for i in 0..n {
                    let (i0, ik) = (self.candidates.reference(i), self.candidates.class(i, k));
                    let row = logits.row(i);
                    losses[i] = row[ik] - row[i0];
                    let cot = &mut cotangent[i * c..(i + 1) * c];
                    cot[ik] += 1.0;
                    cot[i0] -= 1.0;
                }
            }
            LossKind::CrossEntropy => {
                let mut log_sm = vec![0.0f32; c];
                let mut grad_k = vec![0.0f32; c];
                let mut grad_0 = vec![0.0f32; c];
                for i in 0..n {
                    let (i0, ik) = (self.candidates.reference(i), self.candidates.class(i, k));
                    let row = logits.row(i);
                    log_softmax(row, &mut log_sm);
                    // (-ce_k) - (-ce_0)
                    losses[i] = log_sm[ik] - log_sm[i0];
                    cross_entropy_grad(row, ik, &mut grad_k);
                    cross_entropy_grad(row, i0, &mut grad_0);
                    let cot = &mut cotangent[i * c..(i + 1) * c];
                    for j in 0..c {
                        cot[j] = grad_0[j] - grad_k[j];
                    }
                }
            }
        }

        let grad = self.model.vjp(x, &cotangent)?;
        ensure_len("gradient", x.data().len(), grad.data().len())?;
        Ok(MarginEval {
            total: losses.iter().sum(),
            losses,
            logits,
            grad,
        })
    }
}
