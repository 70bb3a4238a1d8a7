//! Top-k candidate classes per sample.

use log::info;

use crate::error::{AttackError, Result};
use crate::tensor::Logits;

/// Per-sample class indices ordered by descending score.
///
/// Position 0 is the predicted class of the original input; positions
/// `1..len()` are the alternatives the attack linearizes towards. The set is
/// fixed for the whole attack and never re-ranked as the input moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    classes: Vec<usize>,
    per_sample: usize,
}

impl CandidateSet {
    /// Rank every row of `logits` and keep the first `candidates` classes
    /// (all of them for `None`). Equal scores keep ascending class order, so
    /// the lowest tied index ranks first, unlike a flipped ascending argsort.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::TooFewCandidates`] if fewer than 2 classes
    /// remain, either because of the bound or because the model has fewer
    /// than 2 classes.
    pub fn top_k(logits: &Logits, candidates: Option<usize>) -> Result<Self> {
        let classes = logits.classes();
        let per_sample = match candidates {
            None => classes,
            Some(bound) => {
                let k = bound.min(classes);
                if k >= 2 {
                    info!("Only testing the top-{k} classes");
                }
                k
            }
        };
        if per_sample < 2 {
            return Err(AttackError::TooFewCandidates {
                candidates: per_sample,
            });
        }

        let mut ranked = Vec::with_capacity(logits.len() * per_sample);
        let mut order: Vec<usize> = Vec::with_capacity(classes);
        for i in 0..logits.len() {
            let row = logits.row(i);
            order.clear();
            order.extend(0..classes);
            order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
            ranked.extend_from_slice(&order[..per_sample]);
        }
        Ok(Self {
            classes: ranked,
            per_sample,
        })
    }

    /// Number of candidate positions per sample (including position 0).
    pub fn len(&self) -> usize {
        self.per_sample
    }

    pub fn is_empty(&self) -> bool {
        self.per_sample == 0
    }

    pub fn samples(&self) -> usize {
        self.classes.len() / self.per_sample
    }

    /// Class at candidate `position` for `sample`.
    pub fn class(&self, sample: usize, position: usize) -> usize {
        debug_assert!(position < self.per_sample);
        self.classes[sample * self.per_sample + position]
    }

    /// The reference (originally predicted) class of `sample`.
    pub fn reference(&self, sample: usize) -> usize {
        self.class(sample, 0)
    }

    pub fn row(&self, sample: usize) -> &[usize] {
        &self.classes[sample * self.per_sample..(sample + 1) * self.per_sample]
    }
}
