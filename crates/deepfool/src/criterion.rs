//! Adversarial-success predicates.
//!
//! A [`Criterion`] decides per sample whether the current input already
//! fools the model, given the scores the model assigned to it.

use crate::error::{ensure_len, Result};
use crate::tensor::{Batch, Logits};

pub trait Criterion {
    /// One flag per sample of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AttackError::ShapeMismatch`] when the criterion was
    /// built for a different batch size than `logits` carries.
    fn is_adversarial(&self, x: &Batch, logits: &Logits) -> Result<Vec<bool>>;
}

impl<F> Criterion for F
where
    F: Fn(&Batch, &Logits) -> Vec<bool>,
{
    fn is_adversarial(&self, x: &Batch, logits: &Logits) -> Result<Vec<bool>> {
        Ok(self(x, logits))
    }
}

/// Untargeted: adversarial once the predicted class differs from the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misclassification {
    labels: Vec<usize>,
}

impl Misclassification {
    pub fn new(labels: Vec<usize>) -> Self {
        Self { labels }
    }

    /// Labels taken from the model's own predictions, i.e. any change of the
    /// predicted class counts as success.
    pub fn from_predictions(logits: &Logits) -> Self {
        Self::new(logits.argmax())
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

impl Criterion for Misclassification {
    fn is_adversarial(&self, _x: &Batch, logits: &Logits) -> Result<Vec<bool>> {
        ensure_len("labels", logits.len(), self.labels.len())?;
        Ok(logits
            .argmax()
            .into_iter()
            .zip(&self.labels)
            .map(|(pred, &label)| pred != label)
            .collect())
    }
}

/// Targeted: adversarial once the predicted class equals the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetedMisclassification {
    targets: Vec<usize>,
}

impl TargetedMisclassification {
    pub fn new(targets: Vec<usize>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }
}

impl Criterion for TargetedMisclassification {
    fn is_adversarial(&self, _x: &Batch, logits: &Logits) -> Result<Vec<bool>> {
        ensure_len("targets", logits.len(), self.targets.len())?;
        Ok(logits
            .argmax()
            .into_iter()
            .zip(&self.targets)
            .map(|(pred, &target)| pred == target)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch2() -> Batch {
        Batch::from_rows(&[vec![0.0], vec![0.0]]).unwrap()
    }

    fn logits2() -> Logits {
        // predictions: row 0 -> class 1, row 1 -> class 0
        Logits::new(vec![0.1, 0.9, 0.8, 0.2], 2).unwrap()
    }

    #[test]
    fn misclassification_flags() {
        let c = Misclassification::new(vec![1, 1]);
        assert_eq!(c.is_adversarial(&batch2(), &logits2()).unwrap(), vec![false, true]);
    }

    #[test]
    fn misclassification_from_predictions_starts_clean() {
        let l = logits2();
        let c = Misclassification::from_predictions(&l);
        assert_eq!(c.labels(), &[1, 0]);
        assert_eq!(c.is_adversarial(&batch2(), &l).unwrap(), vec![false, false]);
    }

    #[test]
    fn targeted_flags() {
        let c = TargetedMisclassification::new(vec![1, 1]);
        assert_eq!(c.is_adversarial(&batch2(), &logits2()).unwrap(), vec![true, false]);
    }

    #[test]
    fn label_count_checked() {
        let c = Misclassification::new(vec![0]);
        assert!(c.is_adversarial(&batch2(), &logits2()).is_err());
    }

    #[test]
    fn closure_criterion() {
        let always = |x: &Batch, _: &Logits| vec![true; x.len()];
        assert_eq!(always.is_adversarial(&batch2(), &logits2()).unwrap(), vec![true, true]);
    }
}
