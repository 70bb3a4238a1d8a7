//! The DeepFool iteration driver.
//!
//! Each step linearizes the model around the current point towards every
//! candidate class, picks the class whose linearized boundary is closest,
//! and moves just past it:
//!
//! 1. evaluate the margin towards candidate 1 and check the criterion on its
//!    scores; stop if every sample is already adversarial
//! 2. evaluate the remaining candidates `2..k`
//! 3. per sample, take the candidate with the smallest distance
//! 4. accumulate the norm-specific step into `p_total`
//! 5. move non-adversarial samples to `x0 + (1 + overshoot) * p_total`,
//!    then clip into the model's bounds
//!
//! Samples that became adversarial are masked, not removed, so the batch
//! keeps its shape for the whole run.

pub mod candidates;
pub mod margin;
pub mod norm;

use log::{debug, info};

use crate::config::DeepFoolConfig;
use crate::criterion::Criterion;
use crate::error::{ensure_len, Result};
use crate::model::Model;
use crate::tensor::Batch;

use self::candidates::CandidateSet;
use self::margin::{MarginEval, MarginOracle};
use self::norm::{Linf, Norm, L2};

/// Added to the selected distance so a degenerate gradient still moves.
pub const STABILITY_OFFSET: f32 = 1e-4;

/// DeepFool parameterized by its norm geometry.
#[derive(Debug, Clone)]
pub struct DeepFool<N> {
    config: DeepFoolConfig,
    norm: N,
}

pub type L2DeepFool = DeepFool<L2>;
pub type LinfDeepFool = DeepFool<Linf>;

/// Everything [`DeepFool::run_with_report`] learns about one invocation.
#[derive(Debug, Clone)]
pub struct AttackReport {
    /// Final inputs, clipped into the model's bounds.
    pub adversarial: Batch,
    /// Loop iterations that applied a perturbation.
    pub steps: usize,
    /// Margin-oracle evaluations (one forward and one backward pass each).
    pub oracle_calls: usize,
    /// Criterion evaluated on the final inputs.
    pub success: Vec<bool>,
    /// Per-sample `||adversarial - original||_2`.
    pub l2_perturbation: Vec<f32>,
    /// Per-sample `||adversarial - original||_inf`.
    pub linf_perturbation: Vec<f32>,
}

impl AttackReport {
    pub fn success_count(&self) -> usize {
        self.success.iter().filter(|&&s| s).count()
    }

    pub fn success_rate(&self) -> f32 {
        if self.success.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.success_count() as f32 / self.success.len() as f32;
        rate
    }
}

struct SearchOutcome {
    x: Batch,
    steps: usize,
    oracle_calls: usize,
}

impl<N: Norm + Default> DeepFool<N> {
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(config: DeepFoolConfig) -> Result<Self> {
        Self::with_norm(N::default(), config)
    }
}

impl<N: Norm> DeepFool<N> {
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn with_norm(norm: N, config: DeepFoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, norm })
    }

    pub fn config(&self) -> &DeepFoolConfig {
        &self.config
    }

    pub fn norm(&self) -> &N {
        &self.norm
    }

    /// Search for adversarial versions of `inputs`.
    ///
    /// Returns the final candidates for every sample, whether or not they
    /// fool the model; check success with the same criterion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AttackError::TooFewCandidates`] if the model has
    /// fewer than 2 usable classes, and propagates model, criterion and
    /// shape errors.
    pub fn run<M, C>(&self, model: &M, inputs: &Batch, criterion: &C) -> Result<Batch>
    where
        M: Model + ?Sized,
        C: Criterion + ?Sized,
    {
        Ok(self.search(model, inputs, criterion)?.x)
    }

    /// Like [`DeepFool::run`], plus per-sample success and perturbation sizes.
    ///
    /// # Errors
    ///
    /// See [`DeepFool::run`].
    pub fn run_with_report<M, C>(
        &self,
        model: &M,
        inputs: &Batch,
        criterion: &C,
    ) -> Result<AttackReport>
    where
        M: Model + ?Sized,
        C: Criterion + ?Sized,
    {
        let outcome = self.search(model, inputs, criterion)?;
        let logits = model.forward(&outcome.x)?;
        let success = criterion.is_adversarial(&outcome.x, &logits)?;
        ensure_len("criterion flags", inputs.len(), success.len())?;

        let mut delta = vec![0.0f32; inputs.sample_len()];
        let mut l2_perturbation = Vec::with_capacity(inputs.len());
        let mut linf_perturbation = Vec::with_capacity(inputs.len());
        for (adv, orig) in outcome.x.samples().zip(inputs.samples()) {
            crate::kernels::ops::sub(adv, orig, &mut delta);
            l2_perturbation.push(L2.measure(&delta));
            linf_perturbation.push(Linf.measure(&delta));
        }

        let report = AttackReport {
            adversarial: outcome.x,
            steps: outcome.steps,
            oracle_calls: outcome.oracle_calls,
            success,
            l2_perturbation,
            linf_perturbation,
        };
        info!(
            "DeepFool-{}: {}/{} adversarial after {} steps ({} oracle calls)",
            self.norm.name(),
            report.success_count(),
            report.success.len(),
            report.steps,
            report.oracle_calls
        );
        Ok(report)
    }

    fn search<M, C>(&self, model: &M, inputs: &Batch, criterion: &C) -> Result<SearchOutcome>
    where
        M: Model + ?Sized,
        C: Criterion + ?Sized,
    {
        let bounds = model.bounds();
        let n = inputs.len();
        let d = inputs.sample_len();

        let initial = model.forward(inputs)?;
        ensure_len("logits rows", n, initial.len())?;
        ensure_len("logits classes", model.num_classes(), initial.classes())?;
        let candidates = CandidateSet::top_k(&initial, self.config.candidates)?;
        let oracle = MarginOracle::new(model, &candidates, self.config.loss);
        let scale = 1.0 + self.config.overshoot;

        let x0 = inputs;
        let mut x = inputs.clone();
        let mut p_total = vec![0.0f32; n * d];
        let mut p_step = vec![0.0f32; d];
        let mut steps = 0;
        let mut oracle_calls = 0;

        for step in 0..self.config.steps {
            // cheap check first: candidate 1 alone tells us whether we are done
            let first = oracle.evaluate(&x, 1)?;
            oracle_calls += 1;
            let is_adv = criterion.is_adversarial(&x, &first.logits)?;
            ensure_len("criterion flags", n, is_adv.len())?;
            let adv_count = is_adv.iter().filter(|&&a| a).count();
            debug!("step {step}: {adv_count}/{n} adversarial");
            if adv_count == n {
                break;
            }

            let mut evals: Vec<MarginEval> = Vec::with_capacity(candidates.len() - 1);
            evals.push(first);
            for k in 2..candidates.len() {
                evals.push(oracle.evaluate(&x, k)?);
                oracle_calls += 1;
            }

            for i in 0..n {
                let (best, distance) = self.closest_boundary(&evals, i);
                self.norm.step(
                    distance + STABILITY_OFFSET,
                    evals[best].grad.sample(i),
                    &mut p_step,
                );

                let p = &mut p_total[i * d..(i + 1) * d];
                for (acc, s) in p.iter_mut().zip(&p_step) {
                    *acc += s;
                }

                if !is_adv[i] {
                    let xi = x.sample_mut(i);
                    for ((dst, orig), acc) in xi.iter_mut().zip(x0.sample(i)).zip(p.iter()) {
                        *dst = orig + scale * acc;
                    }
                }
            }
            x.clip(bounds);
            steps += 1;
        }

        Ok(SearchOutcome {
            x,
            steps,
            oracle_calls,
        })
    }

    /// Index into `evals` and distance of the nearest linearized boundary for
    /// sample `i`; the first minimum wins on ties.
    fn closest_boundary(&self, evals: &[MarginEval], i: usize) -> (usize, f32) {
        let mut best = 0;
        let mut best_distance = self.norm.distance(evals[0].losses[i], evals[0].grad.sample(i));
        for (j, eval) in evals.iter().enumerate().skip(1) {
            let distance = self.norm.distance(eval.losses[i], eval.grad.sample(i));
            if distance < best_distance {
                best = j;
                best_distance = distance;
            }
        }
        (best, best_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LossKind;
    use crate::criterion::Misclassification;
    use crate::error::AttackError;
    use crate::model::LinearModel;
    use crate::tensor::Bounds;

    /// Two classes, boundary at x0 = x1 (score difference x0 - x1).
    fn diagonal_model() -> LinearModel {
        LinearModel::new(vec![1.0, 0.0, 0.0, 1.0], vec![], 2, Bounds::unit()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = DeepFoolConfig::default().with_candidates(Some(1));
        assert!(matches!(
            L2DeepFool::new(cfg),
            Err(AttackError::TooFewCandidates { candidates: 1 })
        ));
        let cfg = DeepFoolConfig::default().with_overshoot(-1.0);
        assert!(LinfDeepFool::new(cfg).is_err());
    }

    #[test]
    fn zero_steps_returns_input() {
        let m = diagonal_model();
        let x = Batch::from_rows(&[vec![0.7, 0.3]]).unwrap();
        let attack = L2DeepFool::new(DeepFoolConfig::default().with_steps(0)).unwrap();
        let report = attack
            .run_with_report(&m, &x, &Misclassification::new(vec![0]))
            .unwrap();
        assert_eq!(report.adversarial, x);
        assert_eq!(report.steps, 0);
        assert_eq!(report.oracle_calls, 0);
        assert_eq!(report.success, vec![false]);
    }

    #[test]
    fn crosses_boundary_in_one_step() {
        let m = diagonal_model();
        let x = Batch::from_rows(&[vec![0.7, 0.3]]).unwrap();
        let crit = Misclassification::new(vec![0]);
        let attack = L2DeepFool::new(DeepFoolConfig::default()).unwrap();
        let report = attack.run_with_report(&m, &x, &crit).unwrap();
        assert_eq!(report.success, vec![true]);
        assert_eq!(report.steps, 1);
        // one step, then the early-exit check of step 2
        assert_eq!(report.oracle_calls, 2);
        let adv = report.adversarial.sample(0);
        assert!(adv[1] > adv[0]);
    }

    #[test]
    fn loss_modes_agree_on_linear_model() {
        let m = diagonal_model();
        let x = Batch::from_rows(&[vec![0.9, 0.2], vec![0.35, 0.6]]).unwrap();
        let crit = Misclassification::from_predictions(&m.forward(&x).unwrap());
        let a = LinfDeepFool::new(DeepFoolConfig::default()).unwrap();
        let b = LinfDeepFool::new(DeepFoolConfig::default().with_loss(LossKind::CrossEntropy))
            .unwrap();
        let xa = a.run(&m, &x, &crit).unwrap();
        let xb = b.run(&m, &x, &crit).unwrap();
        for (u, v) in xa.data().iter().zip(xb.data()) {
            assert!((u - v).abs() < 1e-4, "{u} vs {v}");
        }
    }

    #[test]
    fn criterion_length_checked() {
        let m = diagonal_model();
        let x = Batch::from_rows(&[vec![0.7, 0.3]]).unwrap();
        let bad = |_: &Batch, _: &crate::tensor::Logits| vec![false, false];
        let attack = L2DeepFool::new(DeepFoolConfig::default()).unwrap();
        assert!(matches!(
            attack.run(&m, &x, &bad),
            Err(AttackError::ShapeMismatch { what: "criterion flags", .. })
        ));
    }

    /// Declares more classes than its forward pass produces.
    struct MisreportedClasses(LinearModel);

    impl Model for MisreportedClasses {
        fn num_classes(&self) -> usize {
            self.0.num_classes() + 1
        }

        fn bounds(&self) -> Bounds {
            self.0.bounds()
        }

        fn forward(&self, x: &Batch) -> Result<crate::tensor::Logits> {
            self.0.forward(x)
        }

        fn vjp(&self, x: &Batch, cotangent: &[f32]) -> Result<Batch> {
            self.0.vjp(x, cotangent)
        }
    }

    #[test]
    fn logits_width_checked_against_model() {
        let m = MisreportedClasses(diagonal_model());
        let x = Batch::from_rows(&[vec![0.7, 0.3]]).unwrap();
        let attack = L2DeepFool::new(DeepFoolConfig::default()).unwrap();
        assert!(matches!(
            attack.run(&m, &x, &Misclassification::new(vec![0])),
            Err(AttackError::ShapeMismatch {
                what: "logits classes",
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn report_rates() {
        let r = AttackReport {
            adversarial: Batch::from_rows(&[vec![0.0], vec![0.0]]).unwrap(),
            steps: 1,
            oracle_calls: 1,
            success: vec![true, false],
            l2_perturbation: vec![0.0, 0.0],
            linf_perturbation: vec![0.0, 0.0],
        };
        assert_eq!(r.success_count(), 1);
        assert!((r.success_rate() - 0.5).abs() < 1e-6);
    }
}
