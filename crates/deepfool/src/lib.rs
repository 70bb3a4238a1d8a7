//! # deepfool
//!
//! Minimal-perturbation adversarial examples for differentiable classifiers.
//!
//! Implements DeepFool (Moosavi-Dezfooli, Fawzi, Frossard, "DeepFool: a
//! simple and accurate method to fool deep neural networks",
//! arXiv:1511.04599) in its L2 and L-infinity variants. The attack repeatedly
//! linearizes the model around the current input, finds the closest
//! linearized decision boundary among the top-k classes, and steps just past
//! it.
//!
//! ```
//! use deepfool::{Batch, Bounds, DeepFoolConfig, L2DeepFool, LinearModel, Misclassification};
//!
//! let model = LinearModel::new(vec![1.0, 0.0, 0.0, 1.0], vec![], 2, Bounds::unit())?;
//! let x = Batch::from_rows(&[vec![0.7, 0.3]])?;
//! let attack = L2DeepFool::new(DeepFoolConfig::default())?;
//! let adv = attack.run(&model, &x, &Misclassification::new(vec![0]))?;
//! assert!(adv.sample(0)[1] > adv.sample(0)[0]);
//! # Ok::<(), deepfool::AttackError>(())
//! ```
//!
//! ## Modules
//!
//! - [`attack`] — iteration driver, candidate selection, margin oracle, norms
//! - [`model`] — the [`Model`] trait and reference classifiers
//! - [`criterion`] — adversarial-success predicates
//! - [`config`] — attack configuration, loadable from YAML
//! - [`tensor`] — flat batch and score containers
//! - [`kernels`] — scalar numeric kernels
//! - [`error`] — error type

pub mod attack;
pub mod config;
pub mod criterion;
pub mod error;
pub mod kernels;
pub mod model;
pub mod tensor;

pub use attack::norm::{Linf, Norm, L2};
pub use attack::{AttackReport, DeepFool, L2DeepFool, LinfDeepFool};
pub use config::{DeepFoolConfig, LossKind};
pub use criterion::{Criterion, Misclassification, TargetedMisclassification};
pub use error::{AttackError, Result};
pub use model::{LinearModel, Model, ReluMlp};
pub use tensor::{Batch, Bounds, Logits};
