//! Attack configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! steps: 50
//! candidates: 10      # `~` means every class
//! overshoot: 0.02
//! loss: logits        # or `crossentropy`
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AttackError, Result};

/// Margin formulation used by the linearized oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LossKind {
    /// `score[k] - score[top]` on raw scores.
    #[default]
    Logits,
    /// `-ce(scores, k) + ce(scores, top)`.
    CrossEntropy,
}

impl LossKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logits => "logits",
            Self::CrossEntropy => "crossentropy",
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossKind {
    type Err = AttackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logits" => Ok(Self::Logits),
            "crossentropy" => Ok(Self::CrossEntropy),
            other => Err(AttackError::UnknownLoss(other.to_string())),
        }
    }
}

impl TryFrom<String> for LossKind {
    type Error = AttackError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LossKind> for String {
    fn from(kind: LossKind) -> Self {
        kind.as_str().to_string()
    }
}

pub const DEFAULT_STEPS: usize = 50;
pub const DEFAULT_CANDIDATES: usize = 10;
pub const DEFAULT_OVERSHOOT: f32 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeepFoolConfig {
    /// Maximum number of linearization steps.
    pub steps: usize,
    /// Restrict the search to the top-k classes; `None` uses all of them.
    pub candidates: Option<usize>,
    /// Relative distance to push past the estimated boundary.
    pub overshoot: f32,
    pub loss: LossKind,
}

impl Default for DeepFoolConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            candidates: Some(DEFAULT_CANDIDATES),
            overshoot: DEFAULT_OVERSHOOT,
            loss: LossKind::Logits,
        }
    }
}

impl DeepFoolConfig {
    /// Parse and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::Io`] if the file cannot be read,
    /// [`AttackError::Yaml`] if the YAML is malformed or names an unknown
    /// loss, or a configuration error from [`DeepFoolConfig::validate`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML configuration from a string.
    ///
    /// # Errors
    ///
    /// See [`DeepFoolConfig::from_path`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`AttackError::TooFewCandidates`] for a candidate bound below
    /// 2 and [`AttackError::InvalidOvershoot`] for a negative or non-finite
    /// overshoot.
    pub fn validate(&self) -> Result<()> {
        if let Some(candidates) = self.candidates {
            if candidates < 2 {
                return Err(AttackError::TooFewCandidates { candidates });
            }
        }
        if !self.overshoot.is_finite() || self.overshoot < 0.0 {
            return Err(AttackError::InvalidOvershoot(self.overshoot));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: Option<usize>) -> Self {
        self.candidates = candidates;
        self
    }

    #[must_use]
    pub fn with_overshoot(mut self, overshoot: f32) -> Self {
        self.overshoot = overshoot;
        self
    }

    #[must_use]
    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = DeepFoolConfig::default();
        assert_eq!(c.steps, 50);
        assert_eq!(c.candidates, Some(10));
        assert!((c.overshoot - 0.02).abs() < f32::EPSILON);
        assert_eq!(c.loss, LossKind::Logits);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r"
steps: 20
candidates: 3
overshoot: 0.1
loss: crossentropy
";
        let c = DeepFoolConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.steps, 20);
        assert_eq!(c.candidates, Some(3));
        assert!((c.overshoot - 0.1).abs() < 1e-6);
        assert_eq!(c.loss, LossKind::CrossEntropy);
    }

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let c = DeepFoolConfig::from_yaml_str("steps: 7\n").unwrap();
        assert_eq!(c.steps, 7);
        assert_eq!(c.candidates, Some(10));
        assert_eq!(c.loss, LossKind::Logits);
    }

    #[test]
    fn parse_empty_is_default() {
        assert_eq!(DeepFoolConfig::from_yaml_str("").unwrap(), DeepFoolConfig::default());
    }

    #[test]
    fn null_candidates_means_all() {
        let c = DeepFoolConfig::from_yaml_str("candidates: ~\n").unwrap();
        assert_eq!(c.candidates, None);
    }

    #[test]
    fn unknown_loss_rejected() {
        let err = DeepFoolConfig::from_yaml_str("loss: hinge\n").unwrap_err();
        assert!(matches!(err, AttackError::Yaml(_)));
        assert!(err.to_string().contains("hinge"), "{err}");
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(DeepFoolConfig::from_yaml_str("stepz: 3\n").is_err());
    }

    #[test]
    fn single_candidate_rejected() {
        let err = DeepFoolConfig::from_yaml_str("candidates: 1\n").unwrap_err();
        assert!(matches!(err, AttackError::TooFewCandidates { candidates: 1 }));
    }

    #[test]
    fn negative_overshoot_rejected() {
        let c = DeepFoolConfig::default().with_overshoot(-0.5);
        assert!(matches!(c.validate(), Err(AttackError::InvalidOvershoot(_))));
        let c = DeepFoolConfig::default().with_overshoot(f32::NAN);
        assert!(c.validate().is_err());
    }

    #[test]
    fn loss_kind_from_str() {
        assert_eq!("logits".parse::<LossKind>().unwrap(), LossKind::Logits);
        assert_eq!("crossentropy".parse::<LossKind>().unwrap(), LossKind::CrossEntropy);
        let err = "unsupported-value".parse::<LossKind>().unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn serialize_round_trip_names() {
        let c = DeepFoolConfig::default().with_loss(LossKind::CrossEntropy);
        let yaml = serde_yaml::to_string(&c).unwrap();
        assert!(yaml.contains("loss: crossentropy"), "{yaml}");
        assert_eq!(DeepFoolConfig::from_yaml_str(&yaml).unwrap(), c);
    }
}
