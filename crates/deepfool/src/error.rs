use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttackError {
    #[error("Failed to read attack config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected at least 2 candidate classes, got {candidates}")]
    TooFewCandidates { candidates: usize },

    #[error("expected loss to be 'logits' or 'crossentropy', got '{0}'")]
    UnknownLoss(String),

    #[error("overshoot must be finite and non-negative, got {0}")]
    InvalidOvershoot(f32),

    #[error("invalid input bounds: [{min}, {max}]")]
    InvalidBounds { min: f32, max: f32 },

    #[error("{what} shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

impl AttackError {
    /// True for errors caused by the attack configuration rather than by the
    /// inputs or collaborators handed to a single invocation.
    pub fn is_invalid_config(&self) -> bool {
        matches!(
            self,
            Self::TooFewCandidates { .. } | Self::UnknownLoss(_) | Self::InvalidOvershoot(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AttackError>;

/// Fail with [`AttackError::ShapeMismatch`] unless `got == expected`.
pub(crate) fn ensure_len(what: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(AttackError::ShapeMismatch {
            what,
            expected,
            got,
        })
    }
}
