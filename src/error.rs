use thiserror::Error;

/// Errors raised while setting up or running a sweep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelatednessError {
    /// Malformed weights, samples, windows, or tables.
    /// Reported before any sweep state exists.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The edge events contradict the current forest.
    /// The sweep cannot continue past one of these.
    #[error("invariant violation at position {position}: {message}")]
    InvariantViolation { position: f64, message: String },
}

pub type Result<T> = std::result::Result<T, RelatednessError>;

impl RelatednessError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invariant_violation(position: f64, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            position,
            message: message.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
