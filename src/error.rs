use thiserror::Error;

/// Failures raised by the rating and simulation core.
///
/// Neither variant is retryable: both describe bad input data and abort the
/// run before any partial result is handed back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed seeding, a team missing from the rating table, or a
    /// parameter that makes the run meaningless (e.g. zero trials).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input that violates the rating fold's ordering contract.
    #[error("Precondition violated: {0}")]
    Precondition(String),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        SimError::Precondition(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
