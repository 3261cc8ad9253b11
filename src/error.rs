use thiserror::Error;

/// Failures from day-key and instant derivation. Engine transitions never
/// produce these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid day key: {0}")]
    InvalidDayKey(String),

    #[error("Invalid instant: {0}")]
    InvalidInstant(String),
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CliError {
    pub message: String,
    pub exit_code: i32,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 2,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 5,
        }
    }
}

impl From<QuestError> for CliError {
    fn from(e: QuestError) -> Self {
        CliError::usage(e.to_string())
    }
}
