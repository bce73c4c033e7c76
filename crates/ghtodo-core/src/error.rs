use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid todo text: {0}")]
    InvalidText(String),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
}
