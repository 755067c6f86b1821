use thiserror::Error;

/// Errors raised by the review store and service.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// Missing or blank required input; shown to the user, nothing is written.
    #[error("{0}")]
    Validation(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
