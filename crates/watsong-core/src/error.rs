use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A feel component was negative, infinite or NaN.
    #[error("invalid feel: {field} is {value}, expected a finite value >= 0")]
    InvalidFeel { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
