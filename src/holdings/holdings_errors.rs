use thiserror::Error;

pub type Result<T> = std::result::Result<T, HoldingError>;

#[derive(Error, Debug)]
pub enum HoldingError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Holding not found: {0}")]
    NotFound(String),

    #[error("Invalid holding data: {0}")]
    InvalidData(String),
}
