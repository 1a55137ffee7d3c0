use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccountError>;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("Invalid account data: {0}")]
    InvalidData(String),

    #[error("Mode switch rejected: {0}")]
    ModeSwitchBlocked(String),
}
