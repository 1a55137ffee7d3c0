use thiserror::Error;

pub type Result<T> = std::result::Result<T, FxError>;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),
}
