use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssetError>;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset data: {0}")]
    InvalidData(String),

    #[error("No active snapshot for asset class '{0}'")]
    NoActiveSnapshot(String),

    #[error("Market data error: {0}")]
    MarketDataError(String),
}
