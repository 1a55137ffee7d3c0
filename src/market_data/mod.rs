pub(crate) mod market_data_errors;
pub mod providers;

// Re-export the public interface
pub use market_data_errors::MarketDataError;
pub use providers::{MarketDataProvider, RestProvider};
