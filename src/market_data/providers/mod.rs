pub(crate) mod market_data_provider;
pub mod models;
pub(crate) mod rest_provider;

pub use market_data_provider::MarketDataProvider;
pub use rest_provider::RestProvider;
