use async_trait::async_trait;

use crate::market_data::MarketDataError;

use super::models::{CommodityRow, CryptoRow, EquityRow, ForexPairRow, QuoteRow};

/// External reference-data provider.
///
/// Universe calls return the full raw row set for one asset class; quote
/// calls return the latest short-form quote for one symbol. Implementations
/// map every transport or payload problem to a `MarketDataError` variant.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_equities(&self) -> Result<Vec<EquityRow>, MarketDataError>;
    async fn get_cryptocurrencies(&self) -> Result<Vec<CryptoRow>, MarketDataError>;
    async fn get_commodities(&self) -> Result<Vec<CommodityRow>, MarketDataError>;
    async fn get_forex_pairs(&self) -> Result<Vec<ForexPairRow>, MarketDataError>;

    async fn get_quote(&self, symbol: &str) -> Result<QuoteRow, MarketDataError>;
}
