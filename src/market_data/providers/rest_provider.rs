use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::constants::PROVIDER_TIMEOUT_SECS;
use crate::market_data::MarketDataError;

use super::market_data_provider::MarketDataProvider;
use super::models::{CommodityRow, CryptoRow, EquityRow, ForexPairRow, QuoteRow};

/// JSON REST implementation of [`MarketDataProvider`].
///
/// Status mapping: 429 → RateLimited, 5xx → ProviderUnavailable, any other
/// non-2xx or an unparseable body → InvalidResponse. Network errors and
/// timeouts fail closed as ProviderUnavailable.
pub struct RestProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestProvider {
    pub fn new(base_url: String, api_key: String) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .map_err(|e| MarketDataError::ProviderUnavailable(e.to_string()))?;

        Ok(RestProvider {
            client,
            base_url,
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MarketDataError> {
        let url = format!("{}/{}?apikey={}", self.base_url, path, self.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if status.is_server_error() {
            return Err(MarketDataError::ProviderUnavailable(format!(
                "Provider server error ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(MarketDataError::InvalidResponse(format!(
                "Unexpected client error ({})",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, MarketDataError> {
        let rows: Vec<T> = self.get_json(path).await?;
        if rows.is_empty() {
            return Err(MarketDataError::EmptyResult(path.to_string()));
        }
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataProvider for RestProvider {
    fn name(&self) -> &'static str {
        "REST"
    }

    async fn get_equities(&self) -> Result<Vec<EquityRow>, MarketDataError> {
        self.get_list("stock/list").await
    }

    async fn get_cryptocurrencies(&self) -> Result<Vec<CryptoRow>, MarketDataError> {
        self.get_list("crypto/list").await
    }

    async fn get_commodities(&self) -> Result<Vec<CommodityRow>, MarketDataError> {
        self.get_list("commodity/list").await
    }

    async fn get_forex_pairs(&self) -> Result<Vec<ForexPairRow>, MarketDataError> {
        self.get_list("forex/list").await
    }

    async fn get_quote(&self, symbol: &str) -> Result<QuoteRow, MarketDataError> {
        let rows: Vec<QuoteRow> = self
            .get_json(&format!("quote-short/{}", symbol))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| MarketDataError::EmptyResult(symbol.to_string()))
    }
}
