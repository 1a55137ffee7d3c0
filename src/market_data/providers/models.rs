use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw universe row for a listed equity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EquityRow {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub isin: Option<String>,
}

/// Raw universe row for a crypto trading pair (e.g. "BTCUSD").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CryptoRow {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
}

/// Raw universe row for a commodity contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommodityRow {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub unit: Option<String>,
}

/// Raw row describing one forex pair in the provider's universe.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ForexPairRow {
    pub from_currency: Option<String>,
    pub from_name: Option<String>,
    pub to_currency: Option<String>,
    pub to_name: Option<String>,
}

/// Short-form quote for a single symbol.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRow {
    pub symbol: Option<String>,
    pub price: Option<Decimal>,
    pub change: Option<Decimal>,
    pub volume: Option<Decimal>,
}
