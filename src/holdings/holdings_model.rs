use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::holdings_errors::{HoldingError, Result};

/// Where a holding's reference data comes from.
///
/// Asset-backed holdings track a pipeline-seeded asset and are relinked on
/// every snapshot swap; custom holdings are user-managed and never
/// auto-relinked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingSource {
    Asset,
    Custom,
}

impl HoldingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingSource::Asset => "asset",
            HoldingSource::Custom => "custom",
        }
    }
}

impl FromStr for HoldingSource {
    type Err = HoldingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asset" => Ok(HoldingSource::Asset),
            "custom" => Ok(HoldingSource::Custom),
            other => Err(HoldingError::InvalidData(format!(
                "Unknown holding source '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for HoldingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in one account: an asset reference plus a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub account_id: String,
    pub asset_id: Option<String>,
    pub source: HoldingSource,
    pub original_symbol: Option<String>,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new holding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    pub id: Option<String>,
    pub account_id: String,
    pub asset_id: Option<String>,
    pub source: HoldingSource,
    pub original_symbol: Option<String>,
    pub quantity: Decimal,
    pub purchase_price: Option<Decimal>,
}

impl NewHolding {
    pub fn validate(&self) -> Result<()> {
        if self.quantity < Decimal::ZERO {
            return Err(HoldingError::InvalidData(
                "Quantity cannot be negative".to_string(),
            ));
        }
        if self.source == HoldingSource::Asset && self.asset_id.is_none() {
            return Err(HoldingError::InvalidData(
                "Asset-backed holdings require an asset".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for holdings
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub account_id: String,
    pub asset_id: Option<String>,
    pub source: String,
    pub original_symbol: Option<String>,
    pub quantity: String,
    pub purchase_price: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Holding {
            source: HoldingSource::from_str(&db.source).unwrap_or(HoldingSource::Custom),
            id: db.id,
            account_id: db.account_id,
            asset_id: db.asset_id,
            original_symbol: db.original_symbol,
            quantity: Decimal::from_str(&db.quantity).unwrap_or(Decimal::ZERO),
            purchase_price: db
                .purchase_price
                .and_then(|p| Decimal::from_str(&p).ok()),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewHolding> for HoldingDB {
    fn from(domain: NewHolding) -> Self {
        let now = chrono::Utc::now().naive_utc();
        HoldingDB {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            account_id: domain.account_id,
            asset_id: domain.asset_id,
            source: domain.source.as_str().to_string(),
            original_symbol: domain.original_symbol,
            quantity: domain.quantity.to_string(),
            purchase_price: domain.purchase_price.map(|p| p.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}
