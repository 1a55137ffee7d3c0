use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A known currency, seeded from the provider's forex universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub name: Option<String>,
}

/// Latest exchange rate for one currency pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl ExchangeRate {
    pub fn make_fx_symbol(from: &str, to: &str) -> String {
        format!("{}{}", from, to)
    }
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::currencies)]
#[diesel(primary_key(code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrencyDB {
    pub code: String,
    pub name: Option<String>,
}

impl From<CurrencyDB> for Currency {
    fn from(db: CurrencyDB) -> Self {
        Currency {
            code: db.code,
            name: db.name,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::fx_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExchangeRateDB {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: String,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<ExchangeRateDB> for ExchangeRate {
    fn from(db: ExchangeRateDB) -> Self {
        ExchangeRate {
            id: db.id,
            from_currency: db.from_currency,
            to_currency: db.to_currency,
            rate: Decimal::from_str(&db.rate).unwrap_or(Decimal::ZERO),
            source: db.source,
            updated_at: db.updated_at,
        }
    }
}
