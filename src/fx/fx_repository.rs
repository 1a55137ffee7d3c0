use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{currencies, fx_rates};

use super::fx_errors::{FxError, Result};
use super::fx_model::{Currency, CurrencyDB, ExchangeRate, ExchangeRateDB};

/// Repository for currencies and exchange rates
pub struct FxRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl FxRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| FxError::MarketDataError(e.to_string()))
    }

    pub fn upsert_currency(&self, code: &str, name: Option<&str>) -> Result<bool> {
        let mut conn = self.conn()?;

        let existing = currencies::table
            .find(code)
            .first::<CurrencyDB>(&mut conn)
            .optional()?;

        match existing {
            Some(_) => {
                if name.is_some() {
                    diesel::update(currencies::table.find(code))
                        .set(currencies::name.eq(name))
                        .execute(&mut conn)?;
                }
                Ok(false)
            }
            None => {
                diesel::insert_into(currencies::table)
                    .values(CurrencyDB {
                        code: code.to_string(),
                        name: name.map(str::to_string),
                    })
                    .execute(&mut conn)?;
                Ok(true)
            }
        }
    }

    pub fn get_currency(&self, code: &str) -> Result<Option<Currency>> {
        let mut conn = self.conn()?;

        Ok(currencies::table
            .find(code)
            .first::<CurrencyDB>(&mut conn)
            .optional()?
            .map(Currency::from))
    }

    pub fn list_currencies(&self) -> Result<Vec<Currency>> {
        let mut conn = self.conn()?;

        let results = currencies::table
            .order(currencies::code.asc())
            .load::<CurrencyDB>(&mut conn)?;

        Ok(results.into_iter().map(Currency::from).collect())
    }

    pub fn get_rate(&self, from: &str, to: &str) -> Result<Option<ExchangeRate>> {
        let mut conn = self.conn()?;

        Ok(fx_rates::table
            .filter(fx_rates::from_currency.eq(from))
            .filter(fx_rates::to_currency.eq(to))
            .first::<ExchangeRateDB>(&mut conn)
            .optional()?
            .map(ExchangeRate::from))
    }

    pub fn list_rates(&self) -> Result<Vec<ExchangeRate>> {
        let mut conn = self.conn()?;

        let results = fx_rates::table.load::<ExchangeRateDB>(&mut conn)?;
        Ok(results.into_iter().map(ExchangeRate::from).collect())
    }

    pub fn upsert_rate(
        &self,
        from: &str,
        to: &str,
        rate: Decimal,
        source: &str,
    ) -> Result<ExchangeRate> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Rate for {}/{} must be positive, got {}",
                from, to, rate
            )));
        }

        let mut conn = self.conn()?;

        let row = ExchangeRateDB {
            id: uuid::Uuid::new_v4().to_string(),
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            rate: rate.to_string(),
            source: source.to_string(),
            updated_at: chrono::Utc::now().naive_utc(),
        };

        diesel::insert_into(fx_rates::table)
            .values(&row)
            .on_conflict((fx_rates::from_currency, fx_rates::to_currency))
            .do_update()
            .set((
                fx_rates::rate.eq(&row.rate),
                fx_rates::source.eq(&row.source),
                fx_rates::updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(fx_rates::table
            .filter(fx_rates::from_currency.eq(from))
            .filter(fx_rates::to_currency.eq(to))
            .first::<ExchangeRateDB>(&mut conn)
            .map(ExchangeRate::from)?)
    }
}
