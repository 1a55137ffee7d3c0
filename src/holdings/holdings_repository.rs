use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{assets, holdings};

use super::holdings_errors::{HoldingError, Result};
use super::holdings_model::{Holding, HoldingDB, HoldingSource, NewHolding};

/// Repository for managing holdings in the database
pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl HoldingRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| HoldingError::InvalidData(e.to_string()))
    }

    pub fn create(&self, new_holding: NewHolding) -> Result<Holding> {
        new_holding.validate()?;
        let holding_db: HoldingDB = new_holding.into();

        let mut conn = self.conn()?;

        let result = diesel::insert_into(holdings::table)
            .values(&holding_db)
            .get_result::<HoldingDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_by_id(&self, holding_id: &str) -> Result<Holding> {
        let mut conn = self.conn()?;

        holdings::table
            .find(holding_id)
            .first::<HoldingDB>(&mut conn)
            .optional()?
            .map(Holding::from)
            .ok_or_else(|| HoldingError::NotFound(holding_id.to_string()))
    }

    pub fn list_by_account(&self, account_id: &str) -> Result<Vec<Holding>> {
        let mut conn = self.conn()?;

        let results = holdings::table
            .filter(holdings::account_id.eq(account_id))
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    pub fn list_by_accounts(&self, account_ids: &[String]) -> Result<Vec<Holding>> {
        let mut conn = self.conn()?;

        let results = holdings::table
            .filter(holdings::account_id.eq_any(account_ids))
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    pub fn list_by_asset(&self, asset_id: &str) -> Result<Vec<Holding>> {
        let mut conn = self.conn()?;

        let results = holdings::table
            .filter(holdings::asset_id.eq(asset_id))
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    /// Holdings whose asset is priced in the given currency.
    pub fn list_by_asset_currency(&self, currency: &str) -> Result<Vec<Holding>> {
        let mut conn = self.conn()?;

        let results = holdings::table
            .inner_join(assets::table)
            .filter(assets::currency.eq(currency))
            .select(holdings::all_columns)
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    /// All asset-backed holdings; the snapshot reconciliation set.
    pub fn list_asset_backed(&self) -> Result<Vec<Holding>> {
        let mut conn = self.conn()?;

        let results = holdings::table
            .filter(holdings::source.eq(HoldingSource::Asset.as_str()))
            .load::<HoldingDB>(&mut conn)?;

        Ok(results.into_iter().map(Holding::from).collect())
    }

    pub fn update_quantity(&self, holding_id: &str, quantity: Decimal) -> Result<Holding> {
        let mut conn = self.conn()?;

        let result = diesel::update(holdings::table.find(holding_id))
            .set((
                holdings::quantity.eq(quantity.to_string()),
                holdings::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .get_result::<HoldingDB>(&mut conn)?;

        Ok(result.into())
    }

    /// Points an asset-backed holding at a different asset row (snapshot
    /// relink).
    pub fn relink(&self, holding_id: &str, asset_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::update(holdings::table.find(holding_id))
            .set((
                holdings::asset_id.eq(asset_id),
                holdings::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    /// Converts a holding to custom after its symbol left the active
    /// universe.
    pub fn detach_to_custom(&self, holding_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::update(holdings::table.find(holding_id))
            .set((
                holdings::asset_id.eq(None::<String>),
                holdings::source.eq(HoldingSource::Custom.as_str()),
                holdings::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn delete(&self, holding_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::delete(holdings::table.find(holding_id)).execute(&mut conn)?;
        Ok(())
    }

    pub fn delete_by_account(&self, account_id: &str) -> Result<usize> {
        let mut conn = self.conn()?;

        Ok(
            diesel::delete(holdings::table.filter(holdings::account_id.eq(account_id)))
                .execute(&mut conn)?,
        )
    }
}
