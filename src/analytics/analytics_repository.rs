use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::{Error, Result, ValidationError};
use crate::schema::{
    analytic_dimensions, analytic_results, analytic_runs, analytics, asset_dimension_exposures,
    holding_dimension_overrides,
};

use super::analytics_model::{
    Analytic, AnalyticDB, AnalyticDimension, AnalyticDimensionDB, AnalyticResult, AnalyticResultDB,
    AnalyticRun, AnalyticRunDB, AssetExposure, AssetExposureDB, DimensionType,
    HoldingExposureOverride, HoldingExposureOverrideDB, RunStatus,
};

/// Repository for analytics, runs, results and exposure weights
pub struct AnalyticsRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl AnalyticsRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    pub fn create_analytic(
        &self,
        portfolio_id: &str,
        name: &str,
        value_identifier: &str,
    ) -> Result<Analytic> {
        let mut conn = get_connection(&self.pool)?;

        let row = AnalyticDB {
            id: uuid::Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            name: name.to_string(),
            value_identifier: value_identifier.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let result = diesel::insert_into(analytics::table)
            .values(&row)
            .get_result::<AnalyticDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_analytic(&self, analytic_id: &str) -> Result<Analytic> {
        let mut conn = get_connection(&self.pool)?;

        analytics::table
            .find(analytic_id)
            .first::<AnalyticDB>(&mut conn)
            .optional()?
            .map(Analytic::from)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Analytic '{}' not found",
                    analytic_id
                )))
            })
    }

    pub fn add_dimension(
        &self,
        analytic_id: &str,
        key: &str,
        name: &str,
        dimension_type: DimensionType,
        source_identifier: Option<&str>,
    ) -> Result<AnalyticDimension> {
        let mut conn = get_connection(&self.pool)?;

        let row = AnalyticDimensionDB {
            id: uuid::Uuid::new_v4().to_string(),
            analytic_id: analytic_id.to_string(),
            key: key.to_string(),
            name: name.to_string(),
            dimension_type: dimension_type.as_str().to_string(),
            source_identifier: source_identifier.map(str::to_string),
            is_active: true,
        };

        let result = diesel::insert_into(analytic_dimensions::table)
            .values(&row)
            .get_result::<AnalyticDimensionDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn list_active_dimensions(&self, analytic_id: &str) -> Result<Vec<AnalyticDimension>> {
        let mut conn = get_connection(&self.pool)?;

        let results = analytic_dimensions::table
            .filter(analytic_dimensions::analytic_id.eq(analytic_id))
            .filter(analytic_dimensions::is_active.eq(true))
            .load::<AnalyticDimensionDB>(&mut conn)?;

        Ok(results.into_iter().map(AnalyticDimension::from).collect())
    }

    // ------------------------------------------------------------------
    // Run lifecycle
    // ------------------------------------------------------------------

    pub fn create_pending_run(&self, analytic_id: &str) -> Result<AnalyticRun> {
        let mut conn = get_connection(&self.pool)?;

        let row = AnalyticRunDB {
            id: uuid::Uuid::new_v4().to_string(),
            analytic_id: analytic_id.to_string(),
            status: RunStatus::Pending.as_str().to_string(),
            started_at: None,
            finished_at: None,
            error_message: None,
            created_at: chrono::Utc::now().naive_utc(),
        };

        let result = diesel::insert_into(analytic_runs::table)
            .values(&row)
            .get_result::<AnalyticRunDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn mark_running(&self, run_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(analytic_runs::table.find(run_id))
            .set((
                analytic_runs::status.eq(RunStatus::Running.as_str()),
                analytic_runs::started_at.eq(Some(chrono::Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn mark_success(&self, run_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(analytic_runs::table.find(run_id))
            .set((
                analytic_runs::status.eq(RunStatus::Success.as_str()),
                analytic_runs::finished_at.eq(Some(chrono::Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn mark_failed(&self, run_id: &str, error_message: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(analytic_runs::table.find(run_id))
            .set((
                analytic_runs::status.eq(RunStatus::Failed.as_str()),
                analytic_runs::finished_at.eq(Some(chrono::Utc::now().naive_utc())),
                analytic_runs::error_message.eq(Some(error_message.to_string())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> Result<AnalyticRun> {
        let mut conn = get_connection(&self.pool)?;

        analytic_runs::table
            .find(run_id)
            .first::<AnalyticRunDB>(&mut conn)
            .optional()?
            .map(AnalyticRun::from)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Run '{}' not found",
                    run_id
                )))
            })
    }

    /// Replaces a run's result rows. Delete-then-bulk-insert inside one
    /// transaction; results are never incrementally patched.
    pub fn replace_results(&self, run_id: &str, rows: Vec<AnalyticResultDB>) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(analytic_results::table.filter(analytic_results::run_id.eq(run_id)))
                .execute(conn)?;
            if !rows.is_empty() {
                diesel::insert_into(analytic_results::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    pub fn list_results(&self, run_id: &str) -> Result<Vec<AnalyticResult>> {
        let mut conn = get_connection(&self.pool)?;

        let results = analytic_results::table
            .filter(analytic_results::run_id.eq(run_id))
            .order(analytic_results::display_order.asc())
            .load::<AnalyticResultDB>(&mut conn)?;

        Ok(results.into_iter().map(AnalyticResult::from).collect())
    }

    // ------------------------------------------------------------------
    // Exposures
    // ------------------------------------------------------------------

    pub fn set_asset_exposure(
        &self,
        asset_id: &str,
        dimension_key: &str,
        bucket_label: &str,
        weight: Decimal,
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let row = AssetExposureDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            dimension_key: dimension_key.to_string(),
            bucket_label: bucket_label.to_string(),
            weight: weight.to_string(),
        };

        diesel::insert_into(asset_dimension_exposures::table)
            .values(&row)
            .on_conflict((
                asset_dimension_exposures::asset_id,
                asset_dimension_exposures::dimension_key,
                asset_dimension_exposures::bucket_label,
            ))
            .do_update()
            .set(asset_dimension_exposures::weight.eq(&row.weight))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn list_asset_exposures(
        &self,
        asset_id: &str,
        dimension_key: &str,
    ) -> Result<Vec<AssetExposure>> {
        let mut conn = get_connection(&self.pool)?;

        let results = asset_dimension_exposures::table
            .filter(asset_dimension_exposures::asset_id.eq(asset_id))
            .filter(asset_dimension_exposures::dimension_key.eq(dimension_key))
            .load::<AssetExposureDB>(&mut conn)?;

        Ok(results.into_iter().map(AssetExposure::from).collect())
    }

    pub fn set_holding_override(
        &self,
        holding_id: &str,
        dimension_key: &str,
        bucket_label: &str,
        weight: Decimal,
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let row = HoldingExposureOverrideDB {
            id: uuid::Uuid::new_v4().to_string(),
            holding_id: holding_id.to_string(),
            dimension_key: dimension_key.to_string(),
            bucket_label: bucket_label.to_string(),
            weight: weight.to_string(),
        };

        diesel::insert_into(holding_dimension_overrides::table)
            .values(&row)
            .on_conflict((
                holding_dimension_overrides::holding_id,
                holding_dimension_overrides::dimension_key,
                holding_dimension_overrides::bucket_label,
            ))
            .do_update()
            .set(holding_dimension_overrides::weight.eq(&row.weight))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn list_holding_overrides(
        &self,
        holding_id: &str,
        dimension_key: &str,
    ) -> Result<Vec<HoldingExposureOverride>> {
        let mut conn = get_connection(&self.pool)?;

        let results = holding_dimension_overrides::table
            .filter(holding_dimension_overrides::holding_id.eq(holding_id))
            .filter(holding_dimension_overrides::dimension_key.eq(dimension_key))
            .load::<HoldingExposureOverrideDB>(&mut conn)?;

        Ok(results
            .into_iter()
            .map(HoldingExposureOverride::from)
            .collect())
    }
}
