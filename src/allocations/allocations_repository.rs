use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::analytics::{DimensionType, RunStatus};
use crate::db::get_connection;
use crate::errors::{Error, Result, ValidationError};
use crate::schema::{
    allocation_dimensions, allocation_gap_results, allocation_runs, allocation_scenarios,
    allocation_targets,
};

use super::allocations_model::{
    AllocationDimension, AllocationDimensionDB, AllocationGapResult, AllocationGapResultDB,
    AllocationRun, AllocationRunDB, AllocationScenario, AllocationScenarioDB, AllocationTarget,
    AllocationTargetDB,
};

/// Repository for allocation scenarios, targets, runs and gap results
pub struct AllocationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl AllocationRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    pub fn create_scenario(
        &self,
        portfolio_id: &str,
        name: &str,
        value_identifier: &str,
    ) -> Result<AllocationScenario> {
        let mut conn = get_connection(&self.pool)?;

        let row = AllocationScenarioDB {
            id: uuid::Uuid::new_v4().to_string(),
            portfolio_id: portfolio_id.to_string(),
            name: name.to_string(),
            value_identifier: value_identifier.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let result = diesel::insert_into(allocation_scenarios::table)
            .values(&row)
            .get_result::<AllocationScenarioDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_scenario(&self, scenario_id: &str) -> Result<AllocationScenario> {
        let mut conn = get_connection(&self.pool)?;

        allocation_scenarios::table
            .find(scenario_id)
            .first::<AllocationScenarioDB>(&mut conn)
            .optional()?
            .map(AllocationScenario::from)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Allocation scenario '{}' not found",
                    scenario_id
                )))
            })
    }

    pub fn add_dimension(
        &self,
        scenario_id: &str,
        key: &str,
        name: &str,
        dimension_type: DimensionType,
    ) -> Result<AllocationDimension> {
        let mut conn = get_connection(&self.pool)?;

        let row = AllocationDimensionDB {
            id: uuid::Uuid::new_v4().to_string(),
            scenario_id: scenario_id.to_string(),
            key: key.to_string(),
            name: name.to_string(),
            dimension_type: dimension_type.as_str().to_string(),
            is_active: true,
        };

        let result = diesel::insert_into(allocation_dimensions::table)
            .values(&row)
            .get_result::<AllocationDimensionDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn list_active_dimensions(&self, scenario_id: &str) -> Result<Vec<AllocationDimension>> {
        let mut conn = get_connection(&self.pool)?;

        let results = allocation_dimensions::table
            .filter(allocation_dimensions::scenario_id.eq(scenario_id))
            .filter(allocation_dimensions::is_active.eq(true))
            .load::<AllocationDimensionDB>(&mut conn)?;

        Ok(results.into_iter().map(AllocationDimension::from).collect())
    }

    pub fn add_target(
        &self,
        dimension_id: &str,
        label: &str,
        target_percent: Decimal,
        target_value: Option<Decimal>,
    ) -> Result<AllocationTarget> {
        let mut conn = get_connection(&self.pool)?;

        let row = AllocationTargetDB {
            id: uuid::Uuid::new_v4().to_string(),
            dimension_id: dimension_id.to_string(),
            label: label.to_string(),
            target_percent: target_percent.to_string(),
            target_value: target_value.map(|v| v.to_string()),
            is_active: true,
        };

        let result = diesel::insert_into(allocation_targets::table)
            .values(&row)
            .get_result::<AllocationTargetDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn list_active_targets(&self, dimension_id: &str) -> Result<Vec<AllocationTarget>> {
        let mut conn = get_connection(&self.pool)?;

        let results = allocation_targets::table
            .filter(allocation_targets::dimension_id.eq(dimension_id))
            .filter(allocation_targets::is_active.eq(true))
            .load::<AllocationTargetDB>(&mut conn)?;

        Ok(results.into_iter().map(AllocationTarget::from).collect())
    }

    // ------------------------------------------------------------------
    // Run lifecycle
    // ------------------------------------------------------------------

    pub fn create_pending_run(&self, scenario_id: &str) -> Result<AllocationRun> {
        let mut conn = get_connection(&self.pool)?;

        let row = AllocationRunDB {
            id: uuid::Uuid::new_v4().to_string(),
            scenario_id: scenario_id.to_string(),
            status: RunStatus::Pending.as_str().to_string(),
            started_at: None,
            finished_at: None,
            error_message: None,
            created_at: chrono::Utc::now().naive_utc(),
        };

        let result = diesel::insert_into(allocation_runs::table)
            .values(&row)
            .get_result::<AllocationRunDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn mark_running(&self, run_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(allocation_runs::table.find(run_id))
            .set((
                allocation_runs::status.eq(RunStatus::Running.as_str()),
                allocation_runs::started_at.eq(Some(chrono::Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn mark_success(&self, run_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(allocation_runs::table.find(run_id))
            .set((
                allocation_runs::status.eq(RunStatus::Success.as_str()),
                allocation_runs::finished_at.eq(Some(chrono::Utc::now().naive_utc())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn mark_failed(&self, run_id: &str, error_message: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(allocation_runs::table.find(run_id))
            .set((
                allocation_runs::status.eq(RunStatus::Failed.as_str()),
                allocation_runs::finished_at.eq(Some(chrono::Utc::now().naive_utc())),
                allocation_runs::error_message.eq(Some(error_message.to_string())),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> Result<AllocationRun> {
        let mut conn = get_connection(&self.pool)?;

        allocation_runs::table
            .find(run_id)
            .first::<AllocationRunDB>(&mut conn)
            .optional()?
            .map(AllocationRun::from)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Run '{}' not found",
                    run_id
                )))
            })
    }

    /// Replaces a run's gap results. Delete-then-bulk-insert inside one
    /// transaction; results are never incrementally patched.
    pub fn replace_results(&self, run_id: &str, rows: Vec<AllocationGapResultDB>) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(
                allocation_gap_results::table.filter(allocation_gap_results::run_id.eq(run_id)),
            )
            .execute(conn)?;
            if !rows.is_empty() {
                diesel::insert_into(allocation_gap_results::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    pub fn list_results(&self, run_id: &str) -> Result<Vec<AllocationGapResult>> {
        let mut conn = get_connection(&self.pool)?;

        let results = allocation_gap_results::table
            .filter(allocation_gap_results::run_id.eq(run_id))
            .load::<AllocationGapResultDB>(&mut conn)?;

        Ok(results.into_iter().map(AllocationGapResult::from).collect())
    }
}
