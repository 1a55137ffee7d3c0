use log::{error, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::accounts::AccountRepository;
use crate::analytics::AggregationService;
use crate::errors::Result;
use crate::holdings::{Holding, HoldingRepository};

use super::allocations_model::{AllocationGapResultDB, AllocationRun};
use super::allocations_repository::AllocationRepository;

/// Evaluates an allocation scenario: actual allocation per dimension bucket
/// versus the configured targets.
///
/// Run lifecycle: PENDING -> RUNNING -> SUCCESS | FAILED. The run record
/// always reaches a terminal state even when the aggregation body throws; on
/// failure the error is recorded and the original error re-raised.
pub struct AllocationEngine {
    repository: Arc<AllocationRepository>,
    aggregation: AggregationService,
    accounts: AccountRepository,
    holdings: HoldingRepository,
}

impl AllocationEngine {
    pub fn new(
        repository: Arc<AllocationRepository>,
        aggregation: AggregationService,
        accounts: AccountRepository,
        holdings: HoldingRepository,
    ) -> Self {
        Self {
            repository,
            aggregation,
            accounts,
            holdings,
        }
    }

    pub fn evaluate(&self, scenario_id: &str) -> Result<AllocationRun> {
        let scenario = self.repository.get_scenario(scenario_id)?;
        let run = self.repository.create_pending_run(&scenario.id)?;
        self.repository.mark_running(&run.id)?;

        match self.evaluate_inner(&scenario.id, &scenario.portfolio_id, &scenario.value_identifier, &run.id) {
            Ok(row_count) => {
                self.repository.mark_success(&run.id)?;
                info!(
                    "Allocation scenario '{}' run {} succeeded with {} rows",
                    scenario.name, run.id, row_count
                );
                self.repository.get_run(&run.id)
            }
            Err(e) => {
                error!(
                    "Allocation scenario '{}' run {} failed: {}",
                    scenario.name, run.id, e
                );
                self.repository.mark_failed(&run.id, &e.to_string())?;
                Err(e)
            }
        }
    }

    fn evaluate_inner(
        &self,
        scenario_id: &str,
        portfolio_id: &str,
        value_identifier: &str,
        run_id: &str,
    ) -> Result<usize> {
        let holdings = self.portfolio_holdings(portfolio_id)?;
        let dimensions = self.repository.list_active_dimensions(scenario_id)?;

        let hundred = Decimal::from(100);
        let mut rows: Vec<AllocationGapResultDB> = Vec::new();

        for dimension in &dimensions {
            let buckets = self.aggregation.aggregate_dimension(
                value_identifier,
                dimension.dimension_type,
                &dimension.key,
                None,
                &holdings,
            )?;
            let grand_total: Decimal = buckets.iter().map(|b| b.total_value).sum();

            for target in self.repository.list_active_targets(&dimension.id)? {
                let bucket = buckets.iter().find(|b| b.bucket_label == target.label);

                let actual_value = bucket.map(|b| b.total_value).unwrap_or(Decimal::ZERO);
                let actual_percent = if grand_total > Decimal::ZERO {
                    actual_value / grand_total * hundred
                } else {
                    Decimal::ZERO
                };
                let target_value = target.target_value.unwrap_or(Decimal::ZERO);
                let target_percent = target.target_percent;

                rows.push(AllocationGapResultDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    run_id: run_id.to_string(),
                    dimension_id: dimension.id.clone(),
                    target_id: target.id.clone(),
                    // Snapshot the label so later renames do not rewrite
                    // history.
                    target_label: target.label.clone(),
                    actual_value: actual_value.to_string(),
                    target_value: target_value.to_string(),
                    gap_value: (target_value - actual_value).to_string(),
                    actual_percent: actual_percent.to_string(),
                    target_percent: target_percent.to_string(),
                    gap_percent: (target_percent - actual_percent).to_string(),
                    holding_count: bucket.map(|b| b.holding_count as i32).unwrap_or(0),
                });
            }
        }

        let row_count = rows.len();
        self.repository.replace_results(run_id, rows)?;
        Ok(row_count)
    }

    fn portfolio_holdings(&self, portfolio_id: &str) -> Result<Vec<Holding>> {
        let accounts = self.accounts.list_by_portfolio(portfolio_id)?;
        let account_ids: Vec<String> = accounts.into_iter().map(|a| a.id).collect();
        Ok(self.holdings.list_by_accounts(&account_ids)?)
    }
}
