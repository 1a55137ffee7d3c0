use log::{error, info};
use std::sync::Arc;

use crate::accounts::AccountRepository;
use crate::errors::Result;
use crate::holdings::{Holding, HoldingRepository};

use super::aggregation_service::AggregationService;
use super::analytics_model::{AnalyticResultDB, AnalyticRun};
use super::analytics_repository::AnalyticsRepository;

/// Evaluates an analytic across its active dimensions and materializes the
/// bucket rows.
///
/// Run lifecycle: PENDING -> RUNNING -> SUCCESS | FAILED. The run record
/// always reaches a terminal state; on failure the error message is recorded
/// and the original error re-raised to the caller.
pub struct AnalyticsEngine {
    repository: Arc<AnalyticsRepository>,
    aggregation: AggregationService,
    accounts: AccountRepository,
    holdings: HoldingRepository,
}

impl AnalyticsEngine {
    pub fn new(
        repository: Arc<AnalyticsRepository>,
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

    pub fn evaluate(&self, analytic_id: &str) -> Result<AnalyticRun> {
        let analytic = self.repository.get_analytic(analytic_id)?;
        let run = self.repository.create_pending_run(&analytic.id)?;
        self.repository.mark_running(&run.id)?;

        match self.evaluate_inner(&analytic.id, &analytic.portfolio_id, &analytic.value_identifier, &run.id) {
            Ok(row_count) => {
                self.repository.mark_success(&run.id)?;
                info!(
                    "Analytic '{}' run {} succeeded with {} rows",
                    analytic.name, run.id, row_count
                );
                self.repository.get_run(&run.id)
            }
            Err(e) => {
                error!("Analytic '{}' run {} failed: {}", analytic.name, run.id, e);
                self.repository.mark_failed(&run.id, &e.to_string())?;
                Err(e)
            }
        }
    }

    fn evaluate_inner(
        &self,
        analytic_id: &str,
        portfolio_id: &str,
        value_identifier: &str,
        run_id: &str,
    ) -> Result<usize> {
        let holdings = self.portfolio_holdings(portfolio_id)?;
        let dimensions = self.repository.list_active_dimensions(analytic_id)?;

        let mut rows: Vec<AnalyticResultDB> = Vec::new();
        for dimension in &dimensions {
            let buckets = self.aggregation.aggregate_dimension(
                value_identifier,
                dimension.dimension_type,
                &dimension.key,
                dimension.source_identifier.as_deref(),
                &holdings,
            )?;

            for (index, bucket) in buckets.into_iter().enumerate() {
                rows.push(AnalyticResultDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    run_id: run_id.to_string(),
                    dimension_id: dimension.id.clone(),
                    bucket_label: bucket.bucket_label,
                    total_value: bucket.total_value.to_string(),
                    percentage: bucket.percentage.to_string(),
                    holding_count: bucket.holding_count as i32,
                    display_order: index as i32,
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
