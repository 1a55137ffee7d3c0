use log::error;
use std::sync::Arc;

use crate::accounts::AccountRepository;
use crate::holdings::{Holding, HoldingRepository};

use super::column_resolver::ColumnValueResolver;
use super::schemas_model::Schema;

/// Central recomputation orchestrator.
///
/// Every domain mutation that can affect materialized column values routes
/// through one of these entry points, which expand the event to the precise
/// set of affected holdings and re-resolve each of them. Holdings are
/// independent units: a failure on one is logged and never aborts the rest
/// of the batch.
pub struct RecalcService {
    resolver: Arc<ColumnValueResolver>,
    holdings: HoldingRepository,
    accounts: AccountRepository,
}

impl RecalcService {
    pub fn new(
        resolver: Arc<ColumnValueResolver>,
        holdings: HoldingRepository,
        accounts: AccountRepository,
    ) -> Self {
        Self {
            resolver,
            holdings,
            accounts,
        }
    }

    pub fn holding_changed(&self, holding: &Holding) {
        if let Err(e) = self.resolver.resolve(holding) {
            error!("Recalculation failed for holding {}: {}", holding.id, e);
        }
    }

    pub fn holdings_changed(&self, holdings: &[Holding]) {
        for holding in holdings {
            self.holding_changed(holding);
        }
    }

    /// Recomputes every holding referencing the asset (price or metadata
    /// change).
    pub fn asset_changed(&self, asset_id: &str) {
        match self.holdings.list_by_asset(asset_id) {
            Ok(holdings) => self.holdings_changed(&holdings),
            Err(e) => error!("Failed to load holdings for asset {}: {}", asset_id, e),
        }
    }

    /// Recomputes holdings affected by an exchange-rate change. The caller
    /// supplies the affected set, computed after the rate write committed.
    pub fn fx_changed(&self, holdings: &[Holding]) {
        self.holdings_changed(holdings);
    }

    /// Recomputes every holding under every account bound to the schema.
    pub fn schema_changed(&self, schema: &Schema) {
        let accounts = match self
            .accounts
            .list_by_type_and_mode(schema.account_type, schema.account_mode)
        {
            Ok(accounts) => accounts,
            Err(e) => {
                error!("Failed to load accounts for schema {}: {}", schema.id, e);
                return;
            }
        };

        for account in accounts {
            match self.holdings.list_by_account(&account.id) {
                Ok(holdings) => self.holdings_changed(&holdings),
                Err(e) => error!(
                    "Failed to load holdings for account {}: {}",
                    account.id, e
                ),
            }
        }
    }
}
