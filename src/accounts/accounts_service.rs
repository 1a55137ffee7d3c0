use log::info;
use std::sync::Arc;

use crate::holdings::HoldingRepository;
use crate::schemas::SchemaService;

use super::accounts_errors::{AccountError, Result};
use super::accounts_model::{Account, AccountAggregates, AccountMode, NewAccount, NewPortfolio, Portfolio};
use super::accounts_repository::AccountRepository;

/// Service for managing accounts and their mode lifecycle.
pub struct AccountService {
    repository: AccountRepository,
    holdings: HoldingRepository,
    schemas: Arc<SchemaService>,
}

impl AccountService {
    pub fn new(
        repository: AccountRepository,
        holdings: HoldingRepository,
        schemas: Arc<SchemaService>,
    ) -> Self {
        Self {
            repository,
            holdings,
            schemas,
        }
    }

    pub fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        self.repository.create_portfolio(new_portfolio)
    }

    pub fn get_account(&self, account_id: &str) -> Result<Account> {
        self.repository.get_by_id(account_id)
    }

    /// Creates an account and initializes its column visibility against the
    /// active schema for its type and mode.
    pub fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let schema = self
            .schemas
            .ensure_default_schema(new_account.account_type, new_account.account_mode)
            .map_err(|e| AccountError::InvalidData(e.to_string()))?;

        let account = self.repository.create(new_account)?;

        self.schemas
            .init_visibility(&account.id, &schema.id)
            .map_err(|e| AccountError::InvalidData(e.to_string()))?;

        Ok(account)
    }

    /// Records managed-mode aggregates. Rejected for self-managed accounts,
    /// whose value is derived from holdings.
    pub fn set_aggregates(
        &self,
        account_id: &str,
        aggregates: AccountAggregates,
    ) -> Result<Account> {
        let account = self.repository.get_by_id(account_id)?;
        if account.account_mode != AccountMode::Managed {
            return Err(AccountError::InvalidData(
                "Aggregates can only be set on managed accounts".to_string(),
            ));
        }
        self.repository.set_aggregates(account_id, &aggregates)
    }

    /// Switches an account between self-managed and managed mode.
    ///
    /// This is destructive by design, never a merge:
    /// - to managed: the account's holdings are deleted (refused without
    ///   `force` while holdings exist);
    /// - to self-managed: computed column values are deleted and the
    ///   aggregate fields reset to null.
    ///
    /// Both directions re-initialize column visibility for the new active
    /// schema.
    pub fn switch_account_mode(
        &self,
        account_id: &str,
        new_mode: AccountMode,
        force: bool,
    ) -> Result<Account> {
        let account = self.repository.get_by_id(account_id)?;

        if account.account_mode == new_mode {
            return Err(AccountError::ModeSwitchBlocked(format!(
                "Account '{}' is already {}",
                account.name, new_mode
            )));
        }

        match new_mode {
            AccountMode::Managed => {
                let holdings = self
                    .holdings
                    .list_by_account(account_id)
                    .map_err(|e| AccountError::InvalidData(e.to_string()))?;

                if !holdings.is_empty() {
                    if !force {
                        return Err(AccountError::ModeSwitchBlocked(format!(
                            "Account '{}' still has {} holdings; pass force to discard them",
                            account.name,
                            holdings.len()
                        )));
                    }
                    let deleted = self
                        .holdings
                        .delete_by_account(account_id)
                        .map_err(|e| AccountError::InvalidData(e.to_string()))?;
                    info!(
                        "Discarded {} holdings switching account {} to managed",
                        deleted, account_id
                    );
                }
            }
            AccountMode::SelfManaged => {
                let holdings = self
                    .holdings
                    .list_by_account(account_id)
                    .map_err(|e| AccountError::InvalidData(e.to_string()))?;
                let holding_ids: Vec<String> = holdings.into_iter().map(|h| h.id).collect();

                self.schemas
                    .delete_computed_values(&holding_ids)
                    .map_err(|e| AccountError::InvalidData(e.to_string()))?;
                self.repository.reset_aggregates(account_id)?;
            }
        }

        let updated = self.repository.set_mode(account_id, new_mode)?;

        let schema = self
            .schemas
            .ensure_default_schema(updated.account_type, new_mode)
            .map_err(|e| AccountError::InvalidData(e.to_string()))?;
        self.schemas
            .init_visibility(&updated.id, &schema.id)
            .map_err(|e| AccountError::InvalidData(e.to_string()))?;

        Ok(updated)
    }
}
