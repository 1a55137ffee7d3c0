use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{accounts, portfolios};

use super::accounts_errors::{AccountError, Result};
use super::accounts_model::{
    Account, AccountAggregates, AccountDB, AccountMode, AccountType, NewAccount, NewPortfolio,
    Portfolio, PortfolioDB,
};

/// Repository for managing portfolio and account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl AccountRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| AccountError::InvalidData(e.to_string()))
    }

    pub fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        let portfolio_db: PortfolioDB = new_portfolio.into();
        let mut conn = self.conn()?;

        let result = diesel::insert_into(portfolios::table)
            .values(&portfolio_db)
            .get_result::<PortfolioDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = self.conn()?;

        portfolios::table
            .find(portfolio_id)
            .first::<PortfolioDB>(&mut conn)
            .optional()?
            .map(Portfolio::from)
            .ok_or_else(|| AccountError::PortfolioNotFound(portfolio_id.to_string()))
    }

    pub fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;
        let account_db: AccountDB = new_account.into();

        let mut conn = self.conn()?;

        let result = diesel::insert_into(accounts::table)
            .values(&account_db)
            .get_result::<AccountDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = self.conn()?;

        accounts::table
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .optional()?
            .map(Account::from)
            .ok_or_else(|| AccountError::NotFound(account_id.to_string()))
    }

    pub fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Account>> {
        let mut conn = self.conn()?;

        let results = accounts::table
            .filter(accounts::portfolio_id.eq(portfolio_id))
            .load::<AccountDB>(&mut conn)?;

        Ok(results.into_iter().map(Account::from).collect())
    }

    /// Accounts bound to one schema, i.e. sharing its account type and mode.
    pub fn list_by_type_and_mode(
        &self,
        account_type: AccountType,
        account_mode: AccountMode,
    ) -> Result<Vec<Account>> {
        let mut conn = self.conn()?;

        let results = accounts::table
            .filter(accounts::account_type.eq(account_type.as_str()))
            .filter(accounts::account_mode.eq(account_mode.as_str()))
            .load::<AccountDB>(&mut conn)?;

        Ok(results.into_iter().map(Account::from).collect())
    }

    pub fn set_mode(&self, account_id: &str, mode: AccountMode) -> Result<Account> {
        let mut conn = self.conn()?;

        let result = diesel::update(accounts::table.find(account_id))
            .set((
                accounts::account_mode.eq(mode.as_str()),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .get_result::<AccountDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn set_aggregates(
        &self,
        account_id: &str,
        aggregates: &AccountAggregates,
    ) -> Result<Account> {
        let mut conn = self.conn()?;

        let result = diesel::update(accounts::table.find(account_id))
            .set((
                accounts::current_value.eq(aggregates.current_value.map(|v| v.to_string())),
                accounts::invested_amount.eq(aggregates.invested_amount.map(|v| v.to_string())),
                accounts::strategy.eq(aggregates.strategy.clone()),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .get_result::<AccountDB>(&mut conn)?;

        Ok(result.into())
    }

    /// Nulls out the managed-mode aggregate fields.
    pub fn reset_aggregates(&self, account_id: &str) -> Result<Account> {
        self.set_aggregates(
            account_id,
            &AccountAggregates {
                current_value: None,
                invested_amount: None,
                strategy: None,
            },
        )
    }

    pub fn delete(&self, account_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::delete(accounts::table.find(account_id)).execute(&mut conn)?;
        Ok(())
    }
}
