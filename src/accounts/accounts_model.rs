use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::accounts_errors::{AccountError, Result};

/// Account types, one per asset domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Brokerage,
    CryptoWallet,
    MetalStorage,
    RealEstate,
    Custom,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Brokerage => "brokerage",
            AccountType::CryptoWallet => "crypto_wallet",
            AccountType::MetalStorage => "metal_storage",
            AccountType::RealEstate => "real_estate",
            AccountType::Custom => "custom",
        }
    }
}

impl FromStr for AccountType {
    type Err = AccountError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "brokerage" => Ok(AccountType::Brokerage),
            "crypto_wallet" => Ok(AccountType::CryptoWallet),
            "metal_storage" => Ok(AccountType::MetalStorage),
            "real_estate" => Ok(AccountType::RealEstate),
            "custom" => Ok(AccountType::Custom),
            other => Err(AccountError::InvalidData(format!(
                "Unknown account type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an account's data is entered.
///
/// Self-managed accounts hold raw positions; managed accounts carry aggregate
/// analytics directly on the account row. The two feature sets are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    SelfManaged,
    Managed,
}

impl AccountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountMode::SelfManaged => "self_managed",
            AccountMode::Managed => "managed",
        }
    }
}

impl FromStr for AccountMode {
    type Err = AccountError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "self_managed" => Ok(AccountMode::SelfManaged),
            "managed" => Ok(AccountMode::Managed),
            other => Err(AccountError::InvalidData(format!(
                "Unknown account mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AccountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's sub-portfolio; the parent of accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    pub base_currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolio {
    pub id: Option<String>,
    pub name: String,
    pub base_currency: String,
}

/// Domain model representing an account in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_mode: AccountMode,
    pub currency: String,
    /// Managed-mode aggregate; always None for self-managed accounts.
    pub current_value: Option<Decimal>,
    pub invested_amount: Option<Decimal>,
    pub strategy: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub id: Option<String>,
    pub portfolio_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_mode: AccountMode,
    pub currency: String,
}

impl NewAccount {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Account name cannot be empty".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(AccountError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Managed-mode aggregate figures entered directly by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAggregates {
    pub current_value: Option<Decimal>,
    pub invested_amount: Option<Decimal>,
    pub strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioDB {
    pub id: String,
    pub name: String,
    pub base_currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<PortfolioDB> for Portfolio {
    fn from(db: PortfolioDB) -> Self {
        Portfolio {
            id: db.id,
            name: db.name,
            base_currency: db.base_currency,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewPortfolio> for PortfolioDB {
    fn from(domain: NewPortfolio) -> Self {
        let now = chrono::Utc::now().naive_utc();
        PortfolioDB {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: domain.name,
            base_currency: domain.base_currency,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub account_type: String,
    pub account_mode: String,
    pub currency: String,
    pub current_value: Option<String>,
    pub invested_amount: Option<String>,
    pub strategy: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Account {
            account_type: AccountType::from_str(&db.account_type).unwrap_or(AccountType::Custom),
            account_mode: AccountMode::from_str(&db.account_mode)
                .unwrap_or(AccountMode::SelfManaged),
            id: db.id,
            portfolio_id: db.portfolio_id,
            name: db.name,
            currency: db.currency,
            current_value: db.current_value.and_then(|v| Decimal::from_str(&v).ok()),
            invested_amount: db
                .invested_amount
                .and_then(|v| Decimal::from_str(&v).ok()),
            strategy: db.strategy,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        AccountDB {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            portfolio_id: domain.portfolio_id,
            name: domain.name,
            account_type: domain.account_type.as_str().to_string(),
            account_mode: domain.account_mode.as_str().to_string(),
            currency: domain.currency,
            current_value: None,
            invested_amount: None,
            strategy: None,
            created_at: now,
            updated_at: now,
        }
    }
}
