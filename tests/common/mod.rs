#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use folio_core::accounts::{
    AccountMode, AccountRepository, AccountService, AccountType, NewAccount, NewPortfolio,
};
use folio_core::db::{self, DbPool};
use folio_core::holdings::{HoldingRepository, HoldingSource, NewHolding};
use folio_core::market_data::providers::models::{
    CommodityRow, CryptoRow, EquityRow, ForexPairRow, QuoteRow,
};
use folio_core::market_data::{MarketDataError, MarketDataProvider};
use folio_core::schemas::{ColumnValueResolver, RecalcService, SchemaService};

/// On-disk SQLite fixture; the directory lives as long as the struct.
pub struct TestDb {
    pub pool: Arc<DbPool>,
    _dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir.path().join("test.db");
    let db_path = db_path.to_str().expect("utf-8 path");

    db::init(db_path).expect("init database");
    let pool = db::create_pool(db_path).expect("create pool");
    db::run_migrations(&pool).expect("run migrations");

    TestDb { pool, _dir: dir }
}

/// The service graph under test, wired the way an embedding caller would.
pub struct Services {
    pub schema_service: Arc<SchemaService>,
    pub account_service: AccountService,
    pub resolver: Arc<ColumnValueResolver>,
    pub recalc: Arc<RecalcService>,
}

pub fn build_services(pool: &Arc<DbPool>) -> Services {
    let schema_service = Arc::new(SchemaService::new(pool.clone()));
    let resolver = Arc::new(ColumnValueResolver::new(pool.clone()));
    let recalc = Arc::new(RecalcService::new(
        resolver.clone(),
        HoldingRepository::new(pool.clone()),
        AccountRepository::new(pool.clone()),
    ));
    let account_service = AccountService::new(
        AccountRepository::new(pool.clone()),
        HoldingRepository::new(pool.clone()),
        schema_service.clone(),
    );

    Services {
        schema_service,
        account_service,
        resolver,
        recalc,
    }
}

/// Creates a portfolio with one account and returns (portfolio_id,
/// account_id).
pub fn seed_account(
    services: &Services,
    account_type: AccountType,
    account_mode: AccountMode,
) -> (String, String) {
    let portfolio = services
        .account_service
        .create_portfolio(NewPortfolio {
            id: None,
            name: "Main".to_string(),
            base_currency: "USD".to_string(),
        })
        .expect("create portfolio");

    let account = services
        .account_service
        .create_account(NewAccount {
            id: None,
            portfolio_id: portfolio.id.clone(),
            name: "Test account".to_string(),
            account_type,
            account_mode,
            currency: "USD".to_string(),
        })
        .expect("create account");

    (portfolio.id, account.id)
}

pub fn add_holding(
    pool: &Arc<DbPool>,
    account_id: &str,
    asset_id: Option<&str>,
    symbol: Option<&str>,
    quantity: Decimal,
    purchase_price: Option<Decimal>,
) -> folio_core::holdings::Holding {
    HoldingRepository::new(pool.clone())
        .create(NewHolding {
            id: None,
            account_id: account_id.to_string(),
            asset_id: asset_id.map(str::to_string),
            source: if asset_id.is_some() {
                HoldingSource::Asset
            } else {
                HoldingSource::Custom
            },
            original_symbol: symbol.map(str::to_string),
            quantity,
            purchase_price,
        })
        .expect("create holding")
}

/// Hand-rolled provider mock; returns canned universes and quotes.
#[derive(Default)]
pub struct MockProvider {
    pub equities: Vec<EquityRow>,
    pub cryptos: Vec<CryptoRow>,
    pub commodities: Vec<CommodityRow>,
    pub forex: Vec<ForexPairRow>,
    pub quotes: HashMap<String, Decimal>,
    pub unavailable: bool,
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn name(&self) -> &'static str {
        "MOCK"
    }

    async fn get_equities(&self) -> Result<Vec<EquityRow>, MarketDataError> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable("mock outage".into()));
        }
        Ok(self.equities.clone())
    }

    async fn get_cryptocurrencies(&self) -> Result<Vec<CryptoRow>, MarketDataError> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable("mock outage".into()));
        }
        Ok(self.cryptos.clone())
    }

    async fn get_commodities(&self) -> Result<Vec<CommodityRow>, MarketDataError> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable("mock outage".into()));
        }
        Ok(self.commodities.clone())
    }

    async fn get_forex_pairs(&self) -> Result<Vec<ForexPairRow>, MarketDataError> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable("mock outage".into()));
        }
        Ok(self.forex.clone())
    }

    async fn get_quote(&self, symbol: &str) -> Result<QuoteRow, MarketDataError> {
        if self.unavailable {
            return Err(MarketDataError::ProviderUnavailable("mock outage".into()));
        }
        match self.quotes.get(symbol) {
            Some(price) => Ok(QuoteRow {
                symbol: Some(symbol.to_string()),
                price: Some(*price),
                change: None,
                volume: None,
            }),
            None => Err(MarketDataError::EmptyResult(symbol.to_string())),
        }
    }
}
