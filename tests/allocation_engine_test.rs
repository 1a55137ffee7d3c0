mod common;

use diesel::{sql_query, RunQueryDsl};
use rust_decimal_macros::dec;
use std::sync::Arc;

use folio_core::accounts::{AccountMode, AccountRepository, AccountType};
use folio_core::allocations::{AllocationEngine, AllocationRepository};
use folio_core::analytics::{
    AggregationService, AnalyticsEngine, AnalyticsRepository, DimensionResolver, DimensionType,
    RunStatus, UNKNOWN_LABEL,
};
use folio_core::assets::{AssetDetails, AssetRepository, AssetType, EquityDetails, NewAsset};
use folio_core::holdings::HoldingRepository;

use common::{add_holding, build_services, seed_account, setup_db, Services, TestDb};

struct Engines {
    allocations: AllocationEngine,
    analytics: AnalyticsEngine,
    allocation_repo: Arc<AllocationRepository>,
    analytics_repo: Arc<AnalyticsRepository>,
}

fn build_engines(db: &TestDb, services: &Services) -> Engines {
    let allocation_repo = Arc::new(AllocationRepository::new(db.pool.clone()));
    let analytics_repo = Arc::new(AnalyticsRepository::new(db.pool.clone()));
    let dimensions = Arc::new(DimensionResolver::new(
        analytics_repo.clone(),
        services.resolver.clone(),
    ));

    Engines {
        allocations: AllocationEngine::new(
            allocation_repo.clone(),
            AggregationService::new(services.resolver.clone(), dimensions.clone()),
            AccountRepository::new(db.pool.clone()),
            HoldingRepository::new(db.pool.clone()),
        ),
        analytics: AnalyticsEngine::new(
            analytics_repo.clone(),
            AggregationService::new(services.resolver.clone(), dimensions),
            AccountRepository::new(db.pool.clone()),
            HoldingRepository::new(db.pool.clone()),
        ),
        allocation_repo,
        analytics_repo,
    }
}

fn priced_equity(
    pool: &Arc<folio_core::db::DbPool>,
    symbol: &str,
    price: rust_decimal::Decimal,
) -> String {
    let assets = AssetRepository::new(pool.clone());
    let asset = assets
        .create(
            NewAsset {
                id: None,
                asset_type: AssetType::Equity,
                symbol: Some(symbol.to_string()),
                name: Some(symbol.to_string()),
                currency: "USD".to_string(),
                snapshot_id: None,
                notes: None,
            },
            Some(&AssetDetails::Equity(EquityDetails::default())),
        )
        .expect("create asset");
    assets
        .upsert_price(&asset.id, price, "test")
        .expect("price");
    asset.id
}

#[test]
fn gap_report_with_zero_matched_holdings_carries_full_targets() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let engines = build_engines(&db, &services);

    let (portfolio_id, _account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let scenario = engines
        .allocation_repo
        .create_scenario(&portfolio_id, "Strategic", "current_value")
        .expect("scenario");
    let dimension = engines
        .allocation_repo
        .add_dimension(&scenario.id, "sector", "Sector", DimensionType::Categorical)
        .expect("dimension");
    engines
        .allocation_repo
        .add_target(&dimension.id, "Technology", dec!(25), Some(dec!(5000)))
        .expect("target");

    let run = engines
        .allocations
        .evaluate(&scenario.id)
        .expect("evaluate");

    assert_eq!(run.status, RunStatus::Success);
    assert!(run.started_at.is_some());
    assert!(run.finished_at.is_some());

    let results = engines
        .allocation_repo
        .list_results(&run.id)
        .expect("results");
    assert_eq!(results.len(), 1);

    let row = &results[0];
    assert_eq!(row.target_label, "Technology");
    assert_eq!(row.actual_value, dec!(0));
    assert_eq!(row.actual_percent, dec!(0));
    assert_eq!(row.gap_value, dec!(5000));
    assert_eq!(row.gap_percent, dec!(25));
    assert_eq!(row.holding_count, 0);
}

#[test]
fn failed_evaluation_reaches_terminal_state_and_reraises() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let engines = build_engines(&db, &services);

    let (portfolio_id, _account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let scenario = engines
        .allocation_repo
        .create_scenario(&portfolio_id, "Doomed", "current_value")
        .expect("scenario");
    let dimension = engines
        .allocation_repo
        .add_dimension(&scenario.id, "sector", "Sector", DimensionType::Categorical)
        .expect("dimension");
    engines
        .allocation_repo
        .add_target(&dimension.id, "Technology", dec!(50), None)
        .expect("target");

    // Sabotage the results table so the write inside the run body fails.
    {
        let mut conn = db.pool.get().expect("conn");
        sql_query("DROP TABLE allocation_gap_results")
            .execute(&mut conn)
            .expect("drop table");
    }

    let result = engines.allocations.evaluate(&scenario.id);
    assert!(result.is_err());

    // The run record still reached a terminal state with the error recorded.
    let run_id = {
        use diesel::prelude::*;
        use folio_core::schema::allocation_runs;

        let mut conn = db.pool.get().expect("conn");
        allocation_runs::table
            .filter(allocation_runs::scenario_id.eq(&scenario.id))
            .select(allocation_runs::id)
            .first::<String>(&mut conn)
            .expect("run id")
    };
    let run = engines.allocation_repo.get_run(&run_id).expect("run record");
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert!(run.error_message.is_some());
}

#[test]
fn categorical_analytic_buckets_and_sorts_descending() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let engines = build_engines(&db, &services);

    let (portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let aapl = priced_equity(&db.pool, "AAPL", dec!(100));
    let msft = priced_equity(&db.pool, "MSFT", dec!(300));
    add_holding(&db.pool, &account_id, Some(&aapl), Some("AAPL"), dec!(1), None);
    add_holding(&db.pool, &account_id, Some(&msft), Some("MSFT"), dec!(1), None);

    let analytic = engines
        .analytics_repo
        .create_analytic(&portfolio_id, "By symbol", "current_value")
        .expect("analytic");
    engines
        .analytics_repo
        .add_dimension(
            &analytic.id,
            "symbol",
            "Symbol",
            DimensionType::Categorical,
            Some("symbol"),
        )
        .expect("dimension");

    let run = engines.analytics.evaluate(&analytic.id).expect("evaluate");
    assert_eq!(run.status, RunStatus::Success);

    let results = engines.analytics_repo.list_results(&run.id).expect("rows");
    assert_eq!(results.len(), 2);

    // Sorted descending by total value.
    assert_eq!(results[0].bucket_label, "MSFT");
    assert_eq!(results[0].total_value, dec!(300));
    assert_eq!(results[0].percentage, dec!(0.75));
    assert_eq!(results[1].bucket_label, "AAPL");
    assert_eq!(results[1].percentage, dec!(0.25));
    assert_eq!(results[0].holding_count, 1);
}

#[test]
fn weighted_dimension_splits_value_across_buckets() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let engines = build_engines(&db, &services);

    let (portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let asset_id = priced_equity(&db.pool, "VT", dec!(100));
    add_holding(&db.pool, &account_id, Some(&asset_id), Some("VT"), dec!(1), None);

    engines
        .analytics_repo
        .set_asset_exposure(&asset_id, "region", "US", dec!(0.6))
        .expect("exposure");
    engines
        .analytics_repo
        .set_asset_exposure(&asset_id, "region", "EU", dec!(0.3))
        .expect("exposure");

    let analytic = engines
        .analytics_repo
        .create_analytic(&portfolio_id, "By region", "current_value")
        .expect("analytic");
    engines
        .analytics_repo
        .add_dimension(&analytic.id, "region", "Region", DimensionType::Weighted, None)
        .expect("dimension");

    let run = engines.analytics.evaluate(&analytic.id).expect("evaluate");
    let results = engines.analytics_repo.list_results(&run.id).expect("rows");

    // 0.6 US + 0.3 EU + 0.1 Unknown top-up.
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].bucket_label, "US");
    assert_eq!(results[0].total_value, dec!(60));
    assert_eq!(results[1].bucket_label, "EU");
    assert_eq!(results[1].total_value, dec!(30));
    assert_eq!(results[2].bucket_label, UNKNOWN_LABEL);
    assert_eq!(results[2].total_value, dec!(10));
}

#[test]
fn zero_value_holdings_are_skipped() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let engines = build_engines(&db, &services);

    let (portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    // Zero quantity -> zero current_value -> no contribution.
    let asset_id = priced_equity(&db.pool, "ZERO", dec!(50));
    add_holding(&db.pool, &account_id, Some(&asset_id), Some("ZERO"), dec!(0), None);

    let analytic = engines
        .analytics_repo
        .create_analytic(&portfolio_id, "Empty", "current_value")
        .expect("analytic");
    engines
        .analytics_repo
        .add_dimension(
            &analytic.id,
            "symbol",
            "Symbol",
            DimensionType::Categorical,
            Some("symbol"),
        )
        .expect("dimension");

    let run = engines.analytics.evaluate(&analytic.id).expect("evaluate");
    let results = engines.analytics_repo.list_results(&run.id).expect("rows");
    assert!(results.is_empty());
}
