mod common;

use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use folio_core::accounts::{AccountMode, AccountType};
use folio_core::assets::{asset_type_for_class, AssetClass, AssetDetails, AssetRepository};
use folio_core::errors::Error;
use folio_core::fx::FxRepository;
use folio_core::holdings::{HoldingRepository, HoldingSource};
use folio_core::market_data::providers::models::{CryptoRow, EquityRow};
use folio_core::market_data::MarketDataError;
use folio_core::snapshots::{SeedService, SnapshotRepository};

use common::{add_holding, build_services, seed_account, setup_db, MockProvider};

fn seed_service(db: &common::TestDb, provider: MockProvider) -> SeedService {
    let services = build_services(&db.pool);
    SeedService::new(db.pool.clone(), Arc::new(provider), services.recalc)
}

fn crypto_row(symbol: &str, name: &str) -> CryptoRow {
    CryptoRow {
        symbol: Some(symbol.to_string()),
        name: Some(name.to_string()),
        circulating_supply: None,
        total_supply: None,
    }
}

fn equity_row(symbol: &str, currency: Option<&str>) -> EquityRow {
    EquityRow {
        symbol: Some(symbol.to_string()),
        name: Some(format!("{} Inc", symbol)),
        currency: currency.map(str::to_string),
        exchange: Some("NASDAQ".to_string()),
        sector: Some("Technology".to_string()),
        industry: None,
        country: Some("US".to_string()),
        isin: None,
    }
}

#[tokio::test]
async fn seeds_crypto_universe_and_activates_the_snapshot() {
    let db = setup_db();
    FxRepository::new(db.pool.clone())
        .upsert_currency("USD", Some("US Dollar"))
        .expect("seed currency");

    let service = seed_service(
        &db,
        MockProvider {
            cryptos: vec![crypto_row("BTCUSD", "Bitcoin")],
            ..Default::default()
        },
    );

    let summary = service.seed_crypto().await.expect("seed");
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 0);

    let pointer = SnapshotRepository::new(db.pool.clone())
        .get(AssetClass::Crypto)
        .expect("pointer query")
        .expect("pointer exists");
    assert_eq!(pointer.snapshot_id, summary.snapshot_id);

    let assets = AssetRepository::new(db.pool.clone());
    let seeded = assets
        .list_by_type_and_snapshot(asset_type_for_class(AssetClass::Crypto), &pointer.snapshot_id)
        .expect("list assets");
    assert_eq!(seeded.len(), 1);
    assert_eq!(seeded[0].symbol.as_deref(), Some("BTCUSD"));
    assert_eq!(seeded[0].currency, "USD");

    match assets.get_details(&seeded[0]).expect("details") {
        Some(AssetDetails::Crypto(details)) => {
            assert_eq!(details.base_symbol, "BTC");
            assert_eq!(details.quote_symbol, "USD");
        }
        other => panic!("expected crypto details, got {:?}", other),
    }
}

#[tokio::test]
async fn reseeding_is_idempotent_with_a_fresh_snapshot_id() {
    let db = setup_db();
    FxRepository::new(db.pool.clone())
        .upsert_currency("USD", None)
        .expect("seed currency");

    let service = seed_service(
        &db,
        MockProvider {
            cryptos: vec![crypto_row("BTCUSD", "Bitcoin"), crypto_row("ETHUSD", "Ethereum")],
            ..Default::default()
        },
    );

    let first = service.seed_crypto().await.expect("first seed");
    let second = service.seed_crypto().await.expect("second seed");

    assert_ne!(first.snapshot_id, second.snapshot_id);
    assert_eq!(first.created, second.created);

    // The active data set is identical, and homogeneous: every active row
    // carries the second snapshot's id.
    let assets = AssetRepository::new(db.pool.clone());
    let active = assets
        .list_by_type_and_snapshot(
            asset_type_for_class(AssetClass::Crypto),
            &second.snapshot_id,
        )
        .expect("list active");
    let mut symbols: Vec<String> = active.iter().filter_map(|a| a.symbol.clone()).collect();
    symbols.sort();
    assert_eq!(symbols, vec!["BTCUSD".to_string(), "ETHUSD".to_string()]);
    assert!(active
        .iter()
        .all(|a| a.snapshot_id.as_deref() == Some(second.snapshot_id.as_str())));

    // The superseded generation is still queryable until cleanup passes its
    // retention window.
    let previous = assets
        .list_by_type_and_snapshot(asset_type_for_class(AssetClass::Crypto), &first.snapshot_id)
        .expect("list previous");
    assert_eq!(previous.len(), 2);
}

#[tokio::test]
async fn rows_missing_mandatory_fields_are_skipped_not_fatal() {
    let db = setup_db();

    let service = seed_service(
        &db,
        MockProvider {
            equities: vec![
                equity_row("AAPL", Some("USD")),
                equity_row("", Some("USD")),
                equity_row("MSFT", None),
            ],
            ..Default::default()
        },
    );

    let summary = service.seed_equities().await.expect("seed");
    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 2);
}

#[tokio::test]
async fn provider_outage_fails_the_run_without_touching_the_pointer() {
    let db = setup_db();

    let service = seed_service(
        &db,
        MockProvider {
            unavailable: true,
            ..Default::default()
        },
    );

    match service.seed_equities().await {
        Err(Error::MarketData(MarketDataError::ProviderUnavailable(_))) => {}
        other => panic!("expected provider outage, got {:?}", other),
    }

    assert!(SnapshotRepository::new(db.pool.clone())
        .get(AssetClass::Equity)
        .expect("pointer query")
        .is_none());
}

#[tokio::test]
async fn reconcile_relinks_or_detaches_asset_backed_holdings() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let seeder = SeedService::new(
        db.pool.clone(),
        Arc::new(MockProvider {
            equities: vec![equity_row("AAPL", Some("USD")), equity_row("GONE", Some("USD"))],
            ..Default::default()
        }),
        services.recalc.clone(),
    );

    let first = seeder.seed_equities().await.expect("first seed");
    let assets = AssetRepository::new(db.pool.clone());
    let first_gen = assets
        .list_by_type_and_snapshot(asset_type_for_class(AssetClass::Equity), &first.snapshot_id)
        .expect("list");
    let aapl = first_gen
        .iter()
        .find(|a| a.symbol.as_deref() == Some("AAPL"))
        .expect("AAPL seeded");
    let gone = first_gen
        .iter()
        .find(|a| a.symbol.as_deref() == Some("GONE"))
        .expect("GONE seeded");

    let kept_holding = add_holding(
        &db.pool,
        &account_id,
        Some(&aapl.id),
        Some("AAPL"),
        dec!(5),
        None,
    );
    let orphaned_holding = add_holding(
        &db.pool,
        &account_id,
        Some(&gone.id),
        Some("GONE"),
        dec!(2),
        None,
    );

    // Second universe drops GONE.
    let seeder = SeedService::new(
        db.pool.clone(),
        Arc::new(MockProvider {
            equities: vec![equity_row("AAPL", Some("USD"))],
            ..Default::default()
        }),
        services.recalc.clone(),
    );
    let second = seeder.seed_equities().await.expect("second seed");

    let holdings = HoldingRepository::new(db.pool.clone());
    let kept = holdings.get_by_id(&kept_holding.id).expect("kept");
    assert_eq!(kept.source, HoldingSource::Asset);
    let new_aapl = assets
        .find_by_type_and_symbol(
            asset_type_for_class(AssetClass::Equity),
            "AAPL",
            Some(&second.snapshot_id),
        )
        .expect("query")
        .expect("AAPL in new snapshot");
    assert_eq!(kept.asset_id.as_deref(), Some(new_aapl.id.as_str()));

    let orphaned = holdings.get_by_id(&orphaned_holding.id).expect("orphaned");
    assert_eq!(orphaned.source, HoldingSource::Custom);
    assert_eq!(orphaned.asset_id, None);
}

#[tokio::test]
async fn single_symbol_sync_updates_only_the_active_row() {
    let db = setup_db();
    let services = build_services(&db.pool);

    let seeder = SeedService::new(
        db.pool.clone(),
        Arc::new(MockProvider {
            equities: vec![equity_row("AAPL", Some("USD"))],
            quotes: HashMap::from([("AAPL".to_string(), dec!(187.25))]),
            ..Default::default()
        }),
        services.recalc.clone(),
    );

    let summary = seeder.seed_equities().await.expect("seed");
    let result = seeder
        .sync_symbol(AssetClass::Equity, "aapl")
        .await
        .expect("sync");
    assert_eq!(result.updated, 1);

    let assets = AssetRepository::new(db.pool.clone());
    let asset = assets
        .find_by_type_and_symbol(
            asset_type_for_class(AssetClass::Equity),
            "AAPL",
            Some(&summary.snapshot_id),
        )
        .expect("query")
        .expect("asset");
    let price = assets.get_price(&asset.id).expect("price query").expect("price");
    assert_eq!(price.price, dec!(187.25));

    // Unknown symbols are a user-facing failure, not a silent zero-update.
    match seeder.sync_symbol(AssetClass::Equity, "UNKNOWN").await {
        Err(Error::Asset(_)) => {}
        other => panic!("expected asset error, got {:?}", other),
    }
}

#[tokio::test]
async fn cleanup_prunes_generations_beyond_the_retention_window() {
    let db = setup_db();
    let services = build_services(&db.pool);

    let seeder = SeedService::new(
        db.pool.clone(),
        Arc::new(MockProvider {
            equities: vec![equity_row("AAPL", Some("USD"))],
            ..Default::default()
        }),
        services.recalc.clone(),
    );

    let mut snapshot_ids = Vec::new();
    for _ in 0..4 {
        snapshot_ids.push(seeder.seed_equities().await.expect("seed").snapshot_id);
    }

    // Retention keeps the active snapshot plus two recent generations; the
    // oldest generation must be gone.
    let assets = AssetRepository::new(db.pool.clone());
    let remaining = assets
        .list_snapshot_ids(asset_type_for_class(AssetClass::Equity))
        .expect("list generations");
    assert!(remaining.len() <= 3);
    assert!(!remaining.contains(&snapshot_ids[0]));
    assert!(remaining.contains(snapshot_ids.last().expect("last id")));
}
