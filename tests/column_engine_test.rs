mod common;

use rust_decimal_macros::dec;

use folio_core::accounts::{AccountError, AccountMode, AccountType};
use folio_core::assets::{AssetDetails, AssetRepository, AssetType, EquityDetails, NewAsset};
use folio_core::datatypes::ColumnValue;
use folio_core::errors::Error;
use folio_core::formulas::{FormulaError, FormulaService, NewFormula};
use folio_core::holdings::HoldingRepository;
use folio_core::schemas::{NewSchemaColumn, ColumnSource, SchemaColumn};
use folio_core::datatypes::DataType;

use common::{add_holding, build_services, seed_account, setup_db};

fn create_priced_equity(
    assets: &AssetRepository,
    symbol: &str,
    price: rust_decimal::Decimal,
) -> String {
    let asset = assets
        .create(
            NewAsset {
                id: None,
                asset_type: AssetType::Equity,
                symbol: Some(symbol.to_string()),
                name: Some(format!("{} Inc", symbol)),
                currency: "USD".to_string(),
                snapshot_id: None,
                notes: None,
            },
            Some(&AssetDetails::Equity(EquityDetails {
                sector: Some("Technology".to_string()),
                ..Default::default()
            })),
        )
        .expect("create asset");
    assets
        .upsert_price(&asset.id, price, "test")
        .expect("set price");
    asset.id
}

fn column<'a>(columns: &'a [folio_core::schemas::ResolvedColumn], identifier: &str) -> &'a folio_core::schemas::ResolvedColumn {
    columns
        .iter()
        .find(|c| c.column.identifier == identifier)
        .unwrap_or_else(|| panic!("column '{}' missing", identifier))
}

fn find_column(
    services: &common::Services,
    account_type: AccountType,
    identifier: &str,
) -> SchemaColumn {
    let schema = services
        .schema_service
        .get_schema_for(account_type, AccountMode::SelfManaged)
        .expect("schema exists");
    services
        .schema_service
        .list_columns(&schema.id)
        .expect("list columns")
        .into_iter()
        .find(|c| c.identifier == identifier)
        .expect("column exists")
}

#[test]
fn resolves_default_columns_for_a_holding() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let assets = AssetRepository::new(db.pool.clone());

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);
    let asset_id = create_priced_equity(&assets, "AAPL", dec!(150));
    let holding = add_holding(
        &db.pool,
        &account_id,
        Some(&asset_id),
        Some("AAPL"),
        dec!(10),
        Some(dec!(100)),
    );

    let resolved = services.resolver.resolve(&holding).expect("resolve");

    assert_eq!(
        column(&resolved, "symbol").value,
        ColumnValue::Text("AAPL".to_string())
    );
    assert_eq!(
        column(&resolved, "price").value,
        ColumnValue::Decimal(dec!(150))
    );
    assert_eq!(
        column(&resolved, "current_value").value,
        ColumnValue::Decimal(dec!(1500.00))
    );
    assert_eq!(
        column(&resolved, "unrealized_gain").value,
        ColumnValue::Decimal(dec!(500.00))
    );
}

#[test]
fn user_override_survives_asset_changes_until_cleared() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let assets = AssetRepository::new(db.pool.clone());

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);
    let asset_id = create_priced_equity(&assets, "MSFT", dec!(100));
    let holding = add_holding(
        &db.pool,
        &account_id,
        Some(&asset_id),
        Some("MSFT"),
        dec!(10),
        Some(dec!(50)),
    );

    let quantity_column = find_column(&services, AccountType::Brokerage, "quantity");
    services
        .resolver
        .set_user_value(&holding, &quantity_column, "99")
        .expect("override quantity");

    // A price update recomputes formula columns but must leave the user
    // override untouched.
    assets
        .upsert_price(&asset_id, dec!(200), "test")
        .expect("update price");
    services.recalc.asset_changed(&asset_id);

    let value = services
        .resolver
        .get_value(&holding, &quantity_column)
        .expect("quantity resolves");
    assert_eq!(value, ColumnValue::Decimal(dec!(99)));

    let current_value_column = find_column(&services, AccountType::Brokerage, "current_value");
    let current_value = services
        .resolver
        .get_value(&holding, &current_value_column)
        .expect("current value resolves");
    assert_eq!(current_value, ColumnValue::Decimal(dec!(19800.00)));

    // Clearing the override goes back to the holding's own quantity.
    let cleared = services
        .resolver
        .clear_user_value(&holding, &quantity_column)
        .expect("clear override");
    assert_eq!(cleared, ColumnValue::Decimal(dec!(10)));
}

#[test]
fn user_values_are_validated_at_write_time() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let assets = AssetRepository::new(db.pool.clone());

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);
    let asset_id = create_priced_equity(&assets, "NVDA", dec!(500));
    let holding = add_holding(
        &db.pool,
        &account_id,
        Some(&asset_id),
        Some("NVDA"),
        dec!(1),
        None,
    );

    let quantity_column = find_column(&services, AccountType::Brokerage, "quantity");

    // min constraint
    assert!(matches!(
        services
            .resolver
            .set_user_value(&holding, &quantity_column, "-5"),
        Err(Error::Validation(_))
    ));
    // decimal_places constraint (4)
    assert!(matches!(
        services
            .resolver
            .set_user_value(&holding, &quantity_column, "1.123456"),
        Err(Error::Validation(_))
    ));

    // non-editable columns refuse overrides
    let price_column = find_column(&services, AccountType::Brokerage, "price");
    assert!(matches!(
        services
            .resolver
            .set_user_value(&holding, &price_column, "1"),
        Err(Error::Schema(_))
    ));
}

#[test]
fn formula_dependency_cycles_are_fatal_to_the_column() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let assets = AssetRepository::new(db.pool.clone());
    let formulas = FormulaService::new(db.pool.clone());

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);
    let asset_id = create_priced_equity(&assets, "TSLA", dec!(200));
    let holding = add_holding(
        &db.pool,
        &account_id,
        Some(&asset_id),
        Some("TSLA"),
        dec!(2),
        None,
    );

    formulas
        .save_formula(NewFormula {
            key: "alpha".to_string(),
            title: "Alpha".to_string(),
            expression: "beta + 1".to_string(),
            decimal_places: None,
            is_system: false,
        })
        .expect("save alpha");
    formulas
        .save_formula(NewFormula {
            key: "beta".to_string(),
            title: "Beta".to_string(),
            expression: "alpha + 1".to_string(),
            decimal_places: None,
            is_system: false,
        })
        .expect("save beta");

    let schema = services
        .schema_service
        .get_schema_for(AccountType::Brokerage, AccountMode::SelfManaged)
        .expect("schema");
    let alpha_column = services
        .schema_service
        .add_column(
            &schema.id,
            NewSchemaColumn {
                identifier: "alpha".to_string(),
                title: "Alpha".to_string(),
                data_type: DataType::Decimal,
                source: ColumnSource::Formula,
                field_path: None,
                formula_key: Some("alpha".to_string()),
                constraints: serde_json::json!({ "decimal_places": 2 }),
                is_editable: false,
                is_deletable: true,
                is_system: false,
                is_default: false,
                display_order: Some(10),
            },
        )
        .expect("add alpha column");
    services
        .schema_service
        .add_column(
            &schema.id,
            NewSchemaColumn {
                identifier: "beta".to_string(),
                title: "Beta".to_string(),
                data_type: DataType::Decimal,
                source: ColumnSource::Formula,
                field_path: None,
                formula_key: Some("beta".to_string()),
                constraints: serde_json::json!({ "decimal_places": 2 }),
                is_editable: false,
                is_deletable: true,
                is_system: false,
                is_default: false,
                display_order: Some(11),
            },
        )
        .expect("add beta column");

    match services.resolver.get_value(&holding, &alpha_column) {
        Err(Error::Formula(FormulaError::CycleDetected(identifier))) => {
            assert_eq!(identifier, "alpha");
        }
        other => panic!("expected a cycle error, got {:?}", other),
    }

    // The cycle must not corrupt the other columns of the same schema.
    let resolved = services.resolver.resolve(&holding).expect("resolve");
    assert!(resolved
        .iter()
        .any(|c| c.column.identifier == "current_value"));
    assert!(!resolved.iter().any(|c| c.column.identifier == "alpha"));
}

#[test]
fn system_formula_identifiers_are_reserved() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let formulas = FormulaService::new(db.pool.clone());

    // Bootstrapping a schema registers the system formulas.
    seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);

    let result = formulas.save_formula(NewFormula {
        key: "current_value".to_string(),
        title: "My formula".to_string(),
        expression: "quantity * 2".to_string(),
        decimal_places: None,
        is_system: false,
    });

    assert!(matches!(
        result,
        Err(FormulaError::ReservedIdentifier(key)) if key == "current_value"
    ));

    assert!(matches!(
        formulas.delete_formula("current_value"),
        Err(FormulaError::ReservedIdentifier(_))
    ));
}

#[test]
fn switch_to_managed_requires_force_while_holdings_exist() {
    let db = setup_db();
    let services = build_services(&db.pool);
    let assets = AssetRepository::new(db.pool.clone());
    let holdings = HoldingRepository::new(db.pool.clone());

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::SelfManaged);
    let asset_id = create_priced_equity(&assets, "AMZN", dec!(100));
    add_holding(
        &db.pool,
        &account_id,
        Some(&asset_id),
        Some("AMZN"),
        dec!(3),
        None,
    );

    let result = services
        .account_service
        .switch_account_mode(&account_id, AccountMode::Managed, false);
    assert!(matches!(result, Err(AccountError::ModeSwitchBlocked(_))));

    // Nothing was mutated by the refused switch.
    let account = services
        .account_service
        .get_account(&account_id)
        .expect("account");
    assert_eq!(account.account_mode, AccountMode::SelfManaged);
    assert_eq!(
        holdings.list_by_account(&account_id).expect("list").len(),
        1
    );

    // Forcing the switch discards the holdings.
    let account = services
        .account_service
        .switch_account_mode(&account_id, AccountMode::Managed, true)
        .expect("forced switch");
    assert_eq!(account.account_mode, AccountMode::Managed);
    assert!(holdings
        .list_by_account(&account_id)
        .expect("list")
        .is_empty());
}

#[test]
fn switch_to_self_managed_resets_aggregates() {
    let db = setup_db();
    let services = build_services(&db.pool);

    let (_portfolio_id, account_id) =
        seed_account(&services, AccountType::Brokerage, AccountMode::Managed);

    services
        .account_service
        .set_aggregates(
            &account_id,
            folio_core::accounts::AccountAggregates {
                current_value: Some(dec!(25000)),
                invested_amount: Some(dec!(20000)),
                strategy: Some("index".to_string()),
            },
        )
        .expect("set aggregates");

    let account = services
        .account_service
        .switch_account_mode(&account_id, AccountMode::SelfManaged, false)
        .expect("switch");

    assert_eq!(account.account_mode, AccountMode::SelfManaged);
    assert_eq!(account.current_value, None);
    assert_eq!(account.invested_amount, None);
    assert_eq!(account.strategy, None);
}
