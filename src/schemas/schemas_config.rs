use serde_json::json;

use crate::accounts::{AccountMode, AccountType};
use crate::datatypes::DataType;
use crate::formulas::NewFormula;

use super::schemas_model::{ColumnSource, NewSchemaColumn};

/// System formulas registered when a default schema is first created.
pub fn system_formulas() -> Vec<NewFormula> {
    vec![
        NewFormula {
            key: "current_value".to_string(),
            title: "Current Value".to_string(),
            expression: "price * quantity".to_string(),
            decimal_places: Some(2),
            is_system: true,
        },
        NewFormula {
            key: "unrealized_gain".to_string(),
            title: "Unrealized Gain".to_string(),
            expression: "(price - purchase_price) * quantity".to_string(),
            decimal_places: Some(2),
            is_system: true,
        },
    ]
}

fn system_column(
    order: i32,
    identifier: &str,
    title: &str,
    data_type: DataType,
    source: ColumnSource,
    field_path: Option<&str>,
    formula_key: Option<&str>,
    constraints: serde_json::Value,
    is_editable: bool,
) -> NewSchemaColumn {
    NewSchemaColumn {
        identifier: identifier.to_string(),
        title: title.to_string(),
        data_type,
        source,
        field_path: field_path.map(str::to_string),
        formula_key: formula_key.map(str::to_string),
        constraints,
        is_editable,
        is_deletable: false,
        is_system: true,
        is_default: true,
        display_order: Some(order),
    }
}

/// Default column set for one account type and mode.
///
/// Managed accounts carry aggregates on the account row and expose no
/// holding columns.
pub fn default_columns(_account_type: AccountType, mode: AccountMode) -> Vec<NewSchemaColumn> {
    if mode == AccountMode::Managed {
        return Vec::new();
    }

    vec![
        system_column(
            1,
            "symbol",
            "Symbol",
            DataType::String,
            ColumnSource::AssetField,
            Some("symbol"),
            None,
            json!({ "character_limit": 16, "all_caps": true }),
            false,
        ),
        system_column(
            2,
            "name",
            "Name",
            DataType::String,
            ColumnSource::AssetField,
            Some("name"),
            None,
            json!({ "character_limit": 255 }),
            false,
        ),
        system_column(
            3,
            "quantity",
            "Quantity",
            DataType::Decimal,
            ColumnSource::HoldingField,
            Some("quantity"),
            None,
            json!({ "decimal_places": 4, "min": 0 }),
            true,
        ),
        system_column(
            4,
            "purchase_price",
            "Purchase Price",
            DataType::Decimal,
            ColumnSource::HoldingField,
            Some("purchase_price"),
            None,
            json!({ "decimal_places": 2, "min": 0 }),
            true,
        ),
        system_column(
            5,
            "price",
            "Price",
            DataType::Decimal,
            ColumnSource::AssetField,
            Some("price"),
            None,
            json!({ "decimal_places": 2 }),
            false,
        ),
        system_column(
            6,
            "current_value",
            "Current Value",
            DataType::Decimal,
            ColumnSource::Formula,
            None,
            Some("current_value"),
            json!({ "decimal_places": 2 }),
            false,
        ),
        system_column(
            7,
            "unrealized_gain",
            "Unrealized Gain",
            DataType::Decimal,
            ColumnSource::Formula,
            None,
            Some("unrealized_gain"),
            json!({ "decimal_places": 2 }),
            false,
        ),
    ]
}
