use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::accounts::{AccountMode, AccountType};
use crate::assets::{AssetDetails, AssetView};
use crate::datatypes::{validate_constraints, ColumnValue, DataType};
use crate::holdings::Holding;

use super::schemas_errors::{Result, SchemaError};

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    /// Read from the holding's asset through a field path.
    AssetField,
    /// Read from the holding row through a field path.
    HoldingField,
    /// Computed by a registered formula.
    Formula,
    /// Entered by the user; no backing field.
    User,
}

impl ColumnSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnSource::AssetField => "asset_field",
            ColumnSource::HoldingField => "holding_field",
            ColumnSource::Formula => "formula",
            ColumnSource::User => "user",
        }
    }
}

impl FromStr for ColumnSource {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asset_field" => Ok(ColumnSource::AssetField),
            "holding_field" => Ok(ColumnSource::HoldingField),
            "formula" => Ok(ColumnSource::Formula),
            "user" => Ok(ColumnSource::User),
            other => Err(SchemaError::InvalidColumn(format!(
                "Unknown column source '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ColumnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a materialized column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    System,
    Formula,
    User,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::System => "system",
            ValueSource::Formula => "formula",
            ValueSource::User => "user",
        }
    }
}

impl FromStr for ValueSource {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(ValueSource::System),
            "formula" => Ok(ValueSource::Formula),
            "user" => Ok(ValueSource::User),
            other => Err(SchemaError::InvalidColumn(format!(
                "Unknown value source '{}'",
                other
            ))),
        }
    }
}

/// Fields readable from an asset (and its extension record / price).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetField {
    Symbol,
    Name,
    Currency,
    Price,
    Sector,
    Industry,
    Country,
    Exchange,
}

impl AssetField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetField::Symbol => "symbol",
            AssetField::Name => "name",
            AssetField::Currency => "currency",
            AssetField::Price => "price",
            AssetField::Sector => "sector",
            AssetField::Industry => "industry",
            AssetField::Country => "country",
            AssetField::Exchange => "exchange",
        }
    }

    /// Reads this field out of an asset view.
    pub fn read(&self, view: &AssetView) -> ColumnValue {
        let text = |value: &Option<String>| match value {
            Some(v) => ColumnValue::Text(v.clone()),
            None => ColumnValue::Null,
        };

        match self {
            AssetField::Symbol => text(&view.asset.symbol),
            AssetField::Name => text(&view.asset.name),
            AssetField::Currency => ColumnValue::Text(view.asset.currency.clone()),
            AssetField::Price => match &view.price {
                Some(p) => ColumnValue::Decimal(p.price),
                None => ColumnValue::Null,
            },
            AssetField::Sector => match &view.details {
                Some(AssetDetails::Equity(d)) => text(&d.sector),
                _ => ColumnValue::Null,
            },
            AssetField::Industry => match &view.details {
                Some(AssetDetails::Equity(d)) => text(&d.industry),
                _ => ColumnValue::Null,
            },
            AssetField::Country => match &view.details {
                Some(AssetDetails::Equity(d)) => text(&d.country),
                Some(AssetDetails::RealEstate(d)) => text(&d.location),
                _ => ColumnValue::Null,
            },
            AssetField::Exchange => match &view.details {
                Some(AssetDetails::Equity(d)) => text(&d.exchange),
                Some(AssetDetails::Metal(d)) => text(&d.exchange),
                _ => ColumnValue::Null,
            },
        }
    }
}

impl FromStr for AssetField {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "symbol" => Ok(AssetField::Symbol),
            "name" => Ok(AssetField::Name),
            "currency" => Ok(AssetField::Currency),
            "price" => Ok(AssetField::Price),
            "sector" => Ok(AssetField::Sector),
            "industry" => Ok(AssetField::Industry),
            "country" => Ok(AssetField::Country),
            "exchange" => Ok(AssetField::Exchange),
            other => Err(SchemaError::InvalidColumn(format!(
                "Unknown asset field '{}'",
                other
            ))),
        }
    }
}

/// Fields readable directly from the holding row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingField {
    Quantity,
    PurchasePrice,
    OriginalSymbol,
}

impl HoldingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingField::Quantity => "quantity",
            HoldingField::PurchasePrice => "purchase_price",
            HoldingField::OriginalSymbol => "original_symbol",
        }
    }

    pub fn read(&self, holding: &Holding) -> ColumnValue {
        match self {
            HoldingField::Quantity => ColumnValue::Decimal(holding.quantity),
            HoldingField::PurchasePrice => match holding.purchase_price {
                Some(p) => ColumnValue::Decimal(p),
                None => ColumnValue::Null,
            },
            HoldingField::OriginalSymbol => match &holding.original_symbol {
                Some(s) => ColumnValue::Text(s.clone()),
                None => ColumnValue::Null,
            },
        }
    }
}

impl FromStr for HoldingField {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "quantity" => Ok(HoldingField::Quantity),
            "purchase_price" => Ok(HoldingField::PurchasePrice),
            "original_symbol" => Ok(HoldingField::OriginalSymbol),
            other => Err(SchemaError::InvalidColumn(format!(
                "Unknown holding field '{}'",
                other
            ))),
        }
    }
}

/// Typed field-path descriptor for direct-read columns. Always resolved
/// through an explicit variant, never by reflective attribute lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Asset(AssetField),
    Holding(HoldingField),
}

/// A versioned column configuration bound to an account type and mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: String,
    pub account_type: AccountType,
    pub account_mode: AccountMode,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// One displayable or computable field of a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub id: String,
    pub schema_id: String,
    pub identifier: String,
    pub title: String,
    pub data_type: DataType,
    pub source: ColumnSource,
    pub field_path: Option<String>,
    pub formula_key: Option<String>,
    pub constraints: serde_json::Value,
    pub is_editable: bool,
    pub is_deletable: bool,
    pub is_system: bool,
    pub is_default: bool,
    pub display_order: Option<i32>,
}

impl SchemaColumn {
    /// The column's `decimal_places` constraint, when set.
    pub fn decimal_places(&self) -> Option<u32> {
        self.constraints
            .get("decimal_places")
            .and_then(serde_json::Value::as_u64)
            .map(|p| p as u32)
    }

    /// The parsed field-path descriptor for direct-read columns.
    pub fn field_path_descriptor(&self) -> Result<FieldPath> {
        let path = self.field_path.as_deref().ok_or_else(|| {
            SchemaError::InvalidColumn(format!("Column '{}' has no field path", self.identifier))
        })?;
        match self.source {
            ColumnSource::AssetField => Ok(FieldPath::Asset(AssetField::from_str(path)?)),
            ColumnSource::HoldingField => Ok(FieldPath::Holding(HoldingField::from_str(path)?)),
            _ => Err(SchemaError::InvalidColumn(format!(
                "Column '{}' with source '{}' has no field path",
                self.identifier, self.source
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(SchemaError::InvalidColumn(
                "Column identifier is required".to_string(),
            ));
        }

        match self.source {
            ColumnSource::Formula => {
                if self.formula_key.is_none() {
                    return Err(SchemaError::InvalidColumn(format!(
                        "Formula column '{}' must reference a formula",
                        self.identifier
                    )));
                }
                if self.field_path.is_some() {
                    return Err(SchemaError::InvalidColumn(format!(
                        "Formula column '{}' cannot define a field path",
                        self.identifier
                    )));
                }
            }
            ColumnSource::AssetField | ColumnSource::HoldingField => {
                if self.formula_key.is_some() {
                    return Err(SchemaError::InvalidColumn(format!(
                        "Field column '{}' cannot reference a formula",
                        self.identifier
                    )));
                }
                self.field_path_descriptor()?;
            }
            ColumnSource::User => {
                if self.formula_key.is_some() || self.field_path.is_some() {
                    return Err(SchemaError::InvalidColumn(format!(
                        "User column '{}' cannot define a field path or formula",
                        self.identifier
                    )));
                }
            }
        }

        if self.is_default && self.display_order.is_none() {
            return Err(SchemaError::InvalidColumn(format!(
                "Default column '{}' must have a display order",
                self.identifier
            )));
        }

        validate_constraints(self.data_type, &self.constraints)
            .map_err(|e| SchemaError::InvalidColumn(e.to_string()))?;

        Ok(())
    }
}

/// Input model for creating a schema column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchemaColumn {
    pub identifier: String,
    pub title: String,
    pub data_type: DataType,
    pub source: ColumnSource,
    pub field_path: Option<String>,
    pub formula_key: Option<String>,
    pub constraints: serde_json::Value,
    pub is_editable: bool,
    pub is_deletable: bool,
    pub is_system: bool,
    pub is_default: bool,
    pub display_order: Option<i32>,
}

/// Materialized value of one column for one holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumnValue {
    pub id: String,
    pub column_id: String,
    pub holding_id: String,
    pub value: Option<String>,
    pub source: ValueSource,
    pub updated_at: NaiveDateTime,
}

/// Per-account visibility flag for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnVisibility {
    pub id: String,
    pub account_id: String,
    pub column_id: String,
    pub is_visible: bool,
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::schemas)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchemaDB {
    pub id: String,
    pub account_type: String,
    pub account_mode: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl From<SchemaDB> for Schema {
    fn from(db: SchemaDB) -> Self {
        Schema {
            account_type: AccountType::from_str(&db.account_type).unwrap_or(AccountType::Custom),
            account_mode: AccountMode::from_str(&db.account_mode)
                .unwrap_or(AccountMode::SelfManaged),
            id: db.id,
            name: db.name,
            created_at: db.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::schema_columns)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchemaColumnDB {
    pub id: String,
    pub schema_id: String,
    pub identifier: String,
    pub title: String,
    pub data_type: String,
    pub source: String,
    pub field_path: Option<String>,
    pub formula_key: Option<String>,
    pub constraints: String,
    pub is_editable: bool,
    pub is_deletable: bool,
    pub is_system: bool,
    pub is_default: bool,
    pub display_order: Option<i32>,
}

impl From<SchemaColumnDB> for SchemaColumn {
    fn from(db: SchemaColumnDB) -> Self {
        SchemaColumn {
            data_type: DataType::from_str(&db.data_type).unwrap_or(DataType::String),
            source: ColumnSource::from_str(&db.source).unwrap_or(ColumnSource::User),
            constraints: serde_json::from_str(&db.constraints)
                .unwrap_or(serde_json::Value::Null),
            id: db.id,
            schema_id: db.schema_id,
            identifier: db.identifier,
            title: db.title,
            field_path: db.field_path,
            formula_key: db.formula_key,
            is_editable: db.is_editable,
            is_deletable: db.is_deletable,
            is_system: db.is_system,
            is_default: db.is_default,
            display_order: db.display_order,
        }
    }
}

impl SchemaColumnDB {
    pub fn from_new(schema_id: &str, new: &NewSchemaColumn) -> Self {
        SchemaColumnDB {
            id: uuid::Uuid::new_v4().to_string(),
            schema_id: schema_id.to_string(),
            identifier: new.identifier.clone(),
            title: new.title.clone(),
            data_type: new.data_type.as_str().to_string(),
            source: new.source.as_str().to_string(),
            field_path: new.field_path.clone(),
            formula_key: new.formula_key.clone(),
            constraints: new.constraints.to_string(),
            is_editable: new.is_editable,
            is_deletable: new.is_deletable,
            is_system: new.is_system,
            is_default: new.is_default,
            display_order: new.display_order,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::schema_column_values)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchemaColumnValueDB {
    pub id: String,
    pub column_id: String,
    pub holding_id: String,
    pub value: Option<String>,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<SchemaColumnValueDB> for SchemaColumnValue {
    fn from(db: SchemaColumnValueDB) -> Self {
        SchemaColumnValue {
            source: ValueSource::from_str(&db.source).unwrap_or(ValueSource::System),
            id: db.id,
            column_id: db.column_id,
            holding_id: db.holding_id,
            value: db.value,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::schema_column_visibility)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ColumnVisibilityDB {
    pub id: String,
    pub account_id: String,
    pub column_id: String,
    pub is_visible: bool,
}

impl From<ColumnVisibilityDB> for ColumnVisibility {
    fn from(db: ColumnVisibilityDB) -> Self {
        ColumnVisibility {
            id: db.id,
            account_id: db.account_id,
            column_id: db.column_id,
            is_visible: db.is_visible,
        }
    }
}
