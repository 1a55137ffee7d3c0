use log::error;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;

use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;

use crate::accounts::AccountRepository;
use crate::assets::AssetRepository;
use crate::constants::DEFAULT_DECIMAL_PLACES;
use crate::datatypes::{validate_value, ColumnValue, DataType};
use crate::errors::{Error, Result};
use crate::formulas::{FormulaError, FormulaEvaluator, FormulaRepository};
use crate::holdings::Holding;

use super::schemas_errors::SchemaError;
use super::schemas_model::{ColumnSource, FieldPath, SchemaColumn, ValueSource};
use super::schemas_repository::SchemaRepository;

/// A column identifier paired with its resolved value, in display order.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub column: SchemaColumn,
    pub value: ColumnValue,
}

/// Resolves the effective value of each schema column for a holding.
///
/// Resolution order per column:
/// 1. a user override is returned verbatim, never recomputed;
/// 2. formula columns evaluate against a context built by resolving their
///    declared dependencies through this same resolver (cycles are a
///    configuration error and fail that column);
/// 3. everything else reads the configured asset/holding field directly.
///
/// Computed values are materialized into schema_column_values for fast
/// reads; user overrides are never deleted implicitly.
pub struct ColumnValueResolver {
    schemas: SchemaRepository,
    formulas: FormulaRepository,
    assets: AssetRepository,
    accounts: AccountRepository,
}

impl ColumnValueResolver {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            schemas: SchemaRepository::new(pool.clone()),
            formulas: FormulaRepository::new(pool.clone()),
            assets: AssetRepository::new(pool.clone()),
            accounts: AccountRepository::new(pool),
        }
    }

    /// Resolves every column of the holding's active schema. A formula
    /// failure is fatal to that column only; the remaining columns still
    /// resolve.
    pub fn resolve(&self, holding: &Holding) -> Result<Vec<ResolvedColumn>> {
        let account = self.accounts.get_by_id(&holding.account_id)?;
        let schema = self
            .schemas
            .find_by_type_and_mode(account.account_type, account.account_mode)
            .map_err(Error::from)?
            .ok_or_else(|| {
                Error::from(SchemaError::NotFound(format!(
                    "{}/{}",
                    account.account_type, account.account_mode
                )))
            })?;

        let columns = self.schemas.list_columns(&schema.id).map_err(Error::from)?;
        let by_identifier: HashMap<String, SchemaColumn> = columns
            .iter()
            .map(|c| (c.identifier.clone(), c.clone()))
            .collect();

        let mut resolved = Vec::with_capacity(columns.len());
        for column in columns {
            let mut visiting = Vec::new();
            match self.resolve_column(holding, &column, &by_identifier, &mut visiting) {
                Ok(value) => resolved.push(ResolvedColumn { column, value }),
                Err(e) => {
                    error!(
                        "Failed to resolve column '{}' for holding {}: {}",
                        column.identifier, holding.id, e
                    );
                }
            }
        }

        Ok(resolved)
    }

    /// Resolves a single column, propagating any failure.
    pub fn get_value(&self, holding: &Holding, column: &SchemaColumn) -> Result<ColumnValue> {
        let columns = self
            .schemas
            .list_columns(&column.schema_id)
            .map_err(Error::from)?;
        let by_identifier: HashMap<String, SchemaColumn> = columns
            .into_iter()
            .map(|c| (c.identifier.clone(), c))
            .collect();

        let mut visiting = Vec::new();
        self.resolve_column(holding, column, &by_identifier, &mut visiting)
    }

    fn resolve_column(
        &self,
        holding: &Holding,
        column: &SchemaColumn,
        columns: &HashMap<String, SchemaColumn>,
        visiting: &mut Vec<String>,
    ) -> Result<ColumnValue> {
        if visiting.contains(&column.identifier) {
            return Err(FormulaError::CycleDetected(column.identifier.clone()).into());
        }

        // A user override wins over any recomputation.
        if let Some(scv) = self
            .schemas
            .find_value(&column.id, &holding.id)
            .map_err(Error::from)?
        {
            if scv.source == ValueSource::User {
                return match scv.value {
                    Some(raw) => Ok(ColumnValue::parse(&raw, column.data_type)?),
                    None => Ok(ColumnValue::Null),
                };
            }
        }

        match column.source {
            ColumnSource::Formula => {
                visiting.push(column.identifier.clone());
                let value = self.evaluate_formula_column(holding, column, columns, visiting)?;
                visiting.pop();

                self.schemas
                    .upsert_computed_value(
                        &column.id,
                        &holding.id,
                        value.to_stored(),
                        ValueSource::Formula,
                    )
                    .map_err(Error::from)?;
                Ok(value)
            }
            ColumnSource::AssetField | ColumnSource::HoldingField => {
                let value = self.read_field(holding, column)?;
                self.schemas
                    .upsert_computed_value(
                        &column.id,
                        &holding.id,
                        value.to_stored(),
                        ValueSource::System,
                    )
                    .map_err(Error::from)?;
                Ok(value)
            }
            ColumnSource::User => Ok(static_default(column)),
        }
    }

    fn evaluate_formula_column(
        &self,
        holding: &Holding,
        column: &SchemaColumn,
        columns: &HashMap<String, SchemaColumn>,
        visiting: &mut Vec<String>,
    ) -> Result<ColumnValue> {
        let formula_key = column.formula_key.as_deref().ok_or_else(|| {
            Error::from(SchemaError::InvalidColumn(format!(
                "Formula column '{}' has no formula reference",
                column.identifier
            )))
        })?;
        let formula = self.formulas.get_by_key(formula_key).map_err(Error::from)?;

        // Dependencies resolve through this same resolver; identifiers that
        // are not columns of this schema stay absent and evaluate as zero.
        let mut context: HashMap<String, Decimal> = HashMap::new();
        for dependency in &formula.dependencies {
            let Some(dep_column) = columns.get(dependency) else {
                continue;
            };
            let value = self.resolve_column(holding, dep_column, columns, visiting)?;
            if let Some(decimal) = value.as_decimal() {
                context.insert(dependency.clone(), decimal);
            }
        }

        let result = FormulaEvaluator::evaluate(&formula, &context, column.decimal_places())?;
        Ok(ColumnValue::Decimal(result))
    }

    fn read_field(&self, holding: &Holding, column: &SchemaColumn) -> Result<ColumnValue> {
        match column.field_path_descriptor().map_err(Error::from)? {
            FieldPath::Holding(field) => Ok(field.read(holding)),
            FieldPath::Asset(field) => match &holding.asset_id {
                Some(asset_id) => {
                    let view = self.assets.get_view(asset_id)?;
                    Ok(field.read(&view))
                }
                None => Ok(ColumnValue::Null),
            },
        }
    }

    /// Stores a user override after validating it against the column's
    /// constraints. The override wins over recomputation until explicitly
    /// cleared.
    pub fn set_user_value(
        &self,
        holding: &Holding,
        column: &SchemaColumn,
        raw_value: &str,
    ) -> Result<ColumnValue> {
        if !column.is_editable {
            return Err(SchemaError::NotEditable(column.identifier.clone()).into());
        }

        let value = ColumnValue::parse(raw_value, column.data_type)?;
        validate_value(&value, column.data_type, &column.constraints)?;

        self.schemas
            .upsert_user_value(&column.id, &holding.id, value.to_stored())
            .map_err(Error::from)?;
        Ok(value)
    }

    /// Removes a user override and recomputes the column from its source.
    pub fn clear_user_value(&self, holding: &Holding, column: &SchemaColumn) -> Result<ColumnValue> {
        self.schemas
            .delete_user_value(&column.id, &holding.id)
            .map_err(Error::from)?;
        self.get_value(holding, column)
    }

    /// Numeric value of the column with the given identifier; zero when the
    /// column is absent, non-numeric or fails to resolve. Used by the
    /// aggregation engines.
    pub fn get_numeric(&self, holding: &Holding, identifier: &str) -> Decimal {
        self.lookup(holding, identifier)
            .and_then(|v| v.as_decimal())
            .unwrap_or(Decimal::ZERO)
    }

    /// Text value of the column with the given identifier, if any.
    pub fn get_text(&self, holding: &Holding, identifier: &str) -> Option<String> {
        match self.lookup(holding, identifier)? {
            ColumnValue::Null => None,
            value => Some(value.to_string()),
        }
    }

    fn lookup(&self, holding: &Holding, identifier: &str) -> Option<ColumnValue> {
        let account = self.accounts.get_by_id(&holding.account_id).ok()?;
        let schema = self
            .schemas
            .find_by_type_and_mode(account.account_type, account.account_mode)
            .ok()??;
        let column = self
            .schemas
            .find_column_by_identifier(&schema.id, identifier)
            .ok()??;
        self.get_value(holding, &column).ok()
    }
}

fn static_default(column: &SchemaColumn) -> ColumnValue {
    match column.data_type {
        DataType::Decimal => {
            let places = column.decimal_places().unwrap_or(DEFAULT_DECIMAL_PLACES);
            ColumnValue::Decimal(
                Decimal::ZERO.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero),
            )
        }
        DataType::Integer => ColumnValue::Integer(0),
        DataType::String => ColumnValue::Text("-".to_string()),
        _ => ColumnValue::Null,
    }
}
