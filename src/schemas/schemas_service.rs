use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::info;
use std::sync::Arc;

use crate::accounts::{AccountMode, AccountType};
use crate::formulas::FormulaService;

use super::schemas_config::{default_columns, system_formulas};
use super::schemas_errors::{Result, SchemaError};
use super::schemas_model::{NewSchemaColumn, Schema, SchemaColumn};
use super::schemas_repository::SchemaRepository;

/// Service for schema and column management.
pub struct SchemaService {
    repository: SchemaRepository,
    formulas: FormulaService,
}

impl SchemaService {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            repository: SchemaRepository::new(pool.clone()),
            formulas: FormulaService::new(pool),
        }
    }

    pub fn get_schema(&self, schema_id: &str) -> Result<Schema> {
        self.repository.get_schema(schema_id)
    }

    pub fn get_schema_for(
        &self,
        account_type: AccountType,
        account_mode: AccountMode,
    ) -> Result<Schema> {
        self.repository
            .find_by_type_and_mode(account_type, account_mode)?
            .ok_or_else(|| {
                SchemaError::NotFound(format!("{}/{}", account_type, account_mode))
            })
    }

    pub fn list_columns(&self, schema_id: &str) -> Result<Vec<SchemaColumn>> {
        self.repository.list_columns(schema_id)
    }

    /// Returns the schema for an account type and mode, creating it with the
    /// default column set (and system formulas) on first use.
    pub fn ensure_default_schema(
        &self,
        account_type: AccountType,
        account_mode: AccountMode,
    ) -> Result<Schema> {
        if let Some(existing) = self
            .repository
            .find_by_type_and_mode(account_type, account_mode)?
        {
            return Ok(existing);
        }

        for formula in system_formulas() {
            self.formulas
                .save_system_formula(formula)
                .map_err(|e| SchemaError::InvalidColumn(e.to_string()))?;
        }

        let schema = self.repository.create_schema(
            account_type,
            account_mode,
            &format!("{} {} schema", account_type, account_mode),
        )?;

        for column in default_columns(account_type, account_mode) {
            self.add_column(&schema.id, column)?;
        }

        info!(
            "Created default schema for {}/{}",
            account_type, account_mode
        );
        Ok(schema)
    }

    /// Adds a column after validating its shape, its constraints against the
    /// data type capabilities, and its formula reference.
    pub fn add_column(&self, schema_id: &str, new: NewSchemaColumn) -> Result<SchemaColumn> {
        let column = SchemaColumn {
            id: String::new(),
            schema_id: schema_id.to_string(),
            identifier: new.identifier.clone(),
            title: new.title.clone(),
            data_type: new.data_type,
            source: new.source,
            field_path: new.field_path.clone(),
            formula_key: new.formula_key.clone(),
            constraints: new.constraints.clone(),
            is_editable: new.is_editable,
            is_deletable: new.is_deletable,
            is_system: new.is_system,
            is_default: new.is_default,
            display_order: new.display_order,
        };
        column.validate()?;

        if let Some(formula_key) = &new.formula_key {
            self.formulas
                .get_formula(formula_key)
                .map_err(|e| SchemaError::InvalidColumn(e.to_string()))?;
        }

        if self
            .repository
            .find_column_by_identifier(schema_id, &new.identifier)?
            .is_some()
        {
            return Err(SchemaError::InvalidColumn(format!(
                "Column '{}' already exists in schema",
                new.identifier
            )));
        }

        self.repository.insert_column(schema_id, &new)
    }

    pub fn delete_column(&self, column_id: &str) -> Result<()> {
        let column = self.repository.get_column(column_id)?;
        if !column.is_deletable {
            return Err(SchemaError::NotDeletable(column.identifier));
        }
        self.repository.delete_column(column_id)
    }

    /// Re-initializes an account's column visibility against a schema.
    pub fn init_visibility(&self, account_id: &str, schema_id: &str) -> Result<()> {
        self.repository.reset_visibility(account_id, schema_id)
    }

    pub fn set_column_visibility(
        &self,
        account_id: &str,
        column_id: &str,
        is_visible: bool,
    ) -> Result<()> {
        self.repository
            .set_column_visibility(account_id, column_id, is_visible)
    }

    /// Deletes computed (non-user) column values for the given holdings.
    pub fn delete_computed_values(&self, holding_ids: &[String]) -> Result<usize> {
        self.repository.delete_computed_values(holding_ids)
    }
}
