use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::accounts::{AccountMode, AccountType};
use crate::db::get_connection;
use crate::schema::{schema_column_values, schema_column_visibility, schema_columns, schemas};

use super::schemas_errors::{Result, SchemaError};
use super::schemas_model::{
    ColumnVisibilityDB, NewSchemaColumn, Schema, SchemaColumn, SchemaColumnDB, SchemaColumnValue,
    SchemaColumnValueDB, SchemaDB, ValueSource,
};

/// Repository for schemas, columns, materialized values and visibility
pub struct SchemaRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl SchemaRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| SchemaError::InvalidColumn(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Schemas
    // ------------------------------------------------------------------

    pub fn create_schema(
        &self,
        account_type: AccountType,
        account_mode: AccountMode,
        name: &str,
    ) -> Result<Schema> {
        let mut conn = self.conn()?;

        let row = SchemaDB {
            id: uuid::Uuid::new_v4().to_string(),
            account_type: account_type.as_str().to_string(),
            account_mode: account_mode.as_str().to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let result = diesel::insert_into(schemas::table)
            .values(&row)
            .get_result::<SchemaDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_schema(&self, schema_id: &str) -> Result<Schema> {
        let mut conn = self.conn()?;

        schemas::table
            .find(schema_id)
            .first::<SchemaDB>(&mut conn)
            .optional()?
            .map(Schema::from)
            .ok_or_else(|| SchemaError::NotFound(schema_id.to_string()))
    }

    pub fn find_by_type_and_mode(
        &self,
        account_type: AccountType,
        account_mode: AccountMode,
    ) -> Result<Option<Schema>> {
        let mut conn = self.conn()?;

        Ok(schemas::table
            .filter(schemas::account_type.eq(account_type.as_str()))
            .filter(schemas::account_mode.eq(account_mode.as_str()))
            .first::<SchemaDB>(&mut conn)
            .optional()?
            .map(Schema::from))
    }

    // ------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------

    pub fn insert_column(&self, schema_id: &str, new: &NewSchemaColumn) -> Result<SchemaColumn> {
        let mut conn = self.conn()?;

        let row = SchemaColumnDB::from_new(schema_id, new);

        let result = diesel::insert_into(schema_columns::table)
            .values(&row)
            .get_result::<SchemaColumnDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn get_column(&self, column_id: &str) -> Result<SchemaColumn> {
        let mut conn = self.conn()?;

        schema_columns::table
            .find(column_id)
            .first::<SchemaColumnDB>(&mut conn)
            .optional()?
            .map(SchemaColumn::from)
            .ok_or_else(|| SchemaError::ColumnNotFound(column_id.to_string()))
    }

    /// Columns of one schema, in display order.
    pub fn list_columns(&self, schema_id: &str) -> Result<Vec<SchemaColumn>> {
        let mut conn = self.conn()?;

        let results = schema_columns::table
            .filter(schema_columns::schema_id.eq(schema_id))
            .order((
                schema_columns::display_order.asc(),
                schema_columns::identifier.asc(),
            ))
            .load::<SchemaColumnDB>(&mut conn)?;

        Ok(results.into_iter().map(SchemaColumn::from).collect())
    }

    pub fn find_column_by_identifier(
        &self,
        schema_id: &str,
        identifier: &str,
    ) -> Result<Option<SchemaColumn>> {
        let mut conn = self.conn()?;

        Ok(schema_columns::table
            .filter(schema_columns::schema_id.eq(schema_id))
            .filter(schema_columns::identifier.eq(identifier))
            .first::<SchemaColumnDB>(&mut conn)
            .optional()?
            .map(SchemaColumn::from))
    }

    pub fn delete_column(&self, column_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::delete(schema_columns::table.find(column_id)).execute(&mut conn)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Materialized values
    // ------------------------------------------------------------------

    pub fn find_value(
        &self,
        column_id: &str,
        holding_id: &str,
    ) -> Result<Option<SchemaColumnValue>> {
        let mut conn = self.conn()?;

        Ok(schema_column_values::table
            .filter(schema_column_values::column_id.eq(column_id))
            .filter(schema_column_values::holding_id.eq(holding_id))
            .first::<SchemaColumnValueDB>(&mut conn)
            .optional()?
            .map(SchemaColumnValue::from))
    }

    /// Upserts a computed value. User-sourced rows are never overwritten:
    /// the update is guarded on source, and the fallback insert backs off on
    /// conflict.
    pub fn upsert_computed_value(
        &self,
        column_id: &str,
        holding_id: &str,
        value: Option<String>,
        source: ValueSource,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let now = chrono::Utc::now().naive_utc();

        let updated = diesel::update(
            schema_column_values::table
                .filter(schema_column_values::column_id.eq(column_id))
                .filter(schema_column_values::holding_id.eq(holding_id))
                .filter(schema_column_values::source.ne(ValueSource::User.as_str())),
        )
        .set((
            schema_column_values::value.eq(&value),
            schema_column_values::source.eq(source.as_str()),
            schema_column_values::updated_at.eq(now),
        ))
        .execute(&mut conn)?;

        if updated == 0 {
            let row = SchemaColumnValueDB {
                id: uuid::Uuid::new_v4().to_string(),
                column_id: column_id.to_string(),
                holding_id: holding_id.to_string(),
                value,
                source: source.as_str().to_string(),
                updated_at: now,
            };
            diesel::insert_into(schema_column_values::table)
                .values(&row)
                .on_conflict((
                    schema_column_values::column_id,
                    schema_column_values::holding_id,
                ))
                .do_nothing()
                .execute(&mut conn)?;
        }

        Ok(())
    }

    /// Writes a user override, replacing whatever was materialized before.
    pub fn upsert_user_value(
        &self,
        column_id: &str,
        holding_id: &str,
        value: Option<String>,
    ) -> Result<SchemaColumnValue> {
        let mut conn = self.conn()?;

        let row = SchemaColumnValueDB {
            id: uuid::Uuid::new_v4().to_string(),
            column_id: column_id.to_string(),
            holding_id: holding_id.to_string(),
            value,
            source: ValueSource::User.as_str().to_string(),
            updated_at: chrono::Utc::now().naive_utc(),
        };

        diesel::insert_into(schema_column_values::table)
            .values(&row)
            .on_conflict((
                schema_column_values::column_id,
                schema_column_values::holding_id,
            ))
            .do_update()
            .set((
                schema_column_values::value.eq(&row.value),
                schema_column_values::source.eq(&row.source),
                schema_column_values::updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(schema_column_values::table
            .filter(schema_column_values::column_id.eq(column_id))
            .filter(schema_column_values::holding_id.eq(holding_id))
            .first::<SchemaColumnValueDB>(&mut conn)
            .map(SchemaColumnValue::from)?)
    }

    /// Deletes a user override so the column recomputes from its source.
    pub fn delete_user_value(&self, column_id: &str, holding_id: &str) -> Result<usize> {
        let mut conn = self.conn()?;

        Ok(diesel::delete(
            schema_column_values::table
                .filter(schema_column_values::column_id.eq(column_id))
                .filter(schema_column_values::holding_id.eq(holding_id))
                .filter(schema_column_values::source.eq(ValueSource::User.as_str())),
        )
        .execute(&mut conn)?)
    }

    /// Deletes computed (non-user) values for the given holdings.
    pub fn delete_computed_values(&self, holding_ids: &[String]) -> Result<usize> {
        if holding_ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn()?;

        Ok(diesel::delete(
            schema_column_values::table
                .filter(schema_column_values::holding_id.eq_any(holding_ids))
                .filter(schema_column_values::source.ne(ValueSource::User.as_str())),
        )
        .execute(&mut conn)?)
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Resets visibility rows for an account to the given schema's columns,
    /// all visible.
    pub fn reset_visibility(&self, account_id: &str, schema_id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        diesel::delete(
            schema_column_visibility::table
                .filter(schema_column_visibility::account_id.eq(account_id)),
        )
        .execute(&mut conn)?;

        let column_ids: Vec<String> = schema_columns::table
            .filter(schema_columns::schema_id.eq(schema_id))
            .select(schema_columns::id)
            .load::<String>(&mut conn)?;

        let rows: Vec<ColumnVisibilityDB> = column_ids
            .into_iter()
            .map(|column_id| ColumnVisibilityDB {
                id: uuid::Uuid::new_v4().to_string(),
                account_id: account_id.to_string(),
                column_id,
                is_visible: true,
            })
            .collect();

        if !rows.is_empty() {
            diesel::insert_into(schema_column_visibility::table)
                .values(&rows)
                .execute(&mut conn)?;
        }

        Ok(())
    }

    pub fn list_visible_column_ids(&self, account_id: &str) -> Result<Vec<String>> {
        let mut conn = self.conn()?;

        Ok(schema_column_visibility::table
            .filter(schema_column_visibility::account_id.eq(account_id))
            .filter(schema_column_visibility::is_visible.eq(true))
            .select(schema_column_visibility::column_id)
            .load::<String>(&mut conn)?)
    }

    pub fn set_column_visibility(
        &self,
        account_id: &str,
        column_id: &str,
        is_visible: bool,
    ) -> Result<()> {
        let mut conn = self.conn()?;

        let updated = diesel::update(
            schema_column_visibility::table
                .filter(schema_column_visibility::account_id.eq(account_id))
                .filter(schema_column_visibility::column_id.eq(column_id)),
        )
        .set(schema_column_visibility::is_visible.eq(is_visible))
        .execute(&mut conn)?;

        if updated == 0 {
            diesel::insert_into(schema_column_visibility::table)
                .values(ColumnVisibilityDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    account_id: account_id.to_string(),
                    column_id: column_id.to_string(),
                    is_visible,
                })
                .execute(&mut conn)?;
        }

        Ok(())
    }
}
