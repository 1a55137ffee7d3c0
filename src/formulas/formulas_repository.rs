use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::formulas;

use super::formulas_errors::{FormulaError, Result};
use super::formulas_model::{Formula, FormulaDB};

/// Repository for managing formula definitions in the database
pub struct FormulaRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl FormulaRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    pub fn get_by_key(&self, key: &str) -> Result<Formula> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FormulaError::InvalidData(e.to_string()))?;

        formulas::table
            .find(key)
            .first::<FormulaDB>(&mut conn)
            .optional()?
            .map(Formula::from)
            .ok_or_else(|| FormulaError::NotFound(key.to_string()))
    }

    pub fn find_by_key(&self, key: &str) -> Result<Option<Formula>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FormulaError::InvalidData(e.to_string()))?;

        Ok(formulas::table
            .find(key)
            .first::<FormulaDB>(&mut conn)
            .optional()?
            .map(Formula::from))
    }

    pub fn list(&self) -> Result<Vec<Formula>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FormulaError::InvalidData(e.to_string()))?;

        let results = formulas::table
            .order(formulas::key.asc())
            .load::<FormulaDB>(&mut conn)?;

        Ok(results.into_iter().map(Formula::from).collect())
    }

    pub fn upsert(&self, formula: FormulaDB) -> Result<Formula> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FormulaError::InvalidData(e.to_string()))?;

        let result = diesel::insert_into(formulas::table)
            .values(&formula)
            .on_conflict(formulas::key)
            .do_update()
            .set((
                formulas::title.eq(&formula.title),
                formulas::expression.eq(&formula.expression),
                formulas::dependencies.eq(&formula.dependencies),
                formulas::decimal_places.eq(formula.decimal_places),
                formulas::is_system.eq(formula.is_system),
            ))
            .get_result::<FormulaDB>(&mut conn)?;

        Ok(result.into())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FormulaError::InvalidData(e.to_string()))?;

        diesel::delete(formulas::table.find(key)).execute(&mut conn)?;
        Ok(())
    }
}
