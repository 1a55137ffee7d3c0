use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::formulas_errors::{FormulaError, Result};
use super::formulas_parser::parse_expression;

/// A named arithmetic formula over column identifiers.
///
/// Formulas carry no schema or asset-type knowledge; their dependencies are
/// derived from the expression when the formula is validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub key: String,
    pub title: String,
    pub expression: String,
    pub dependencies: Vec<String>,
    pub decimal_places: Option<u32>,
    pub is_system: bool,
    pub created_at: NaiveDateTime,
}

/// Input model for creating or updating a formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFormula {
    pub key: String,
    pub title: String,
    pub expression: String,
    pub decimal_places: Option<u32>,
    pub is_system: bool,
}

impl NewFormula {
    /// Validates the formula and returns its derived dependency list.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.key.trim().is_empty() {
            return Err(FormulaError::InvalidData(
                "Formula key is required".to_string(),
            ));
        }
        if !self
            .key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(FormulaError::InvalidData(format!(
                "Formula key '{}' must be a snake_case slug",
                self.key
            )));
        }

        let expr = parse_expression(&self.expression)?;
        let dependencies = expr.identifiers();

        if dependencies.iter().any(|ident| ident == &self.key) {
            return Err(FormulaError::InvalidData(
                "Formula cannot reference itself".to_string(),
            ));
        }

        Ok(dependencies)
    }
}

/// Database model for formulas
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::formulas)]
#[diesel(primary_key(key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FormulaDB {
    pub key: String,
    pub title: String,
    pub expression: String,
    pub dependencies: String,
    pub decimal_places: Option<i32>,
    pub is_system: bool,
    pub created_at: NaiveDateTime,
}

impl From<FormulaDB> for Formula {
    fn from(db: FormulaDB) -> Self {
        let dependencies = serde_json::from_str(&db.dependencies).unwrap_or_default();
        Formula {
            key: db.key,
            title: db.title,
            expression: db.expression,
            dependencies,
            decimal_places: db.decimal_places.map(|p| p as u32),
            is_system: db.is_system,
            created_at: db.created_at,
        }
    }
}

impl FormulaDB {
    pub fn from_new(new: NewFormula, dependencies: &[String]) -> Self {
        FormulaDB {
            key: new.key,
            title: new.title,
            expression: new.expression,
            dependencies: serde_json::to_string(dependencies).unwrap_or_else(|_| "[]".to_string()),
            decimal_places: new.decimal_places.map(|p| p as i32),
            is_system: new.is_system,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
