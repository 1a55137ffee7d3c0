use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::formulas_errors::{FormulaError, Result};
use super::formulas_model::{Formula, FormulaDB, NewFormula};
use super::formulas_repository::FormulaRepository;

/// Service for managing the formula registry.
///
/// System formula keys are globally reserved: user-defined formulas may not
/// take, replace or delete them.
pub struct FormulaService {
    repository: FormulaRepository,
}

impl FormulaService {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            repository: FormulaRepository::new(pool),
        }
    }

    pub fn get_formula(&self, key: &str) -> Result<Formula> {
        self.repository.get_by_key(key)
    }

    pub fn list_formulas(&self) -> Result<Vec<Formula>> {
        self.repository.list()
    }

    /// Creates or updates a user formula. Rejects collisions with reserved
    /// system identifiers.
    pub fn save_formula(&self, new_formula: NewFormula) -> Result<Formula> {
        let dependencies = new_formula.validate()?;

        if let Some(existing) = self.repository.find_by_key(&new_formula.key)? {
            if existing.is_system && !new_formula.is_system {
                return Err(FormulaError::ReservedIdentifier(new_formula.key));
            }
        }

        debug!(
            "Saving formula '{}' with dependencies {:?}",
            new_formula.key, dependencies
        );
        self.repository
            .upsert(FormulaDB::from_new(new_formula, &dependencies))
    }

    /// Registers a system formula, overwriting any previous definition.
    pub fn save_system_formula(&self, mut new_formula: NewFormula) -> Result<Formula> {
        new_formula.is_system = true;
        let dependencies = new_formula.validate()?;
        self.repository
            .upsert(FormulaDB::from_new(new_formula, &dependencies))
    }

    pub fn delete_formula(&self, key: &str) -> Result<()> {
        let formula = self.repository.get_by_key(key)?;
        if formula.is_system {
            return Err(FormulaError::ReservedIdentifier(key.to_string()));
        }
        self.repository.delete(key)
    }
}
