use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormulaError>;

#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Formula '{0}' not found")]
    NotFound(String),

    #[error("Invalid formula syntax: {0}")]
    Parse(String),

    #[error("Error evaluating formula '{key}': {reason}")]
    Evaluation { key: String, reason: String },

    #[error("Division by zero while evaluating formula '{0}'")]
    DivisionByZero(String),

    #[error("Circular dependency detected at column '{0}'")]
    CycleDetected(String),

    #[error("Identifier '{0}' is reserved by a system formula")]
    ReservedIdentifier(String),

    #[error("Invalid formula: {0}")]
    InvalidData(String),
}
