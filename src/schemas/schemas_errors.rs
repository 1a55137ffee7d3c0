use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Schema column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid schema column: {0}")]
    InvalidColumn(String),

    #[error("Column '{0}' is not editable")]
    NotEditable(String),

    #[error("Column '{0}' is not deletable")]
    NotDeletable(String),
}
