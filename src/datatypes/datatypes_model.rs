use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Primitive data shapes a schema column can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Decimal,
    Integer,
    String,
    Date,
    Url,
    Boolean,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Decimal => "decimal",
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Url => "url",
            DataType::Boolean => "boolean",
        }
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decimal" => Ok(DataType::Decimal),
            "integer" => Ok(DataType::Integer),
            "string" => Ok(DataType::String),
            "date" => Ok(DataType::Date),
            "url" => Ok(DataType::Url),
            "boolean" => Ok(DataType::Boolean),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown data type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed column value, as produced by the resolver and stored (stringified)
/// in schema_column_values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Decimal(Decimal),
    Integer(i64),
    Text(String),
    Date(NaiveDate),
    Boolean(bool),
    Null,
}

impl ColumnValue {
    /// Parses the canonical string form stored in the value column.
    pub fn parse(raw: &str, data_type: DataType) -> Result<ColumnValue, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(ColumnValue::Null);
        }
        match data_type {
            DataType::Decimal => Decimal::from_str(trimmed)
                .map(ColumnValue::Decimal)
                .map_err(|e| {
                    ValidationError::InvalidInput(format!("'{}' is not a decimal: {}", raw, e))
                }),
            DataType::Integer => trimmed.parse::<i64>().map(ColumnValue::Integer).map_err(|e| {
                ValidationError::InvalidInput(format!("'{}' is not an integer: {}", raw, e))
            }),
            DataType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(ColumnValue::Date)
                .map_err(|e| {
                    ValidationError::InvalidInput(format!("'{}' is not a date: {}", raw, e))
                }),
            DataType::Boolean => match trimmed {
                "true" | "1" => Ok(ColumnValue::Boolean(true)),
                "false" | "0" => Ok(ColumnValue::Boolean(false)),
                other => Err(ValidationError::InvalidInput(format!(
                    "'{}' is not a boolean",
                    other
                ))),
            },
            DataType::String | DataType::Url => Ok(ColumnValue::Text(trimmed.to_string())),
        }
    }

    /// Numeric view of the value. Non-numeric values yield `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ColumnValue::Decimal(d) => Some(*d),
            ColumnValue::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Canonical string form used for persistence.
    pub fn to_stored(&self) -> Option<String> {
        match self {
            ColumnValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Decimal(d) => write!(f, "{}", d),
            ColumnValue::Integer(i) => write!(f, "{}", i),
            ColumnValue::Text(s) => f.write_str(s),
            ColumnValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ColumnValue::Boolean(b) => write!(f, "{}", b),
            ColumnValue::Null => Ok(()),
        }
    }
}
