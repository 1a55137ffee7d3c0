use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;
use std::str::FromStr;

use crate::errors::ValidationError;

use super::datatypes_model::{ColumnValue, DataType};
use super::datatypes_registry::data_type_spec;

type Result<T> = std::result::Result<T, ValidationError>;

/// Checks that every constraint key is legal for the data type's capability
/// flags. Called when a column definition is created or edited.
pub fn validate_constraints(data_type: DataType, constraints: &JsonValue) -> Result<()> {
    let map = match constraints {
        JsonValue::Null => return Ok(()),
        JsonValue::Object(map) => map,
        _ => {
            return Err(ValidationError::InvalidInput(
                "Constraints must be an object".to_string(),
            ))
        }
    };

    let spec = data_type_spec(data_type);
    for name in map.keys() {
        if !spec.allows_constraint(name) {
            return Err(ValidationError::InvalidInput(format!(
                "Constraint '{}' is not supported by data type '{}'",
                name, data_type
            )));
        }
    }

    if let Some(pattern) = constraint_str(constraints, "regex") {
        Regex::new(&pattern).map_err(|e| {
            ValidationError::InvalidInput(format!("Invalid regex constraint: {}", e))
        })?;
    }

    Ok(())
}

/// Validates a single value against a column's constraints. Pure; never
/// partially applies anything.
pub fn validate_value(
    value: &ColumnValue,
    data_type: DataType,
    constraints: &JsonValue,
) -> Result<()> {
    validate_constraints(data_type, constraints)?;

    if value.is_null() {
        return Ok(());
    }

    match data_type {
        DataType::Decimal | DataType::Integer => {
            let numeric = value.as_decimal().ok_or_else(|| {
                ValidationError::InvalidInput(format!("'{}' is not numeric", value))
            })?;
            validate_numeric(numeric, constraints)
        }
        DataType::String | DataType::Url => match value {
            ColumnValue::Text(text) => validate_text(text, constraints),
            other => Err(ValidationError::InvalidInput(format!(
                "'{}' is not a string",
                other
            ))),
        },
        DataType::Date | DataType::Boolean => Ok(()),
    }
}

fn validate_numeric(numeric: Decimal, constraints: &JsonValue) -> Result<()> {
    if let Some(places) = constraint_u32(constraints, "decimal_places") {
        let quantized =
            numeric.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        if quantized != numeric {
            return Err(ValidationError::InvalidInput(format!(
                "Value {} has more than {} decimal places",
                numeric, places
            )));
        }
    }

    if let Some(min) = constraint_decimal(constraints, "min") {
        if numeric < min {
            return Err(ValidationError::InvalidInput(format!(
                "Value {} is below minimum {}",
                numeric, min
            )));
        }
    }

    if let Some(max) = constraint_decimal(constraints, "max") {
        if numeric > max {
            return Err(ValidationError::InvalidInput(format!(
                "Value {} exceeds maximum {}",
                numeric, max
            )));
        }
    }

    Ok(())
}

fn validate_text(text: &str, constraints: &JsonValue) -> Result<()> {
    if let Some(limit) = constraint_u32(constraints, "character_limit") {
        if text.chars().count() as u32 > limit {
            return Err(ValidationError::InvalidInput(format!(
                "Value exceeds maximum length {}",
                limit
            )));
        }
    }

    if let Some(minimum) = constraint_u32(constraints, "character_minimum") {
        if (text.chars().count() as u32) < minimum {
            return Err(ValidationError::InvalidInput(format!(
                "Value is shorter than minimum length {}",
                minimum
            )));
        }
    }

    if constraint_bool(constraints, "all_caps") && text != text.to_uppercase() {
        return Err(ValidationError::InvalidInput(
            "Value must be upper case".to_string(),
        ));
    }

    if let Some(pattern) = constraint_str(constraints, "regex") {
        let re = Regex::new(&pattern).map_err(|e| {
            ValidationError::InvalidInput(format!("Invalid regex constraint: {}", e))
        })?;
        if !re.is_match(text) {
            return Err(ValidationError::InvalidInput(format!(
                "Value does not match pattern '{}'",
                pattern
            )));
        }
    }

    Ok(())
}

fn constraint_decimal(constraints: &JsonValue, name: &str) -> Option<Decimal> {
    match constraints.get(name)? {
        JsonValue::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        JsonValue::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

fn constraint_u32(constraints: &JsonValue, name: &str) -> Option<u32> {
    constraints.get(name)?.as_u64().map(|v| v as u32)
}

fn constraint_bool(constraints: &JsonValue, name: &str) -> bool {
    constraints
        .get(name)
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn constraint_str(constraints: &JsonValue, name: &str) -> Option<String> {
    constraints
        .get(name)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn decimal_places_round_trip() {
        let constraints = json!({ "decimal_places": 2 });
        assert!(validate_value(
            &ColumnValue::Decimal(dec!(10.25)),
            DataType::Decimal,
            &constraints
        )
        .is_ok());

        assert!(validate_value(
            &ColumnValue::Decimal(dec!(10.251)),
            DataType::Decimal,
            &constraints
        )
        .is_err());
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let constraints = json!({ "min": 0, "max": 100 });
        assert!(validate_value(
            &ColumnValue::Decimal(dec!(0)),
            DataType::Decimal,
            &constraints
        )
        .is_ok());
        assert!(validate_value(
            &ColumnValue::Decimal(dec!(100)),
            DataType::Decimal,
            &constraints
        )
        .is_ok());
        assert!(validate_value(
            &ColumnValue::Decimal(dec!(100.01)),
            DataType::Decimal,
            &constraints
        )
        .is_err());
        assert!(validate_value(
            &ColumnValue::Decimal(dec!(-0.5)),
            DataType::Decimal,
            &constraints
        )
        .is_err());
    }

    #[test]
    fn string_length_and_caps() {
        let constraints = json!({ "character_limit": 5, "all_caps": true });
        assert!(validate_value(
            &ColumnValue::Text("BTC".to_string()),
            DataType::String,
            &constraints
        )
        .is_ok());
        assert!(validate_value(
            &ColumnValue::Text("btc".to_string()),
            DataType::String,
            &constraints
        )
        .is_err());
        assert!(validate_value(
            &ColumnValue::Text("TOOLONG".to_string()),
            DataType::String,
            &constraints
        )
        .is_err());
    }

    #[test]
    fn regex_constraint_on_string() {
        let constraints = json!({ "regex": "^[A-Z]{1,5}$" });
        assert!(validate_value(
            &ColumnValue::Text("AAPL".to_string()),
            DataType::String,
            &constraints
        )
        .is_ok());
        assert!(validate_value(
            &ColumnValue::Text("aapl".to_string()),
            DataType::String,
            &constraints
        )
        .is_err());
    }

    #[test]
    fn capability_flags_gate_constraint_names() {
        // regex is a string capability, not a decimal one
        let constraints = json!({ "regex": ".*" });
        assert!(validate_constraints(DataType::Decimal, &constraints).is_err());

        // decimal_places is not legal on strings
        let constraints = json!({ "decimal_places": 2 });
        assert!(validate_constraints(DataType::String, &constraints).is_err());
    }

    #[test]
    fn null_values_pass_constraint_checks() {
        let constraints = json!({ "min": 10 });
        assert!(validate_value(&ColumnValue::Null, DataType::Decimal, &constraints).is_ok());
    }
}
