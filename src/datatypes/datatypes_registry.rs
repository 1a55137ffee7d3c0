use lazy_static::lazy_static;

use super::datatypes_model::DataType;

/// Capability flags for one data type. System-owned; the registry is built
/// once at process initialization and read-only thereafter.
#[derive(Debug, Clone)]
pub struct DataTypeSpec {
    pub data_type: DataType,
    pub supports_length: bool,
    pub supports_decimals: bool,
    pub supports_numeric_limits: bool,
    pub supports_regex: bool,
}

impl DataTypeSpec {
    const fn new(
        data_type: DataType,
        supports_length: bool,
        supports_decimals: bool,
        supports_numeric_limits: bool,
        supports_regex: bool,
    ) -> Self {
        Self {
            data_type,
            supports_length,
            supports_decimals,
            supports_numeric_limits,
            supports_regex,
        }
    }

    /// Constraint names legal for this data type.
    pub fn allows_constraint(&self, name: &str) -> bool {
        match name {
            "decimal_places" => self.supports_decimals,
            "min" | "max" => self.supports_numeric_limits,
            "character_limit" | "character_minimum" | "all_caps" => self.supports_length,
            "regex" => self.supports_regex,
            _ => false,
        }
    }
}

lazy_static! {
    static ref DATA_TYPE_REGISTRY: Vec<DataTypeSpec> = vec![
        DataTypeSpec::new(DataType::Decimal, false, true, true, false),
        DataTypeSpec::new(DataType::Integer, false, false, true, false),
        DataTypeSpec::new(DataType::String, true, false, false, true),
        DataTypeSpec::new(DataType::Url, true, false, false, true),
        DataTypeSpec::new(DataType::Date, false, false, false, false),
        DataTypeSpec::new(DataType::Boolean, false, false, false, false),
    ];
}

pub fn data_type_spec(data_type: DataType) -> &'static DataTypeSpec {
    DATA_TYPE_REGISTRY
        .iter()
        .find(|spec| spec.data_type == data_type)
        .expect("every data type is registered")
}
