pub(crate) mod datatypes_model;
pub(crate) mod datatypes_registry;
pub(crate) mod datatypes_validation;

// Re-export the public interface
pub use datatypes_model::{ColumnValue, DataType};
pub use datatypes_registry::{data_type_spec, DataTypeSpec};
pub use datatypes_validation::{validate_constraints, validate_value};
