pub(crate) mod column_resolver;
pub(crate) mod recalc_service;
pub(crate) mod schemas_config;
pub(crate) mod schemas_errors;
pub(crate) mod schemas_model;
pub(crate) mod schemas_repository;
pub(crate) mod schemas_service;

// Re-export the public interface
pub use column_resolver::{ColumnValueResolver, ResolvedColumn};
pub use recalc_service::RecalcService;
pub use schemas_model::{
    AssetField, ColumnSource, ColumnVisibility, FieldPath, HoldingField, NewSchemaColumn, Schema,
    SchemaColumn, SchemaColumnValue, ValueSource,
};
pub use schemas_repository::SchemaRepository;
pub use schemas_service::SchemaService;

// Re-export error types for convenience
pub use schemas_errors::SchemaError;
