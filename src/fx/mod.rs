pub(crate) mod fx_errors;
pub(crate) mod fx_model;
pub(crate) mod fx_repository;
pub(crate) mod fx_service;

// Re-export the public interface
pub use fx_errors::FxError;
pub use fx_model::{Currency, ExchangeRate};
pub use fx_repository::FxRepository;
pub use fx_service::FxService;
