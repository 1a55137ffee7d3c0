pub(crate) mod holdings_errors;
pub(crate) mod holdings_model;
pub(crate) mod holdings_repository;

// Re-export the public interface
pub use holdings_errors::HoldingError;
pub use holdings_model::{Holding, HoldingSource, NewHolding};
pub use holdings_repository::HoldingRepository;
