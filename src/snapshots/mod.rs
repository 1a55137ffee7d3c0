pub(crate) mod seed_service;
pub(crate) mod snapshots_model;
pub(crate) mod snapshots_repository;

// Re-export the public interface
pub use seed_service::{split_crypto_pair, SeedService};
pub use snapshots_model::{SeedSummary, SnapshotPointer, SyncSummary};
pub use snapshots_repository::SnapshotRepository;
