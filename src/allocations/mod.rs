pub(crate) mod allocations_engine;
pub(crate) mod allocations_model;
pub(crate) mod allocations_repository;

// Re-export the public interface
pub use allocations_engine::AllocationEngine;
pub use allocations_model::{
    AllocationDimension, AllocationGapResult, AllocationRun, AllocationScenario, AllocationTarget,
};
pub use allocations_repository::AllocationRepository;
