pub(crate) mod aggregation_service;
pub(crate) mod analytics_engine;
pub(crate) mod analytics_model;
pub(crate) mod analytics_repository;
pub(crate) mod dimension_resolver;

// Re-export the public interface
pub use aggregation_service::{AggregationService, BucketRow};
pub use analytics_engine::AnalyticsEngine;
pub use analytics_model::{
    Analytic, AnalyticDimension, AnalyticResult, AnalyticRun, AssetExposure, DimensionType,
    HoldingExposureOverride, RunStatus,
};
pub use analytics_repository::AnalyticsRepository;
pub use dimension_resolver::{BucketContribution, DimensionResolver, UNKNOWN_LABEL};
