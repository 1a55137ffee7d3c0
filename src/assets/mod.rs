pub(crate) mod assets_errors;
pub(crate) mod assets_model;
pub(crate) mod assets_registry;
pub(crate) mod assets_repository;
pub(crate) mod assets_service;

// Re-export the public interface
pub use assets_model::{
    Asset, AssetClass, AssetDetails, AssetPrice, AssetType, AssetView, BondDetails, CryptoDetails,
    CustomDetails, EquityDetails, MetalDetails, NewAsset, RealEstateDetails,
};
pub use assets_registry::{asset_type_for_class, asset_type_spec, AssetTypeSpec};
pub use assets_repository::AssetRepository;
pub use assets_service::AssetService;

// Re-export error types for convenience
pub use assets_errors::AssetError;
