use lazy_static::lazy_static;

use super::assets_model::{AssetClass, AssetType};

/// Static registration entry for one asset type.
///
/// Built once at process initialization and read-only thereafter; this is the
/// single place that knows which extension record an asset type owns and
/// which snapshot lineage (if any) feeds it.
#[derive(Debug, Clone)]
pub struct AssetTypeSpec {
    pub asset_type: AssetType,
    /// Snapshot lineage that seeds this type; None for user-owned types.
    pub asset_class: Option<AssetClass>,
    /// Whether rows of this type are created exclusively by the pipeline.
    pub is_market: bool,
}

lazy_static! {
    static ref ASSET_TYPE_REGISTRY: Vec<AssetTypeSpec> = vec![
        AssetTypeSpec {
            asset_type: AssetType::Equity,
            asset_class: Some(AssetClass::Equity),
            is_market: true,
        },
        AssetTypeSpec {
            asset_type: AssetType::Crypto,
            asset_class: Some(AssetClass::Crypto),
            is_market: true,
        },
        AssetTypeSpec {
            asset_type: AssetType::Metal,
            asset_class: Some(AssetClass::Commodity),
            is_market: true,
        },
        AssetTypeSpec {
            asset_type: AssetType::Bond,
            asset_class: None,
            is_market: false,
        },
        AssetTypeSpec {
            asset_type: AssetType::RealEstate,
            asset_class: None,
            is_market: false,
        },
        AssetTypeSpec {
            asset_type: AssetType::Custom,
            asset_class: None,
            is_market: false,
        },
    ];
}

pub fn asset_type_spec(asset_type: AssetType) -> &'static AssetTypeSpec {
    ASSET_TYPE_REGISTRY
        .iter()
        .find(|spec| spec.asset_type == asset_type)
        .expect("every asset type is registered")
}

/// The asset type seeded by a snapshot class.
pub fn asset_type_for_class(asset_class: AssetClass) -> AssetType {
    ASSET_TYPE_REGISTRY
        .iter()
        .find(|spec| spec.asset_class == Some(asset_class))
        .map(|spec| spec.asset_type)
        .expect("every asset class seeds a registered type")
}
