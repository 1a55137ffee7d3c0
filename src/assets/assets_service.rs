use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::assets_errors::Result;
use super::assets_model::{Asset, AssetDetails, AssetView, CustomDetails, NewAsset};
use super::assets_repository::AssetRepository;

/// Service for managing assets
pub struct AssetService {
    repository: AssetRepository,
}

impl AssetService {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            repository: AssetRepository::new(pool),
        }
    }

    pub fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        self.repository.get_by_id(asset_id)
    }

    /// Asset plus extension record and latest price, for display and for the
    /// column resolver.
    pub fn get_asset_view(&self, asset_id: &str) -> Result<AssetView> {
        self.repository.get_view(asset_id)
    }

    /// Creates a user-owned custom asset. Custom assets live outside the
    /// snapshot lineages and are never touched by the pipeline.
    pub fn create_custom_asset(
        &self,
        owner_id: Option<&str>,
        name: &str,
        currency: &str,
        attributes: serde_json::Value,
    ) -> Result<Asset> {
        let new_asset = NewAsset::new_custom_asset(name, currency);
        let details = AssetDetails::Custom(CustomDetails {
            owner_id: owner_id.map(str::to_string),
            attributes,
            reason: None,
        });
        self.repository.create(new_asset, Some(&details))
    }
}
