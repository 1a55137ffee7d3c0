use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{
    asset_prices, assets, bond_details, crypto_details, custom_details, equity_details,
    metal_details, real_estate_details,
};

use super::assets_errors::{AssetError, Result};
use super::assets_model::{
    Asset, AssetDB, AssetDetails, AssetPrice, AssetPriceDB, AssetType, AssetView, BondDetailsDB,
    CryptoDetailsDB, CustomDetailsDB, EquityDetailsDB, MetalDetailsDB, NewAsset,
    RealEstateDetailsDB,
};

/// Repository for managing asset data in the database
pub struct AssetRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl AssetRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| AssetError::InvalidData(e.to_string()))
    }

    pub fn create(&self, new_asset: NewAsset, details: Option<&AssetDetails>) -> Result<Asset> {
        let mut conn = self.conn()?;
        Self::create_with_conn(&mut conn, new_asset, details)
    }

    /// Creates an asset and its extension record. Takes a connection so
    /// snapshot builds can batch many creates inside one transaction.
    pub fn create_with_conn(
        conn: &mut SqliteConnection,
        new_asset: NewAsset,
        details: Option<&AssetDetails>,
    ) -> Result<Asset> {
        new_asset.validate()?;
        let asset_db: AssetDB = new_asset.into();

        let created = diesel::insert_into(assets::table)
            .values(&asset_db)
            .get_result::<AssetDB>(conn)?;

        if let Some(details) = details {
            Self::insert_details(conn, &created.id, details)?;
        }

        Ok(created.into())
    }

    fn insert_details(
        conn: &mut SqliteConnection,
        asset_id: &str,
        details: &AssetDetails,
    ) -> Result<()> {
        match details {
            AssetDetails::Equity(d) => {
                diesel::insert_into(equity_details::table)
                    .values(EquityDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
            AssetDetails::Crypto(d) => {
                diesel::insert_into(crypto_details::table)
                    .values(CryptoDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
            AssetDetails::Metal(d) => {
                diesel::insert_into(metal_details::table)
                    .values(MetalDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
            AssetDetails::Bond(d) => {
                diesel::insert_into(bond_details::table)
                    .values(BondDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
            AssetDetails::RealEstate(d) => {
                diesel::insert_into(real_estate_details::table)
                    .values(RealEstateDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
            AssetDetails::Custom(d) => {
                diesel::insert_into(custom_details::table)
                    .values(CustomDetailsDB::from_details(asset_id, d))
                    .execute(conn)?;
            }
        }
        Ok(())
    }

    pub fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        let mut conn = self.conn()?;

        assets::table
            .find(asset_id)
            .first::<AssetDB>(&mut conn)
            .optional()?
            .map(Asset::from)
            .ok_or_else(|| AssetError::NotFound(asset_id.to_string()))
    }

    pub fn find_by_type_and_symbol(
        &self,
        asset_type: AssetType,
        symbol: &str,
        snapshot_id: Option<&str>,
    ) -> Result<Option<Asset>> {
        let mut conn = self.conn()?;

        let mut query = assets::table
            .filter(assets::asset_type.eq(asset_type.as_str()))
            .filter(assets::symbol.eq(symbol))
            .into_boxed();

        if let Some(snapshot_id) = snapshot_id {
            query = query.filter(assets::snapshot_id.eq(snapshot_id));
        }

        Ok(query
            .first::<AssetDB>(&mut conn)
            .optional()?
            .map(Asset::from))
    }

    pub fn list_by_type_and_snapshot(
        &self,
        asset_type: AssetType,
        snapshot_id: &str,
    ) -> Result<Vec<Asset>> {
        let mut conn = self.conn()?;

        let results = assets::table
            .filter(assets::asset_type.eq(asset_type.as_str()))
            .filter(assets::snapshot_id.eq(snapshot_id))
            .load::<AssetDB>(&mut conn)?;

        Ok(results.into_iter().map(Asset::from).collect())
    }

    pub fn list_ids_by_currency(&self, currency: &str) -> Result<Vec<String>> {
        let mut conn = self.conn()?;

        Ok(assets::table
            .filter(assets::currency.eq(currency))
            .select(assets::id)
            .load::<String>(&mut conn)?)
    }

    /// The extension record for an asset, dispatched through the asset type.
    pub fn get_details(&self, asset: &Asset) -> Result<Option<AssetDetails>> {
        let mut conn = self.conn()?;

        let details = match asset.asset_type {
            AssetType::Equity => equity_details::table
                .filter(equity_details::asset_id.eq(&asset.id))
                .first::<EquityDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::Equity(d.into())),
            AssetType::Crypto => crypto_details::table
                .filter(crypto_details::asset_id.eq(&asset.id))
                .first::<CryptoDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::Crypto(d.into())),
            AssetType::Metal => metal_details::table
                .filter(metal_details::asset_id.eq(&asset.id))
                .first::<MetalDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::Metal(d.into())),
            AssetType::Bond => bond_details::table
                .filter(bond_details::asset_id.eq(&asset.id))
                .first::<BondDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::Bond(d.into())),
            AssetType::RealEstate => real_estate_details::table
                .filter(real_estate_details::asset_id.eq(&asset.id))
                .first::<RealEstateDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::RealEstate(d.into())),
            AssetType::Custom => custom_details::table
                .filter(custom_details::asset_id.eq(&asset.id))
                .first::<CustomDetailsDB>(&mut conn)
                .optional()?
                .map(|d| AssetDetails::Custom(d.into())),
        };

        Ok(details)
    }

    pub fn get_view(&self, asset_id: &str) -> Result<AssetView> {
        let asset = self.get_by_id(asset_id)?;
        let details = self.get_details(&asset)?;
        let price = self.get_price(asset_id)?;
        Ok(AssetView {
            asset,
            details,
            price,
        })
    }

    pub fn get_price(&self, asset_id: &str) -> Result<Option<AssetPrice>> {
        let mut conn = self.conn()?;

        Ok(asset_prices::table
            .filter(asset_prices::asset_id.eq(asset_id))
            .first::<AssetPriceDB>(&mut conn)
            .optional()?
            .map(AssetPrice::from))
    }

    pub fn upsert_price(&self, asset_id: &str, price: Decimal, source: &str) -> Result<AssetPrice> {
        let mut conn = self.conn()?;

        let row = AssetPriceDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            price: price.to_string(),
            source: source.to_string(),
            updated_at: chrono::Utc::now().naive_utc(),
        };

        diesel::insert_into(asset_prices::table)
            .values(&row)
            .on_conflict(asset_prices::asset_id)
            .do_update()
            .set((
                asset_prices::price.eq(&row.price),
                asset_prices::source.eq(&row.source),
                asset_prices::updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(asset_prices::table
            .filter(asset_prices::asset_id.eq(asset_id))
            .first::<AssetPriceDB>(&mut conn)
            .map(AssetPrice::from)?)
    }

    /// Snapshot ids present for one asset type, most recent first.
    pub fn list_snapshot_ids(&self, asset_type: AssetType) -> Result<Vec<String>> {
        let mut conn = self.conn()?;

        let rows: Vec<(Option<String>, NaiveDateTime)> = assets::table
            .filter(assets::asset_type.eq(asset_type.as_str()))
            .select((assets::snapshot_id, assets::created_at))
            .load(&mut conn)?;

        let mut latest: Vec<(String, NaiveDateTime)> = Vec::new();
        for (snapshot_id, created_at) in rows {
            let Some(snapshot_id) = snapshot_id else {
                continue;
            };
            match latest.iter_mut().find(|(id, _)| *id == snapshot_id) {
                Some((_, seen)) => {
                    if created_at > *seen {
                        *seen = created_at;
                    }
                }
                None => latest.push((snapshot_id, created_at)),
            }
        }

        latest.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(latest.into_iter().map(|(id, _)| id).collect())
    }

    /// Deletes all assets of a type belonging to the given snapshots.
    /// Extension records and prices cascade.
    pub fn delete_snapshots(
        &self,
        asset_type: AssetType,
        snapshot_ids: &[String],
    ) -> Result<usize> {
        if snapshot_ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn()?;

        Ok(diesel::delete(
            assets::table
                .filter(assets::asset_type.eq(asset_type.as_str()))
                .filter(assets::snapshot_id.eq_any(snapshot_ids)),
        )
        .execute(&mut conn)?)
    }
}
