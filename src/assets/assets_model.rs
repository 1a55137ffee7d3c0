use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::assets_errors::{AssetError, Result};

/// Taxonomy of reference assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Equity,
    Crypto,
    Metal,
    Bond,
    RealEstate,
    Custom,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Equity => "equity",
            AssetType::Crypto => "crypto",
            AssetType::Metal => "metal",
            AssetType::Bond => "bond",
            AssetType::RealEstate => "real_estate",
            AssetType::Custom => "custom",
        }
    }
}

impl FromStr for AssetType {
    type Err = AssetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "equity" => Ok(AssetType::Equity),
            "crypto" => Ok(AssetType::Crypto),
            "metal" => Ok(AssetType::Metal),
            "bond" => Ok(AssetType::Bond),
            "real_estate" => Ok(AssetType::RealEstate),
            "custom" => Ok(AssetType::Custom),
            other => Err(AssetError::InvalidData(format!(
                "Unknown asset type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset classes covered by the snapshot pipeline. Each class has its own
/// snapshot lineage and pointer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Crypto,
    Commodity,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Crypto => "crypto",
            AssetClass::Commodity => "commodity",
        }
    }
}

impl FromStr for AssetClass {
    type Err = AssetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "equity" => Ok(AssetClass::Equity),
            "crypto" => Ok(AssetClass::Crypto),
            "commodity" => Ok(AssetClass::Commodity),
            other => Err(AssetError::InvalidData(format!(
                "Unknown asset class '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical reference entity: one row per tradable or ownable thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub asset_type: AssetType,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub currency: String,
    pub snapshot_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub id: Option<String>,
    pub asset_type: AssetType,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub currency: String,
    pub snapshot_id: Option<String>,
    pub notes: Option<String>,
}

impl NewAsset {
    pub fn validate(&self) -> Result<()> {
        if self.currency.trim().is_empty() {
            return Err(AssetError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        if self.asset_type != AssetType::Custom
            && self
                .symbol
                .as_deref()
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        {
            return Err(AssetError::InvalidData(
                "Market assets require a symbol".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates a user-owned custom asset (never touched by the pipeline).
    pub fn new_custom_asset(name: &str, currency: &str) -> Self {
        Self {
            id: None,
            asset_type: AssetType::Custom,
            symbol: None,
            name: Some(name.to_string()),
            currency: currency.to_string(),
            snapshot_id: None,
            notes: None,
        }
    }
}

/// Type-specific extension record owned by an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AssetDetails {
    Equity(EquityDetails),
    Crypto(CryptoDetails),
    Metal(MetalDetails),
    Bond(BondDetails),
    RealEstate(RealEstateDetails),
    Custom(CustomDetails),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityDetails {
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub isin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoDetails {
    pub base_symbol: String,
    pub quote_symbol: String,
    pub circulating_supply: Option<Decimal>,
    pub total_supply: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalDetails {
    pub metal_code: String,
    pub unit: String,
    pub exchange: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondDetails {
    pub issuer: Option<String>,
    pub maturity_date: Option<NaiveDate>,
    pub coupon_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstateDetails {
    pub location: Option<String>,
    pub property_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDetails {
    pub owner_id: Option<String>,
    pub attributes: serde_json::Value,
    pub reason: Option<String>,
}

/// Latest known price for an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPrice {
    pub asset_id: String,
    pub price: Decimal,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

/// Asset plus its extension record and latest price, as consumed by the
/// column resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    pub asset: Asset,
    pub details: Option<AssetDetails>,
    pub price: Option<AssetPrice>,
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetDB {
    pub id: String,
    pub asset_type: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub currency: String,
    pub snapshot_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AssetDB> for Asset {
    fn from(db: AssetDB) -> Self {
        Asset {
            asset_type: AssetType::from_str(&db.asset_type).unwrap_or(AssetType::Custom),
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            currency: db.currency,
            snapshot_id: db.snapshot_id,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAsset> for AssetDB {
    fn from(domain: NewAsset) -> Self {
        let now = chrono::Utc::now().naive_utc();
        AssetDB {
            id: domain
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            asset_type: domain.asset_type.as_str().to_string(),
            symbol: domain.symbol,
            name: domain.name,
            currency: domain.currency,
            snapshot_id: domain.snapshot_id,
            notes: domain.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::equity_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EquityDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub isin: Option<String>,
}

impl From<EquityDetailsDB> for EquityDetails {
    fn from(db: EquityDetailsDB) -> Self {
        EquityDetails {
            exchange: db.exchange,
            sector: db.sector,
            industry: db.industry,
            country: db.country,
            isin: db.isin,
        }
    }
}

impl EquityDetailsDB {
    pub fn from_details(asset_id: &str, details: &EquityDetails) -> Self {
        EquityDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            exchange: details.exchange.clone(),
            sector: details.sector.clone(),
            industry: details.industry.clone(),
            country: details.country.clone(),
            isin: details.isin.clone(),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::crypto_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CryptoDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub base_symbol: String,
    pub quote_symbol: String,
    pub circulating_supply: Option<String>,
    pub total_supply: Option<String>,
}

impl From<CryptoDetailsDB> for CryptoDetails {
    fn from(db: CryptoDetailsDB) -> Self {
        CryptoDetails {
            base_symbol: db.base_symbol,
            quote_symbol: db.quote_symbol,
            circulating_supply: db
                .circulating_supply
                .and_then(|s| Decimal::from_str(&s).ok()),
            total_supply: db.total_supply.and_then(|s| Decimal::from_str(&s).ok()),
        }
    }
}

impl CryptoDetailsDB {
    pub fn from_details(asset_id: &str, details: &CryptoDetails) -> Self {
        CryptoDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            base_symbol: details.base_symbol.clone(),
            quote_symbol: details.quote_symbol.clone(),
            circulating_supply: details.circulating_supply.map(|d| d.to_string()),
            total_supply: details.total_supply.map(|d| d.to_string()),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::metal_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetalDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub metal_code: String,
    pub unit: String,
    pub exchange: Option<String>,
}

impl From<MetalDetailsDB> for MetalDetails {
    fn from(db: MetalDetailsDB) -> Self {
        MetalDetails {
            metal_code: db.metal_code,
            unit: db.unit,
            exchange: db.exchange,
        }
    }
}

impl MetalDetailsDB {
    pub fn from_details(asset_id: &str, details: &MetalDetails) -> Self {
        MetalDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            metal_code: details.metal_code.clone(),
            unit: details.unit.clone(),
            exchange: details.exchange.clone(),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::bond_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BondDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub issuer: Option<String>,
    pub maturity_date: Option<NaiveDate>,
    pub coupon_rate: Option<String>,
}

impl From<BondDetailsDB> for BondDetails {
    fn from(db: BondDetailsDB) -> Self {
        BondDetails {
            issuer: db.issuer,
            maturity_date: db.maturity_date,
            coupon_rate: db.coupon_rate.and_then(|s| Decimal::from_str(&s).ok()),
        }
    }
}

impl BondDetailsDB {
    pub fn from_details(asset_id: &str, details: &BondDetails) -> Self {
        BondDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            issuer: details.issuer.clone(),
            maturity_date: details.maturity_date,
            coupon_rate: details.coupon_rate.map(|d| d.to_string()),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::real_estate_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RealEstateDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub location: Option<String>,
    pub property_type: Option<String>,
}

impl From<RealEstateDetailsDB> for RealEstateDetails {
    fn from(db: RealEstateDetailsDB) -> Self {
        RealEstateDetails {
            location: db.location,
            property_type: db.property_type,
        }
    }
}

impl RealEstateDetailsDB {
    pub fn from_details(asset_id: &str, details: &RealEstateDetails) -> Self {
        RealEstateDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            location: details.location.clone(),
            property_type: details.property_type.clone(),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::custom_details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CustomDetailsDB {
    pub id: String,
    pub asset_id: String,
    pub owner_id: Option<String>,
    pub attributes: String,
    pub reason: Option<String>,
}

impl From<CustomDetailsDB> for CustomDetails {
    fn from(db: CustomDetailsDB) -> Self {
        CustomDetails {
            owner_id: db.owner_id,
            attributes: serde_json::from_str(&db.attributes)
                .unwrap_or(serde_json::Value::Null),
            reason: db.reason,
        }
    }
}

impl CustomDetailsDB {
    pub fn from_details(asset_id: &str, details: &CustomDetails) -> Self {
        CustomDetailsDB {
            id: uuid::Uuid::new_v4().to_string(),
            asset_id: asset_id.to_string(),
            owner_id: details.owner_id.clone(),
            attributes: details.attributes.to_string(),
            reason: details.reason.clone(),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::asset_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetPriceDB {
    pub id: String,
    pub asset_id: String,
    pub price: String,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<AssetPriceDB> for AssetPrice {
    fn from(db: AssetPriceDB) -> Self {
        AssetPrice {
            asset_id: db.asset_id,
            price: Decimal::from_str(&db.price).unwrap_or(Decimal::ZERO),
            source: db.source,
            updated_at: db.updated_at,
        }
    }
}
