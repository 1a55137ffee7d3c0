use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::assets::{
    asset_type_for_class, AssetClass, AssetDetails, AssetError, AssetRepository, CryptoDetails,
    EquityDetails, MetalDetails, NewAsset,
};
use crate::constants::SNAPSHOT_RETENTION;
use crate::db::get_connection;
use crate::errors::{Error, Result};
use crate::fx::FxRepository;
use crate::holdings::HoldingRepository;
use crate::market_data::MarketDataProvider;
use crate::schemas::RecalcService;

use super::snapshots_model::{SeedSummary, SyncSummary};
use super::snapshots_repository::SnapshotRepository;

/// Quote currencies recognized when splitting crypto pair symbols.
/// Order matters: longest first.
const KNOWN_QUOTES: [&str; 5] = ["USDT", "USDC", "USD", "EUR", "GBP"];

/// Splits a crypto pair symbol into base and quote ("ETHUSDT" -> ETH/USDT).
pub fn split_crypto_pair(pair_symbol: &str) -> Option<(String, String)> {
    let pair = pair_symbol.trim().to_uppercase();
    for quote in KNOWN_QUOTES {
        if pair.ends_with(quote) && pair.len() > quote.len() {
            let base = &pair[..pair.len() - quote.len()];
            return Some((base.to_string(), quote.to_string()));
        }
    }
    None
}

/// Rebuilds reference-data universes using a snapshot strategy.
///
/// Each run builds an entirely new generation of rows tagged with a fresh
/// snapshot id, then swaps the class pointer in a single atomic write. The
/// previous generation stays fully queryable until cleanup removes it.
///
/// Holding reconciliation rules (per class):
/// - asset-backed holding whose symbol exists in the new universe -> relink
/// - asset-backed holding whose symbol vanished -> becomes custom
/// - custom holdings are never auto-relinked
pub struct SeedService {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    provider: Arc<dyn MarketDataProvider>,
    assets: AssetRepository,
    snapshots: SnapshotRepository,
    holdings: HoldingRepository,
    fx: FxRepository,
    recalc: Arc<RecalcService>,
}

impl SeedService {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        provider: Arc<dyn MarketDataProvider>,
        recalc: Arc<RecalcService>,
    ) -> Self {
        Self {
            assets: AssetRepository::new(pool.clone()),
            snapshots: SnapshotRepository::new(pool.clone()),
            holdings: HoldingRepository::new(pool.clone()),
            fx: FxRepository::new(pool.clone()),
            pool,
            provider,
            recalc,
        }
    }

    /// Seeds the full equity universe into a new snapshot.
    pub async fn seed_equities(&self) -> Result<SeedSummary> {
        // Provider fetch happens before any transaction is opened.
        let rows = self.provider.get_equities().await.map_err(Error::from)?;

        let snapshot_id = Uuid::new_v4().to_string();
        let mut created = 0usize;
        let mut skipped = 0usize;

        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<_, Error, _>(|conn| {
            for row in &rows {
                let symbol = match normalize_symbol(row.symbol.as_deref()) {
                    Some(s) => s,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };
                let currency = match normalize_symbol(row.currency.as_deref()) {
                    Some(c) => c,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };

                let details = AssetDetails::Equity(EquityDetails {
                    exchange: row.exchange.clone(),
                    sector: row.sector.clone(),
                    industry: row.industry.clone(),
                    country: row.country.clone(),
                    isin: row.isin.clone(),
                });

                AssetRepository::create_with_conn(
                    conn,
                    NewAsset {
                        id: None,
                        asset_type: asset_type_for_class(AssetClass::Equity),
                        symbol: Some(symbol),
                        name: row.name.clone(),
                        currency,
                        snapshot_id: Some(snapshot_id.clone()),
                        notes: None,
                    },
                    Some(&details),
                )?;
                created += 1;
            }
            Ok(())
        })?;

        self.activate_and_reconcile(AssetClass::Equity, &snapshot_id)?;

        info!(
            "Equity seed complete: snapshot {}, {} created, {} skipped",
            snapshot_id, created, skipped
        );
        Ok(SeedSummary {
            snapshot_id,
            created,
            skipped,
        })
    }

    /// Seeds the crypto pair universe into a new snapshot. Rows whose pair
    /// cannot be split or whose quote currency is unknown are skipped.
    pub async fn seed_crypto(&self) -> Result<SeedSummary> {
        let rows = self
            .provider
            .get_cryptocurrencies()
            .await
            .map_err(Error::from)?;

        let snapshot_id = Uuid::new_v4().to_string();
        let mut created = 0usize;
        let mut skipped = 0usize;

        // Currency existence is checked against the seeded FX universe.
        let known_currencies: Vec<String> = self
            .fx
            .list_currencies()
            .map_err(Error::from)?
            .into_iter()
            .map(|c| c.code)
            .collect();

        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<_, Error, _>(|conn| {
            for row in &rows {
                let pair_symbol = match normalize_symbol(row.symbol.as_deref()) {
                    Some(s) => s,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };
                let Some((base_symbol, quote_symbol)) = split_crypto_pair(&pair_symbol) else {
                    skipped += 1;
                    continue;
                };
                if !known_currencies.contains(&quote_symbol) {
                    skipped += 1;
                    continue;
                }

                let details = AssetDetails::Crypto(CryptoDetails {
                    base_symbol,
                    quote_symbol: quote_symbol.clone(),
                    circulating_supply: row.circulating_supply,
                    total_supply: row.total_supply,
                });

                AssetRepository::create_with_conn(
                    conn,
                    NewAsset {
                        id: None,
                        asset_type: asset_type_for_class(AssetClass::Crypto),
                        symbol: Some(pair_symbol),
                        name: row.name.clone(),
                        currency: quote_symbol,
                        snapshot_id: Some(snapshot_id.clone()),
                        notes: None,
                    },
                    Some(&details),
                )?;
                created += 1;
            }
            Ok(())
        })?;

        self.activate_and_reconcile(AssetClass::Crypto, &snapshot_id)?;

        info!(
            "Crypto seed complete: snapshot {}, {} created, {} skipped",
            snapshot_id, created, skipped
        );
        Ok(SeedSummary {
            snapshot_id,
            created,
            skipped,
        })
    }

    /// Seeds the commodity universe (metals) into a new snapshot.
    pub async fn seed_commodities(&self) -> Result<SeedSummary> {
        let rows = self.provider.get_commodities().await.map_err(Error::from)?;

        let snapshot_id = Uuid::new_v4().to_string();
        let mut created = 0usize;
        let mut skipped = 0usize;

        let mut conn = get_connection(&self.pool)?;
        conn.transaction::<_, Error, _>(|conn| {
            for row in &rows {
                let symbol = match normalize_symbol(row.symbol.as_deref()) {
                    Some(s) => s,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };
                let currency = match normalize_symbol(row.currency.as_deref()) {
                    Some(c) => c,
                    None => {
                        skipped += 1;
                        continue;
                    }
                };

                let metal_code = row
                    .name
                    .as_deref()
                    .map(|n| n.trim().to_lowercase().replace(' ', "_"))
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| symbol.to_lowercase());

                let details = AssetDetails::Metal(MetalDetails {
                    metal_code,
                    unit: row
                        .unit
                        .clone()
                        .unwrap_or_else(|| "troy_ounce".to_string()),
                    exchange: row.exchange.clone(),
                });

                AssetRepository::create_with_conn(
                    conn,
                    NewAsset {
                        id: None,
                        asset_type: asset_type_for_class(AssetClass::Commodity),
                        symbol: Some(symbol),
                        name: row.name.clone(),
                        currency,
                        snapshot_id: Some(snapshot_id.clone()),
                        notes: None,
                    },
                    Some(&details),
                )?;
                created += 1;
            }
            Ok(())
        })?;

        self.activate_and_reconcile(AssetClass::Commodity, &snapshot_id)?;

        info!(
            "Commodity seed complete: snapshot {}, {} created, {} skipped",
            snapshot_id, created, skipped
        );
        Ok(SeedSummary {
            snapshot_id,
            created,
            skipped,
        })
    }

    fn activate_and_reconcile(&self, class: AssetClass, snapshot_id: &str) -> Result<()> {
        // Activation is its own atomic write, separate from the build
        // transaction.
        self.snapshots.swap(class, snapshot_id).map_err(Error::from)?;
        self.reconcile(class)?;
        self.cleanup(class, SNAPSHOT_RETENTION)?;
        Ok(())
    }

    /// Relinks asset-backed holdings of one class against the active
    /// snapshot; holdings whose symbol left the universe become custom.
    pub fn reconcile(&self, class: AssetClass) -> Result<usize> {
        let asset_type = asset_type_for_class(class);
        let pointer = self
            .snapshots
            .get(class)
            .map_err(Error::from)?
            .ok_or_else(|| AssetError::NoActiveSnapshot(class.as_str().to_string()))?;

        let active_assets = self
            .assets
            .list_by_type_and_snapshot(asset_type, &pointer.snapshot_id)
            .map_err(Error::from)?;
        let assets_by_symbol: HashMap<String, String> = active_assets
            .into_iter()
            .filter_map(|a| a.symbol.clone().map(|s| (s, a.id)))
            .collect();

        let mut touched = 0usize;
        for holding in self.holdings.list_asset_backed().map_err(Error::from)? {
            // Only holdings of this class take part; other lineages are
            // untouched.
            let current_asset = match &holding.asset_id {
                Some(asset_id) => match self.assets.get_by_id(asset_id) {
                    Ok(asset) => Some(asset),
                    Err(AssetError::NotFound(_)) => None,
                    Err(e) => return Err(e.into()),
                },
                None => None,
            };
            if let Some(asset) = &current_asset {
                if asset.asset_type != asset_type {
                    continue;
                }
            } else if holding.original_symbol.is_none() {
                // No asset and no symbol: cannot relink anywhere.
                self.holdings
                    .detach_to_custom(&holding.id)
                    .map_err(Error::from)?;
                touched += 1;
                continue;
            } else {
                continue;
            }

            let symbol = holding
                .original_symbol
                .clone()
                .or_else(|| current_asset.as_ref().and_then(|a| a.symbol.clone()));

            match symbol.and_then(|s| assets_by_symbol.get(&s).cloned()) {
                Some(new_asset_id) => {
                    if holding.asset_id.as_deref() != Some(new_asset_id.as_str()) {
                        self.holdings
                            .relink(&holding.id, &new_asset_id)
                            .map_err(Error::from)?;
                        touched += 1;
                    }
                }
                None => {
                    self.holdings
                        .detach_to_custom(&holding.id)
                        .map_err(Error::from)?;
                    touched += 1;
                }
            }
        }

        Ok(touched)
    }

    /// Deletes snapshot generations that are neither active nor within the
    /// retention window.
    pub fn cleanup(&self, class: AssetClass, keep_recent: usize) -> Result<usize> {
        let asset_type = asset_type_for_class(class);
        let active = self
            .snapshots
            .get(class)
            .map_err(Error::from)?
            .map(|p| p.snapshot_id);

        let all_ids = self
            .assets
            .list_snapshot_ids(asset_type)
            .map_err(Error::from)?;

        let mut kept = 0usize;
        let mut stale = Vec::new();
        for id in all_ids {
            if Some(&id) == active.as_ref() {
                continue;
            }
            if kept < keep_recent {
                kept += 1;
                continue;
            }
            stale.push(id);
        }

        let deleted = self
            .assets
            .delete_snapshots(asset_type, &stale)
            .map_err(Error::from)?;
        if deleted > 0 {
            info!(
                "Cleaned up {} stale {} assets across {} snapshots",
                deleted,
                class,
                stale.len()
            );
        }
        Ok(deleted)
    }

    /// Refreshes the price of a single symbol in the active snapshot.
    ///
    /// Never creates new snapshots; an unknown symbol (zero rows updated) is
    /// a user-facing failure.
    pub async fn sync_symbol(&self, class: AssetClass, symbol: &str) -> Result<SyncSummary> {
        let asset_type = asset_type_for_class(class);
        let pointer = self
            .snapshots
            .get(class)
            .map_err(Error::from)?
            .ok_or_else(|| AssetError::NoActiveSnapshot(class.as_str().to_string()))?;

        let normalized = symbol.trim().to_uppercase();
        let asset = self
            .assets
            .find_by_type_and_symbol(asset_type, &normalized, Some(&pointer.snapshot_id))
            .map_err(Error::from)?
            .ok_or_else(|| {
                AssetError::NotFound(format!(
                    "Symbol '{}' is not in the active {} snapshot",
                    normalized, class
                ))
            })?;

        let quote = self.provider.get_quote(&normalized).await.map_err(Error::from)?;
        let price = quote.price.ok_or_else(|| {
            Error::from(AssetError::MarketDataError(format!(
                "No price returned for '{}'",
                normalized
            )))
        })?;

        self.assets
            .upsert_price(&asset.id, price, self.provider.name())
            .map_err(Error::from)?;
        self.recalc.asset_changed(&asset.id);

        Ok(SyncSummary {
            updated: 1,
            skipped: 0,
        })
    }

    /// Refreshes prices for every asset in the active snapshot of one class.
    /// Per-symbol provider failures are skipped, not fatal to the run.
    pub async fn sync_prices(&self, class: AssetClass) -> Result<SyncSummary> {
        let asset_type = asset_type_for_class(class);
        let pointer = self
            .snapshots
            .get(class)
            .map_err(Error::from)?
            .ok_or_else(|| AssetError::NoActiveSnapshot(class.as_str().to_string()))?;

        let assets = self
            .assets
            .list_by_type_and_snapshot(asset_type, &pointer.snapshot_id)
            .map_err(Error::from)?;

        let mut updated = 0usize;
        let mut skipped = 0usize;

        for asset in assets {
            let Some(symbol) = asset.symbol.clone() else {
                skipped += 1;
                continue;
            };
            let quote = match self.provider.get_quote(&symbol).await {
                Ok(q) => q,
                Err(e) => {
                    warn!("Quote fetch failed for {}: {}", symbol, e);
                    skipped += 1;
                    continue;
                }
            };
            let Some(price) = quote.price else {
                skipped += 1;
                continue;
            };

            self.assets
                .upsert_price(&asset.id, price, self.provider.name())
                .map_err(Error::from)?;
            self.recalc.asset_changed(&asset.id);
            updated += 1;
        }

        Ok(SyncSummary { updated, skipped })
    }
}

fn normalize_symbol(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim().to_uppercase();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::split_crypto_pair;

    #[test]
    fn splits_known_quote_currencies() {
        assert_eq!(
            split_crypto_pair("BTCUSD"),
            Some(("BTC".to_string(), "USD".to_string()))
        );
        assert_eq!(
            split_crypto_pair("ETHUSDT"),
            Some(("ETH".to_string(), "USDT".to_string()))
        );
        assert_eq!(
            split_crypto_pair("etheur"),
            Some(("ETH".to_string(), "EUR".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_or_degenerate_pairs() {
        assert_eq!(split_crypto_pair("BTCJPY"), None);
        assert_eq!(split_crypto_pair("USD"), None);
        assert_eq!(split_crypto_pair(""), None);
    }
}
