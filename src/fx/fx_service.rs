use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::holdings::HoldingRepository;
use crate::market_data::{MarketDataError, MarketDataProvider};
use crate::schemas::RecalcService;

use super::fx_errors::{FxError, Result};
use super::fx_model::{ExchangeRate, Currency};
use super::fx_repository::FxRepository;

/// Service for the currency universe and exchange rates.
pub struct FxService {
    repository: FxRepository,
    provider: Arc<dyn MarketDataProvider>,
    holdings: HoldingRepository,
    recalc: Arc<RecalcService>,
}

impl FxService {
    pub fn new(
        repository: FxRepository,
        provider: Arc<dyn MarketDataProvider>,
        holdings: HoldingRepository,
        recalc: Arc<RecalcService>,
    ) -> Self {
        Self {
            repository,
            provider,
            holdings,
            recalc,
        }
    }

    pub fn list_currencies(&self) -> Result<Vec<Currency>> {
        self.repository.list_currencies()
    }

    /// Seeds the currency table from the provider's forex universe.
    /// Returns the number of newly created currencies.
    pub async fn seed_currencies(&self) -> Result<usize> {
        let pairs = self
            .provider
            .get_forex_pairs()
            .await
            .map_err(map_provider_error)?;

        let mut created = 0;
        for pair in pairs {
            for (code, name) in [
                (pair.from_currency, pair.from_name),
                (pair.to_currency, pair.to_name),
            ] {
                let Some(code) = code else { continue };
                let code = code.trim().to_uppercase();
                if code.is_empty() {
                    continue;
                }
                if self.repository.upsert_currency(&code, name.as_deref())? {
                    created += 1;
                }
            }
        }

        info!("Seeded {} new currencies", created);
        Ok(created)
    }

    /// Latest rate for a pair, falling back to the inverse pair when only
    /// that direction is stored.
    pub fn get_rate(&self, from: &str, to: &str) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        if let Some(rate) = self.repository.get_rate(from, to)? {
            return Ok(rate.rate);
        }

        match self.repository.get_rate(to, from)? {
            Some(inverse) if !inverse.rate.is_zero() => Ok(Decimal::ONE / inverse.rate),
            _ => Err(FxError::RateNotFound(format!(
                "Exchange rate not found for {}/{}",
                from, to
            ))),
        }
    }

    /// Fetches and stores the latest rate for one pair, then recomputes the
    /// holdings priced in either currency.
    ///
    /// Recalculation runs only after the rate write has returned, so it can
    /// never observe a rate that is later rolled back.
    pub async fn sync_pair(&self, base: &str, quote: &str) -> Result<ExchangeRate> {
        let symbol = ExchangeRate::make_fx_symbol(base, quote);
        let quote_row = self
            .provider
            .get_quote(&symbol)
            .await
            .map_err(map_provider_error)?;

        let rate_value = quote_row
            .price
            .ok_or_else(|| FxError::InvalidRate(format!("No rate returned for {}", symbol)))?;

        let stored = self
            .repository
            .upsert_rate(base, quote, rate_value, self.provider.name())?;

        self.recalculate_for_currencies(&[base, quote]);

        Ok(stored)
    }

    /// Stores a manually entered rate; same post-commit recalculation
    /// behavior as a provider sync.
    pub fn update_rate(&self, base: &str, quote: &str, rate: Decimal) -> Result<ExchangeRate> {
        let stored = self.repository.upsert_rate(base, quote, rate, "manual")?;
        self.recalculate_for_currencies(&[base, quote]);
        Ok(stored)
    }

    fn recalculate_for_currencies(&self, codes: &[&str]) {
        let mut affected = Vec::new();
        for code in codes {
            match self.holdings.list_by_asset_currency(code) {
                Ok(mut holdings) => affected.append(&mut holdings),
                Err(e) => warn!("Failed to load holdings priced in {}: {}", code, e),
            }
        }

        affected.sort_by(|a, b| a.id.cmp(&b.id));
        affected.dedup_by(|a, b| a.id == b.id);

        self.recalc.fx_changed(&affected);
    }
}

fn map_provider_error(e: MarketDataError) -> FxError {
    FxError::MarketDataError(e.to_string())
}
