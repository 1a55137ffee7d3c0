use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::holdings::Holding;
use crate::schemas::ColumnValueResolver;

use super::analytics_model::DimensionType;
use super::analytics_repository::AnalyticsRepository;

pub const UNKNOWN_LABEL: &str = "Unknown";

/// One holding's fractional contribution to a dimension bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketContribution {
    pub label: String,
    pub weight: Decimal,
}

/// Expands a holding into its bucket contributions for one dimension.
///
/// Categorical dimensions bucket the whole holding by a column's text value.
/// Weighted dimensions use per-holding overrides when present, else the
/// asset's exposure weights; a sub-1 weight total is topped up with an
/// Unknown remainder so every holding contributes its full base value.
pub struct DimensionResolver {
    repository: Arc<AnalyticsRepository>,
    resolver: Arc<ColumnValueResolver>,
}

impl DimensionResolver {
    pub fn new(repository: Arc<AnalyticsRepository>, resolver: Arc<ColumnValueResolver>) -> Self {
        Self {
            repository,
            resolver,
        }
    }

    pub fn resolve_contributions(
        &self,
        holding: &Holding,
        dimension_type: DimensionType,
        dimension_key: &str,
        source_identifier: Option<&str>,
    ) -> Result<Vec<BucketContribution>> {
        match dimension_type {
            DimensionType::Categorical => {
                Ok(self.resolve_categorical(holding, source_identifier.unwrap_or(dimension_key)))
            }
            DimensionType::Weighted => self.resolve_weighted(holding, dimension_key),
        }
    }

    fn resolve_categorical(&self, holding: &Holding, identifier: &str) -> Vec<BucketContribution> {
        let label = self
            .resolver
            .get_text(holding, identifier)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        vec![BucketContribution {
            label,
            weight: Decimal::ONE,
        }]
    }

    fn resolve_weighted(
        &self,
        holding: &Holding,
        dimension_key: &str,
    ) -> Result<Vec<BucketContribution>> {
        let overrides = self
            .repository
            .list_holding_overrides(&holding.id, dimension_key)?;
        if !overrides.is_empty() {
            return Ok(to_contributions(
                overrides
                    .into_iter()
                    .map(|o| (o.bucket_label, o.weight))
                    .collect(),
            ));
        }

        let Some(asset_id) = &holding.asset_id else {
            return Ok(unknown_contribution(Decimal::ONE));
        };

        let exposures = self
            .repository
            .list_asset_exposures(asset_id, dimension_key)?;
        if exposures.is_empty() {
            return Ok(unknown_contribution(Decimal::ONE));
        }

        Ok(to_contributions(
            exposures
                .into_iter()
                .map(|e| (e.bucket_label, e.weight))
                .collect(),
        ))
    }
}

fn to_contributions(weights: Vec<(String, Decimal)>) -> Vec<BucketContribution> {
    let mut contributions = Vec::new();
    let mut total = Decimal::ZERO;

    for (label, weight) in weights {
        if weight <= Decimal::ZERO {
            continue;
        }
        total += weight;
        contributions.push(BucketContribution { label, weight });
    }

    if contributions.is_empty() {
        return unknown_contribution(Decimal::ONE);
    }

    if total < Decimal::ONE {
        contributions.extend(unknown_contribution(Decimal::ONE - total));
    }

    contributions
}

fn unknown_contribution(weight: Decimal) -> Vec<BucketContribution> {
    vec![BucketContribution {
        label: UNKNOWN_LABEL.to_string(),
        weight,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tops_up_sub_one_weights_with_unknown() {
        let contributions = to_contributions(vec![
            ("US".to_string(), dec!(0.6)),
            ("EU".to_string(), dec!(0.3)),
        ]);

        assert_eq!(contributions.len(), 3);
        assert_eq!(contributions[2].label, UNKNOWN_LABEL);
        assert_eq!(contributions[2].weight, dec!(0.1));
    }

    #[test]
    fn drops_non_positive_weights() {
        let contributions = to_contributions(vec![
            ("US".to_string(), dec!(1.0)),
            ("EU".to_string(), dec!(0)),
            ("JP".to_string(), dec!(-0.5)),
        ]);

        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].label, "US");
    }

    #[test]
    fn all_weights_dropped_falls_back_to_unknown() {
        let contributions = to_contributions(vec![("EU".to_string(), dec!(0))]);
        assert_eq!(contributions.len(), 1);
        assert_eq!(contributions[0].label, UNKNOWN_LABEL);
        assert_eq!(contributions[0].weight, dec!(1));
    }

    #[test]
    fn weights_above_one_are_not_topped_up() {
        let contributions = to_contributions(vec![
            ("US".to_string(), dec!(0.8)),
            ("EU".to_string(), dec!(0.4)),
        ]);
        assert_eq!(contributions.len(), 2);
    }
}
