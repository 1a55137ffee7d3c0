use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::Result;
use crate::holdings::Holding;
use crate::schemas::ColumnValueResolver;

use super::analytics_model::DimensionType;
use super::dimension_resolver::DimensionResolver;

/// One aggregated bucket row.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub bucket_label: String,
    pub total_value: Decimal,
    /// Fraction of the grand total (0..=1); zero when the grand total is
    /// zero.
    pub percentage: Decimal,
    pub holding_count: usize,
}

/// Computes dimension-bucketed aggregates over a holding set.
pub struct AggregationService {
    resolver: Arc<ColumnValueResolver>,
    dimensions: Arc<DimensionResolver>,
}

impl AggregationService {
    pub fn new(resolver: Arc<ColumnValueResolver>, dimensions: Arc<DimensionResolver>) -> Self {
        Self {
            resolver,
            dimensions,
        }
    }

    /// Aggregates `value_identifier` across one dimension.
    ///
    /// Holdings whose base value resolves to exactly zero are skipped. A
    /// holding contributes `base_value * weight` per bucket. Rows come back
    /// sorted descending by total; ties keep insertion order (stable sort).
    pub fn aggregate_dimension(
        &self,
        value_identifier: &str,
        dimension_type: DimensionType,
        dimension_key: &str,
        source_identifier: Option<&str>,
        holdings: &[Holding],
    ) -> Result<Vec<BucketRow>> {
        let mut bucket_order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        let mut holding_ids: HashMap<String, HashSet<String>> = HashMap::new();

        for holding in holdings {
            let base_value = self.resolver.get_numeric(holding, value_identifier);
            if base_value.is_zero() {
                continue;
            }

            let contributions = self.dimensions.resolve_contributions(
                holding,
                dimension_type,
                dimension_key,
                source_identifier,
            )?;

            for contribution in contributions {
                if !totals.contains_key(&contribution.label) {
                    bucket_order.push(contribution.label.clone());
                }
                *totals.entry(contribution.label.clone()).or_default() +=
                    base_value * contribution.weight;
                holding_ids
                    .entry(contribution.label)
                    .or_default()
                    .insert(holding.id.clone());
            }
        }

        let grand_total: Decimal = totals.values().copied().sum();

        let mut rows: Vec<BucketRow> = bucket_order
            .into_iter()
            .map(|label| {
                let total_value = totals.get(&label).copied().unwrap_or(Decimal::ZERO);
                let percentage = if grand_total > Decimal::ZERO {
                    total_value / grand_total
                } else {
                    Decimal::ZERO
                };
                BucketRow {
                    holding_count: holding_ids.get(&label).map(HashSet::len).unwrap_or(0),
                    bucket_label: label,
                    total_value,
                    percentage,
                }
            })
            .collect();

        // Vec::sort_by is stable, so equal totals keep insertion order.
        rows.sort_by(|a, b| b.total_value.cmp(&a.total_value));

        Ok(rows)
    }
}
