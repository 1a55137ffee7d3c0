use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Lifecycle state of an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }
}

impl FromStr for RunStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown run status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dimension buckets holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    /// One bucket per holding, taken from a column's text value.
    Categorical,
    /// Fractional contributions from exposure weights (e.g. geographic
    /// split).
    Weighted,
}

impl DimensionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionType::Categorical => "categorical",
            DimensionType::Weighted => "weighted",
        }
    }
}

impl FromStr for DimensionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "categorical" => Ok(DimensionType::Categorical),
            "weighted" => Ok(DimensionType::Weighted),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown dimension type '{}'",
                other
            ))),
        }
    }
}

/// An analytic: a value identifier aggregated across one or more dimensions
/// of a portfolio's holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytic {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub value_identifier: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticDimension {
    pub id: String,
    pub analytic_id: String,
    pub key: String,
    pub name: String,
    pub dimension_type: DimensionType,
    pub source_identifier: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticRun {
    pub id: String,
    pub analytic_id: String,
    pub status: RunStatus,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticResult {
    pub id: String,
    pub run_id: String,
    pub dimension_id: String,
    pub bucket_label: String,
    pub total_value: Decimal,
    pub percentage: Decimal,
    pub holding_count: i32,
    pub display_order: i32,
}

/// Exposure weight of an asset in one bucket of a dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetExposure {
    pub asset_id: String,
    pub dimension_key: String,
    pub bucket_label: String,
    pub weight: Decimal,
}

/// Per-holding exposure override; wins over the asset's exposures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingExposureOverride {
    pub holding_id: String,
    pub dimension_key: String,
    pub bucket_label: String,
    pub weight: Decimal,
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::analytics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalyticDB {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub value_identifier: String,
    pub created_at: NaiveDateTime,
}

impl From<AnalyticDB> for Analytic {
    fn from(db: AnalyticDB) -> Self {
        Analytic {
            id: db.id,
            portfolio_id: db.portfolio_id,
            name: db.name,
            value_identifier: db.value_identifier,
            created_at: db.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::analytic_dimensions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalyticDimensionDB {
    pub id: String,
    pub analytic_id: String,
    pub key: String,
    pub name: String,
    pub dimension_type: String,
    pub source_identifier: Option<String>,
    pub is_active: bool,
}

impl From<AnalyticDimensionDB> for AnalyticDimension {
    fn from(db: AnalyticDimensionDB) -> Self {
        AnalyticDimension {
            dimension_type: DimensionType::from_str(&db.dimension_type)
                .unwrap_or(DimensionType::Categorical),
            id: db.id,
            analytic_id: db.analytic_id,
            key: db.key,
            name: db.name,
            source_identifier: db.source_identifier,
            is_active: db.is_active,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::analytic_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalyticRunDB {
    pub id: String,
    pub analytic_id: String,
    pub status: String,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<AnalyticRunDB> for AnalyticRun {
    fn from(db: AnalyticRunDB) -> Self {
        AnalyticRun {
            status: RunStatus::from_str(&db.status).unwrap_or(RunStatus::Pending),
            id: db.id,
            analytic_id: db.analytic_id,
            started_at: db.started_at,
            finished_at: db.finished_at,
            error_message: db.error_message,
            created_at: db.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::analytic_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalyticResultDB {
    pub id: String,
    pub run_id: String,
    pub dimension_id: String,
    pub bucket_label: String,
    pub total_value: String,
    pub percentage: String,
    pub holding_count: i32,
    pub display_order: i32,
}

impl From<AnalyticResultDB> for AnalyticResult {
    fn from(db: AnalyticResultDB) -> Self {
        AnalyticResult {
            id: db.id,
            run_id: db.run_id,
            dimension_id: db.dimension_id,
            bucket_label: db.bucket_label,
            total_value: Decimal::from_str(&db.total_value).unwrap_or(Decimal::ZERO),
            percentage: Decimal::from_str(&db.percentage).unwrap_or(Decimal::ZERO),
            holding_count: db.holding_count,
            display_order: db.display_order,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::asset_dimension_exposures)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetExposureDB {
    pub id: String,
    pub asset_id: String,
    pub dimension_key: String,
    pub bucket_label: String,
    pub weight: String,
}

impl From<AssetExposureDB> for AssetExposure {
    fn from(db: AssetExposureDB) -> Self {
        AssetExposure {
            asset_id: db.asset_id,
            dimension_key: db.dimension_key,
            bucket_label: db.bucket_label,
            weight: Decimal::from_str(&db.weight).unwrap_or(Decimal::ZERO),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::holding_dimension_overrides)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingExposureOverrideDB {
    pub id: String,
    pub holding_id: String,
    pub dimension_key: String,
    pub bucket_label: String,
    pub weight: String,
}

impl From<HoldingExposureOverrideDB> for HoldingExposureOverride {
    fn from(db: HoldingExposureOverrideDB) -> Self {
        HoldingExposureOverride {
            holding_id: db.holding_id,
            dimension_key: db.dimension_key,
            bucket_label: db.bucket_label,
            weight: Decimal::from_str(&db.weight).unwrap_or(Decimal::ZERO),
        }
    }
}
