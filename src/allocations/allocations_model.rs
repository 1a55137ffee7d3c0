use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analytics::{DimensionType, RunStatus};

/// A target allocation plan for one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationScenario {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    /// Column identifier whose value is allocated (e.g. current_value).
    pub value_identifier: String,
    pub created_at: NaiveDateTime,
}

/// An allocation axis (e.g. sector) inside a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDimension {
    pub id: String,
    pub scenario_id: String,
    pub key: String,
    pub name: String,
    pub dimension_type: DimensionType,
    pub is_active: bool,
}

/// A desired bucket share within one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTarget {
    pub id: String,
    pub dimension_id: String,
    pub label: String,
    pub target_percent: Decimal,
    pub target_value: Option<Decimal>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRun {
    pub id: String,
    pub scenario_id: String,
    pub status: RunStatus,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Gap between target and actual allocation for one target bucket.
///
/// The target's label is snapshotted at evaluation time so later renames do
/// not retroactively alter historical results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationGapResult {
    pub id: String,
    pub run_id: String,
    pub dimension_id: String,
    pub target_id: String,
    pub target_label: String,
    pub actual_value: Decimal,
    pub target_value: Decimal,
    pub gap_value: Decimal,
    pub actual_percent: Decimal,
    pub target_percent: Decimal,
    pub gap_percent: Decimal,
    pub holding_count: i32,
}

// ---------------------------------------------------------------------------
// Database models
// ---------------------------------------------------------------------------

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_scenarios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationScenarioDB {
    pub id: String,
    pub portfolio_id: String,
    pub name: String,
    pub value_identifier: String,
    pub created_at: NaiveDateTime,
}

impl From<AllocationScenarioDB> for AllocationScenario {
    fn from(db: AllocationScenarioDB) -> Self {
        AllocationScenario {
            id: db.id,
            portfolio_id: db.portfolio_id,
            name: db.name,
            value_identifier: db.value_identifier,
            created_at: db.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_dimensions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationDimensionDB {
    pub id: String,
    pub scenario_id: String,
    pub key: String,
    pub name: String,
    pub dimension_type: String,
    pub is_active: bool,
}

impl From<AllocationDimensionDB> for AllocationDimension {
    fn from(db: AllocationDimensionDB) -> Self {
        AllocationDimension {
            dimension_type: DimensionType::from_str(&db.dimension_type)
                .unwrap_or(DimensionType::Categorical),
            id: db.id,
            scenario_id: db.scenario_id,
            key: db.key,
            name: db.name,
            is_active: db.is_active,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_targets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationTargetDB {
    pub id: String,
    pub dimension_id: String,
    pub label: String,
    pub target_percent: String,
    pub target_value: Option<String>,
    pub is_active: bool,
}

impl From<AllocationTargetDB> for AllocationTarget {
    fn from(db: AllocationTargetDB) -> Self {
        AllocationTarget {
            id: db.id,
            dimension_id: db.dimension_id,
            label: db.label,
            target_percent: Decimal::from_str(&db.target_percent).unwrap_or(Decimal::ZERO),
            target_value: db.target_value.and_then(|v| Decimal::from_str(&v).ok()),
            is_active: db.is_active,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationRunDB {
    pub id: String,
    pub scenario_id: String,
    pub status: String,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<AllocationRunDB> for AllocationRun {
    fn from(db: AllocationRunDB) -> Self {
        AllocationRun {
            status: RunStatus::from_str(&db.status).unwrap_or(RunStatus::Pending),
            id: db.id,
            scenario_id: db.scenario_id,
            started_at: db.started_at,
            finished_at: db.finished_at,
            error_message: db.error_message,
            created_at: db.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocation_gap_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AllocationGapResultDB {
    pub id: String,
    pub run_id: String,
    pub dimension_id: String,
    pub target_id: String,
    pub target_label: String,
    pub actual_value: String,
    pub target_value: String,
    pub gap_value: String,
    pub actual_percent: String,
    pub target_percent: String,
    pub gap_percent: String,
    pub holding_count: i32,
}

impl From<AllocationGapResultDB> for AllocationGapResult {
    fn from(db: AllocationGapResultDB) -> Self {
        let dec = |s: &str| Decimal::from_str(s).unwrap_or(Decimal::ZERO);
        AllocationGapResult {
            actual_value: dec(&db.actual_value),
            target_value: dec(&db.target_value),
            gap_value: dec(&db.gap_value),
            actual_percent: dec(&db.actual_percent),
            target_percent: dec(&db.target_percent),
            gap_percent: dec(&db.gap_percent),
            id: db.id,
            run_id: db.run_id,
            dimension_id: db.dimension_id,
            target_id: db.target_id,
            target_label: db.target_label,
            holding_count: db.holding_count,
        }
    }
}
