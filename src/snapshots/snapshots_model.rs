use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Singleton pointer to the active snapshot of one asset class.
///
/// Swapping this row is the sole atomic activation step of a snapshot build:
/// readers only ever see data reached through the pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPointer {
    pub asset_class: String,
    pub snapshot_id: String,
    pub updated_at: NaiveDateTime,
}

/// Outcome of a full-universe seed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub snapshot_id: String,
    pub created: usize,
    pub skipped: usize,
}

/// Outcome of a price sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::snapshot_pointers)]
#[diesel(primary_key(asset_class))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotPointerDB {
    pub asset_class: String,
    pub snapshot_id: String,
    pub updated_at: NaiveDateTime,
}

impl From<SnapshotPointerDB> for SnapshotPointer {
    fn from(db: SnapshotPointerDB) -> Self {
        SnapshotPointer {
            asset_class: db.asset_class,
            snapshot_id: db.snapshot_id,
            updated_at: db.updated_at,
        }
    }
}
