use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::assets::{assets_errors::Result, AssetClass, AssetError};
use crate::db::get_connection;
use crate::schema::snapshot_pointers;

use super::snapshots_model::{SnapshotPointer, SnapshotPointerDB};

/// Repository for the per-class active snapshot pointers
pub struct SnapshotRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<crate::db::DbConnection> {
        get_connection(&self.pool).map_err(|e| AssetError::InvalidData(e.to_string()))
    }

    pub fn get(&self, asset_class: AssetClass) -> Result<Option<SnapshotPointer>> {
        let mut conn = self.conn()?;

        Ok(snapshot_pointers::table
            .find(asset_class.as_str())
            .first::<SnapshotPointerDB>(&mut conn)
            .optional()?
            .map(SnapshotPointer::from))
    }

    /// Atomically points the class at a new snapshot. A single upsert
    /// statement, so readers observe either the old or the new id, never a
    /// mix.
    pub fn swap(&self, asset_class: AssetClass, snapshot_id: &str) -> Result<SnapshotPointer> {
        let mut conn = self.conn()?;

        let row = SnapshotPointerDB {
            asset_class: asset_class.as_str().to_string(),
            snapshot_id: snapshot_id.to_string(),
            updated_at: chrono::Utc::now().naive_utc(),
        };

        diesel::insert_into(snapshot_pointers::table)
            .values(&row)
            .on_conflict(snapshot_pointers::asset_class)
            .do_update()
            .set((
                snapshot_pointers::snapshot_id.eq(&row.snapshot_id),
                snapshot_pointers::updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)?;

        Ok(row.into())
    }
}
