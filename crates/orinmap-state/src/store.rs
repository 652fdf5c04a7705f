//! StateStore: redb-backed persistence for orinmap.
//!
//! Provides typed operations over devices, map data, and orphaned object
//! keys. All values are JSON-serialized into redb's `&[u8]` value columns.
//! The store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(DEVICES).map_err(map_err!(Table))?;
        txn.open_table(MAP_DATA).map_err(map_err!(Table))?;
        txn.open_table(OBJECT_KEYS).map_err(map_err!(Table))?;
        txn.open_table(ORPHANS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Devices ────────────────────────────────────────────────────

    /// Get a device by id.
    pub fn get_device(&self, orin_id: &str) -> StateResult<Option<Device>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEVICES).map_err(map_err!(Table))?;
        match table.get(orin_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let device: Device =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(device))
            }
            None => Ok(None),
        }
    }

    /// List all devices.
    pub fn list_devices(&self) -> StateResult<Vec<Device>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let device: Device =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(device);
        }
        Ok(results)
    }

    // ── Map data ───────────────────────────────────────────────────

    /// Persist one upload.
    ///
    /// The owning device is created if absent and the row's id is assigned,
    /// all inside a single write transaction.
    pub fn record_map_data(&self, new: &NewMapData) -> StateResult<MapData> {
        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let (record, device_created) = {
            let (_, device_created) = insert_device_if_absent(&txn, &new.orin_id, now)?;

            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let id = meta
                .get(MAP_DATA_SEQ)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            meta.insert(MAP_DATA_SEQ, id).map_err(map_err!(Write))?;

            let record = MapData::from_new(new, id, now);
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            let mut table = txn.open_table(MAP_DATA).map_err(map_err!(Table))?;
            table
                .insert(record.table_key(), value.as_slice())
                .map_err(map_err!(Write))?;

            let mut object_keys = txn.open_table(OBJECT_KEYS).map_err(map_err!(Table))?;
            for key in [record.pgm_key.as_str(), record.yaml_key.as_str()] {
                object_keys.insert(key, record.id).map_err(map_err!(Write))?;
            }
            (record, device_created)
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            id = record.id,
            orin_id = %record.orin_id,
            measured_at = %record.measured_at,
            device_created,
            "map data stored"
        );
        Ok(record)
    }

    /// The row with the greatest `measured_at` for a device. Rows with equal
    /// timestamps are ordered by id, so the later insert wins.
    pub fn latest_map_data(&self, orin_id: &str) -> StateResult<Option<MapData>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MAP_DATA).map_err(map_err!(Table))?;
        let mut range = table
            .range((orin_id, i64::MIN, 0u32, 0u64)..=(orin_id, i64::MAX, u32::MAX, u64::MAX))
            .map_err(map_err!(Read))?;
        let latest = match range.next_back() {
            Some(entry) => {
                let (_, value) = entry.map_err(map_err!(Read))?;
                let record: MapData =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                Some(record)
            }
            None => None,
        };
        Ok(latest)
    }

    /// All rows for a device, oldest first.
    pub fn list_map_data_for_device(&self, orin_id: &str) -> StateResult<Vec<MapData>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MAP_DATA).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table
            .range((orin_id, i64::MIN, 0u32, 0u64)..=(orin_id, i64::MAX, u32::MAX, u64::MAX))
            .map_err(map_err!(Read))?
        {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: MapData =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Whether a committed map data row points at this object key.
    pub fn is_object_referenced(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(OBJECT_KEYS).map_err(map_err!(Table))?;
        Ok(table.get(key).map_err(map_err!(Read))?.is_some())
    }

    // ── Orphans ────────────────────────────────────────────────────

    /// Record orphaned object keys in one transaction.
    pub fn record_orphans(&self, orphans: &[OrphanRecord]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ORPHANS).map_err(map_err!(Table))?;
            for orphan in orphans {
                let value = serde_json::to_vec(orphan).map_err(map_err!(Serialize))?;
                table
                    .insert(orphan.key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = orphans.len(), "orphans recorded");
        Ok(())
    }

    /// List all orphan records.
    pub fn list_orphans(&self) -> StateResult<Vec<OrphanRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ORPHANS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let orphan: OrphanRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(orphan);
        }
        Ok(results)
    }

    /// Delete an orphan record by object key. Returns true if it existed.
    pub fn delete_orphan(&self, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(ORPHANS).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "orphan record deleted");
        Ok(existed)
    }
}

fn insert_device_if_absent(
    txn: &WriteTransaction,
    orin_id: &str,
    now: u64,
) -> StateResult<(Device, bool)> {
    let mut table = txn.open_table(DEVICES).map_err(map_err!(Table))?;
    let existing = table
        .get(orin_id)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value().to_vec());
    if let Some(bytes) = existing {
        let device: Device = serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
        return Ok((device, false));
    }

    let device = Device {
        orin_id: orin_id.to_string(),
        created_at: now,
    };
    let value = serde_json::to_vec(&device).map_err(map_err!(Serialize))?;
    table
        .insert(orin_id, value.as_slice())
        .map_err(map_err!(Write))?;
    debug!(%orin_id, "device created");
    Ok((device, true))
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
