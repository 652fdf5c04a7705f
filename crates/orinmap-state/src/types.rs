//! Domain types for the orinmap state store.

use chrono::NaiveDateTime;
use orinmap_core::MapMetaInfo;
use serde::{Deserialize, Serialize};

/// External identifier assigned to a robot unit.
pub type OrinId = String;

/// Store-assigned map data identifier.
pub type MapDataId = u64;

// ── Device ────────────────────────────────────────────────────────

/// A registered robot unit. Created on its first map upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub orin_id: OrinId,
    /// Unix timestamp (seconds) of the first upload.
    pub created_at: u64,
}

// ── Map data ──────────────────────────────────────────────────────

/// One persisted upload: object-store keys plus parsed descriptor fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapData {
    pub id: MapDataId,
    pub orin_id: OrinId,
    /// Capture time reported by the device.
    pub measured_at: NaiveDateTime,
    /// Object key of the PGM raster.
    pub pgm_key: String,
    /// Object key of the YAML descriptor.
    pub yaml_key: String,
    pub resolution: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_theta: f64,
    pub occupied_thresh: f64,
    pub free_thresh: f64,
    pub negate: Option<bool>,
    /// Unix timestamp (seconds) when the row was written.
    pub uploaded_at: u64,
}

/// Input for [`crate::StateStore::record_map_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewMapData {
    pub orin_id: OrinId,
    pub measured_at: NaiveDateTime,
    pub pgm_key: String,
    pub yaml_key: String,
    pub meta: MapMetaInfo,
}

impl MapData {
    /// Build the composite key for the map data table.
    pub fn table_key(&self) -> (&str, i64, u32, u64) {
        let (secs, nanos) = measured_at_key(&self.measured_at);
        (self.orin_id.as_str(), secs, nanos, self.id)
    }

    /// Descriptor fields as stored.
    pub fn meta(&self) -> MapMetaInfo {
        MapMetaInfo {
            resolution: self.resolution,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            origin_theta: self.origin_theta,
            occupied_thresh: self.occupied_thresh,
            free_thresh: self.free_thresh,
            negate: self.negate,
        }
    }

    pub(crate) fn from_new(new: &NewMapData, id: MapDataId, uploaded_at: u64) -> Self {
        let meta = new.meta;
        Self {
            id,
            orin_id: new.orin_id.clone(),
            measured_at: new.measured_at,
            pgm_key: new.pgm_key.clone(),
            yaml_key: new.yaml_key.clone(),
            resolution: meta.resolution,
            origin_x: meta.origin_x,
            origin_y: meta.origin_y,
            origin_theta: meta.origin_theta,
            occupied_thresh: meta.occupied_thresh,
            free_thresh: meta.free_thresh,
            negate: meta.negate,
            uploaded_at,
        }
    }
}

/// Sort key for a capture time: whole seconds since the epoch plus the
/// sub-second nanoseconds, treating the naive value as UTC.
pub fn measured_at_key(measured_at: &NaiveDateTime) -> (i64, u32) {
    let utc = measured_at.and_utc();
    (utc.timestamp(), utc.timestamp_subsec_nanos())
}

// ── Orphans ───────────────────────────────────────────────────────

/// An object written by an upload that failed before its map data row was
/// committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrphanRecord {
    pub key: String,
    pub orin_id: OrinId,
    /// Error that aborted the upload.
    pub reason: String,
    /// Unix timestamp (seconds) when the orphan was recorded.
    pub recorded_at: u64,
}
