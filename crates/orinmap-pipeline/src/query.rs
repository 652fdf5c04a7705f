//! Latest-map query.

use std::time::Duration;

use orinmap_blob::BlobStore;
use orinmap_state::StateStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Render-ready view of a device's latest map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapViewResponse {
    pub pgm_url: String,
    pub yaml_url: String,
    pub resolution: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub origin_theta: f64,
    pub occupied_thresh: f64,
    pub free_thresh: f64,
    pub negate: Option<bool>,
}

#[derive(Clone)]
pub struct MapQueryService {
    blobs: BlobStore,
    state: StateStore,
    presign_ttl: Duration,
}

impl MapQueryService {
    pub fn new(blobs: BlobStore, state: StateStore, presign_ttl: Duration) -> Self {
        Self {
            blobs,
            state,
            presign_ttl,
        }
    }

    /// Build the view for the device's most recent upload. URLs are signed
    /// fresh on every call.
    pub async fn latest_view(&self, orin_id: &str) -> PipelineResult<MapViewResponse> {
        let record = self
            .state
            .latest_map_data(orin_id)?
            .ok_or_else(|| PipelineError::NotFound(orin_id.to_string()))?;

        let pgm_url = self.blobs.presign(&record.pgm_key, self.presign_ttl).await?;
        let yaml_url = self.blobs.presign(&record.yaml_key, self.presign_ttl).await?;
        debug!(%orin_id, id = record.id, ttl_secs = self.presign_ttl.as_secs(), "latest map view signed");

        Ok(MapViewResponse {
            pgm_url: pgm_url.to_string(),
            yaml_url: yaml_url.to_string(),
            resolution: record.resolution,
            origin_x: record.origin_x,
            origin_y: record.origin_y,
            origin_theta: record.origin_theta,
            occupied_thresh: record.occupied_thresh,
            free_thresh: record.free_thresh,
            negate: record.negate,
        })
    }
}
