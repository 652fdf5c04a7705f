//! Map upload pipeline.
//!
//! Object-store writes happen before the state-store transaction and are not
//! rolled back with it. When a later step fails, the keys already written
//! are recorded as orphans for the [`crate::Reconciler`] to delete.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use orinmap_blob::BlobStore;
use orinmap_core::{MapMetaInfo, parse_measured_at};
use orinmap_state::{MapData, NewMapData, OrphanRecord, StateStore};
use tracing::{error, info, warn};

use crate::error::{PipelineError, PipelineResult};

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A device's map upload request.
#[derive(Debug, Clone)]
pub struct MapUpload {
    pub orin_id: String,
    /// ISO-8601 capture time, e.g. `2025-07-24T15:00:00`.
    pub measured_at: String,
    /// YAML descriptor.
    pub yaml_file: UploadedFile,
    /// PGM raster.
    pub pgm_file: UploadedFile,
}

#[derive(Clone)]
pub struct UploadPipeline {
    blobs: BlobStore,
    state: StateStore,
}

impl UploadPipeline {
    pub fn new(blobs: BlobStore, state: StateStore) -> Self {
        Self { blobs, state }
    }

    /// Store both files, parse the stored descriptor, and persist a map data
    /// row for the device (creating the device on first upload).
    pub async fn handle_upload(&self, upload: MapUpload) -> PipelineResult<MapData> {
        if upload.orin_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("orinId must not be empty".to_string()));
        }

        let mut stored = Vec::with_capacity(2);
        let result = self.store_and_record(&upload, &mut stored).await;

        match &result {
            Ok(record) => {
                info!(
                    orin_id = %record.orin_id,
                    id = record.id,
                    measured_at = %record.measured_at,
                    pgm_key = %record.pgm_key,
                    "map upload stored"
                );
            }
            Err(e) => {
                if !stored.is_empty() {
                    self.record_orphans(&upload.orin_id, &stored, e);
                }
            }
        }
        result
    }

    async fn store_and_record(
        &self,
        upload: &MapUpload,
        stored: &mut Vec<String>,
    ) -> PipelineResult<MapData> {
        let orin_id = upload.orin_id.as_str();

        let yaml_key = self.put_file(orin_id, &upload.yaml_file).await?;
        stored.push(yaml_key.clone());
        let pgm_key = self.put_file(orin_id, &upload.pgm_file).await?;
        stored.push(pgm_key.clone());

        // Parse the stored copy, not the request buffer.
        let yaml_bytes = self.blobs.get(&yaml_key).await?;
        let meta = MapMetaInfo::from_yaml_bytes(&yaml_bytes)?;
        let measured_at = parse_measured_at(&upload.measured_at)?;

        let record = self.state.record_map_data(&NewMapData {
            orin_id: orin_id.to_string(),
            measured_at,
            pgm_key,
            yaml_key,
            meta,
        })?;
        Ok(record)
    }

    async fn put_file(&self, orin_id: &str, file: &UploadedFile) -> PipelineResult<String> {
        let key = self
            .blobs
            .put(
                orin_id,
                &file.file_name,
                file.bytes.clone(),
                file.content_type.as_deref(),
            )
            .await?;
        Ok(key)
    }

    fn record_orphans(&self, orin_id: &str, keys: &[String], cause: &PipelineError) {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let orphans: Vec<OrphanRecord> = keys
            .iter()
            .map(|key| OrphanRecord {
                key: key.clone(),
                orin_id: orin_id.to_string(),
                reason: cause.to_string(),
                recorded_at,
            })
            .collect();

        match self.state.record_orphans(&orphans) {
            Ok(()) => warn!(
                %orin_id,
                count = orphans.len(),
                error = %cause,
                "upload failed after storing objects, orphans recorded"
            ),
            Err(e) => error!(
                %orin_id,
                ?keys,
                error = %cause,
                record_error = %e,
                "upload failed after storing objects, orphans could not be recorded"
            ),
        }
    }
}
