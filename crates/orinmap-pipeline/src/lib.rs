//! orinmap-pipeline: map upload and retrieval flows.
//!
//! # Architecture
//!
//! ```text
//! UploadPipeline::handle_upload
//!   ├── BlobStore::put (descriptor, then raster)
//!   ├── BlobStore::get (descriptor, re-read from the store)
//!   ├── MapMetaInfo::from_yaml_bytes + parse_measured_at
//!   └── StateStore::record_map_data (device upsert + row, one transaction)
//!         └── on failure after objects were stored: StateStore::record_orphans
//!
//! MapQueryService::latest_view
//!   ├── StateStore::latest_map_data
//!   └── BlobStore::presign (raster, descriptor)
//!
//! Reconciler
//!   ├── sweep() → deletes orphaned objects, clears their records
//!   └── run() → periodic sweep loop
//! ```

pub mod error;
pub mod query;
pub mod reconcile;
pub mod upload;

pub use error::{PipelineError, PipelineResult};
pub use query::{MapQueryService, MapViewResponse};
pub use reconcile::{ReconcileReport, Reconciler};
pub use upload::{MapUpload, UploadPipeline, UploadedFile};
