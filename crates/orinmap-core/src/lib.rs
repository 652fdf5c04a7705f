//! orinmap-core: shared types for the orinmap map service.
//!
//! Holds the daemon configuration (`orinmap.toml`), the occupancy-grid
//! descriptor parser that turns a map's YAML sidecar into [`MapMetaInfo`],
//! and the `measuredAt` timestamp parser used by the upload pipeline.

pub mod config;
pub mod descriptor;
pub mod timestamp;

pub use config::{ConfigError, OrinmapConfig, StorageBackend};
pub use descriptor::{DescriptorError, MapMetaInfo};
pub use timestamp::{TimestampError, parse_measured_at};
