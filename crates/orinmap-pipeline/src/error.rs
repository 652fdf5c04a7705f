//! Error types for the upload and query flows.

use orinmap_blob::BlobError;
use orinmap_core::{DescriptorError, TimestampError};
use orinmap_state::StateError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid upload: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error("no map data found for device {0}")]
    NotFound(String),

    #[error("object store: {0}")]
    Blob(#[from] BlobError),

    #[error("state store: {0}")]
    State(#[from] StateError),
}
