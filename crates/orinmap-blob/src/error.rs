//! Error types for the object store client.

use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("invalid public base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("storage.{0} is required for this backend")]
    MissingConfig(&'static str),
}
