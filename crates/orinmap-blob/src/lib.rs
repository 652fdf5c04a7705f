//! orinmap-blob: object store client for map files.
//!
//! Wraps an [`object_store`] backend (S3 in production, in-memory for
//! development and tests) with the operations the map service needs:
//! whole-object put/get/delete and time-limited signed GET URLs.
//!
//! Objects are laid out as `maps/{orin_id}/{epoch_millis}_{file_name}`.

pub mod error;
pub mod keys;
pub mod signer;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use keys::object_key;
pub use signer::LocalSigner;
pub use store::BlobStore;
