//! State store errors.
//!
//! redb and serde_json failures are flattened to their message by the
//! `map_err!` macro in `store.rs`; the variant records which step failed.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    /// The database file could not be created or opened.
    #[error("cannot open map database: {0}")]
    Open(String),

    /// Beginning or committing a transaction failed.
    #[error("map database transaction failed: {0}")]
    Transaction(String),

    #[error("cannot open map database table: {0}")]
    Table(String),

    #[error("map database read failed: {0}")]
    Read(String),

    #[error("map database write failed: {0}")]
    Write(String),

    /// A device, map data or orphan record could not be encoded.
    #[error("cannot encode record: {0}")]
    Serialize(String),

    /// A stored record no longer matches its type.
    #[error("stored record is corrupt: {0}")]
    Deserialize(String),
}
