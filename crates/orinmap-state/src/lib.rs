//! orinmap-state: embedded state store for orinmap.
//!
//! Backed by [redb](https://docs.rs/redb), persists devices, map upload
//! records, and orphaned object keys awaiting cleanup.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns. Map data
//! rows are keyed by `(orin_id, secs, nanos, id)`, so the latest map for a
//! device is the last entry of a range scan over its key prefix. Object keys
//! of committed rows are indexed separately so cleanup can skip them.
//!
//! Device creation and map data insertion share one write transaction.
//! redb admits a single writer at a time, which makes insert-if-absent for
//! devices atomic without an application-level lock.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
