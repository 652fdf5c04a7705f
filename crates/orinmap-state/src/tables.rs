//! redb table definitions for the orinmap state store.

use redb::TableDefinition;

/// Devices keyed by their external `orin_id`.
pub const DEVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("devices");

/// Map uploads keyed by `(orin_id, measured_at_secs, measured_at_nanos, id)`.
///
/// The trailing id breaks ties between uploads with identical timestamps in
/// insertion order.
pub const MAP_DATA: TableDefinition<(&str, i64, u32, u64), &[u8]> =
    TableDefinition::new("map_data");

/// Object-store keys referenced by committed map data, mapped to the row id.
pub const OBJECT_KEYS: TableDefinition<&str, u64> = TableDefinition::new("object_keys");

/// Orphaned object-store keys keyed by the object key itself.
pub const ORPHANS: TableDefinition<&str, &[u8]> = TableDefinition::new("orphans");

/// Counters.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// `META` key holding the last assigned map data id.
pub const MAP_DATA_SEQ: &str = "map_data_seq";
