//! redb table definitions for the local tree adapter.

use redb::TableDefinition;

/// Paste rows keyed by name, ordered lexicographically by redb.
pub const PASTES: TableDefinition<&str, &str> = TableDefinition::new("pastes");
