//! Global type table and per-client v0↔v2 identifier map (§4.E).
//!
//! Grounded on `fuel-compression/src/table.rs` (`Table`,
//! `CompactionContext`/`DecompactionContext` — a registry mapping compact
//! keys to full values and back) and `fuel-compression/src/key.rs`
//! (`RawKey`, a checked newtype over a raw index), adapted from an async
//! registry to a synchronous `HashMap`-backed one since §5 forbids the
//! codec from ever suspending.

use std::collections::HashMap;

/// One row of the compile-time-known global type table (§4.E): a v2
/// numeric identifier plus the legacy string name a v0 peer names it
/// with over `UpdateTypes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTableRow {
    /// Legacy (v0) string name.
    pub name: &'static str,
    /// Current (v2) numeric identifier. Stable across the table so
    /// reordering rows cannot change wire semantics.
    pub v2_id: u32,
}

/// `Object` type: media format parameters.
pub const FORMAT_OBJECT: u32 = 1;
/// `Object` type: node commands (start/pause/…).
pub const COMMAND_OBJECT: u32 = 2;
/// Property key: `Format`'s media type field.
pub const PROP_MEDIA_TYPE: u32 = 3;
/// Property key: `Format`'s media subtype field.
pub const PROP_MEDIA_SUBTYPE: u32 = 4;
/// `Id` value: audio media type.
pub const MEDIA_TYPE_AUDIO: u32 = 5;
/// `Id` value: video media type.
pub const MEDIA_TYPE_VIDEO: u32 = 6;
/// `Id` value: raw (uncompressed) media subtype.
pub const MEDIA_SUBTYPE_RAW: u32 = 7;
/// `Id` value: DSP-native media subtype.
pub const MEDIA_SUBTYPE_DSP: u32 = 8;
/// `Command` object id: start a node.
pub const COMMAND_NODE_START: u32 = 9;
/// `Command` object id: pause a node.
pub const COMMAND_NODE_PAUSE: u32 = 10;

/// Compile-time-known global type table (§4.E). Row position is
/// insertion order only; semantics live in each row's `v2_id`.
pub static TYPE_TABLE: &[TypeTableRow] = &[
    TypeTableRow {
        name: "Pod:Object:Param:Format",
        v2_id: FORMAT_OBJECT,
    },
    TypeTableRow {
        name: "Pod:Object:Command:Node",
        v2_id: COMMAND_OBJECT,
    },
    TypeTableRow {
        name: "Pod:Object:Param:Format:mediaType",
        v2_id: PROP_MEDIA_TYPE,
    },
    TypeTableRow {
        name: "Pod:Object:Param:Format:mediaSubtype",
        v2_id: PROP_MEDIA_SUBTYPE,
    },
    TypeTableRow {
        name: "Enum:MediaType:audio",
        v2_id: MEDIA_TYPE_AUDIO,
    },
    TypeTableRow {
        name: "Enum:MediaType:video",
        v2_id: MEDIA_TYPE_VIDEO,
    },
    TypeTableRow {
        name: "Enum:MediaSubtype:raw",
        v2_id: MEDIA_SUBTYPE_RAW,
    },
    TypeTableRow {
        name: "Enum:MediaSubtype:dsp",
        v2_id: MEDIA_SUBTYPE_DSP,
    },
    TypeTableRow {
        name: "Enum:Command:Node:Start",
        v2_id: COMMAND_NODE_START,
    },
    TypeTableRow {
        name: "Enum:Command:Node:Pause",
        v2_id: COMMAND_NODE_PAUSE,
    },
];

/// Finds the global-table row index whose name matches `name`.
fn find_row_by_name(name: &str) -> Option<usize> {
    TYPE_TABLE.iter().position(|r| r.name == name)
}

/// Per-connection dynamic map from a v0 peer's slot indices to rows of
/// [`TYPE_TABLE`] (§4.E "Per-client map"). Populated once, at session
/// start, by the demarshaler of an `UpdateTypes` message; read-only
/// afterward (§5 "Shared resources").
#[derive(Debug, Default)]
pub struct ClientTypeTable {
    slot_to_row: HashMap<u32, usize>,
    initialised: bool,
}

impl ClientTypeTable {
    /// An empty, uninitialised table. Every `from_v0`/`from_v2` call
    /// fails with `Uninitialised` until [`ClientTypeTable::install_v0`]
    /// (directly, or via [`ClientTypeTable::apply_update_types`]) has
    /// run at least once.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once at least one `UpdateTypes` entry has been applied.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Resolves a global-table row index from its legacy string name,
    /// without touching the per-client map.
    pub fn find_v0_by_name(&self, name: &str) -> Option<usize> {
        find_row_by_name(name)
    }

    /// Records that the peer's v0 slot `slot` refers to global-table row
    /// `row`.
    pub fn install_v0(&mut self, slot: u32, row: usize) {
        self.slot_to_row.insert(slot, row);
        self.initialised = true;
        tracing::debug!(slot, row, "installed v0 type slot");
    }

    /// Ingests one `UpdateTypes(first_id, names)` batch (§4.E), matching
    /// each string to a global-table row. A name with no matching row is
    /// left untranslatable — not itself an error (§ "Logging").
    pub fn apply_update_types(&mut self, first_id: u32, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            let slot = first_id + i as u32;
            match self.find_v0_by_name(name) {
                Some(row) => self.install_v0(slot, row),
                None => tracing::warn!(slot, name, "UpdateTypes names an unknown type"),
            }
        }
    }

    /// Recovers the global-table row a v0 slot was bound to.
    pub fn lookup_v0(&self, slot: u32) -> Option<usize> {
        self.slot_to_row.get(&slot).copied()
    }

    /// `TYPE_TABLE[row].v2_id`.
    pub fn row_to_v2(&self, row: usize) -> Option<u32> {
        TYPE_TABLE.get(row).map(|r| r.v2_id)
    }

    /// The global-table row whose `v2_id` equals `id`.
    pub fn v2_to_row(&self, id: u32) -> Option<usize> {
        TYPE_TABLE.iter().position(|r| r.v2_id == id)
    }

    /// `from_v0(client, slot)` (§4.E): the v0 peer's local `slot`
    /// translated to a v2 identifier, or `None` (`INVALID`) if the slot
    /// was never installed or its row has no v2 identifier.
    pub fn from_v0(&self, slot: u32) -> Option<u32> {
        self.lookup_v0(slot).and_then(|row| self.row_to_v2(row))
    }

    /// `from_v2(client, id)` (§4.E): a v2 identifier translated to the
    /// global-table row index used as its v0 slot, or `None`
    /// (`INVALID`) if no row carries that identifier.
    pub fn from_v2(&self, id: u32) -> Option<u32> {
        self.v2_to_row(id).map(|row| row as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_types_installs_matching_names_and_skips_unknown() {
        let mut client = ClientTypeTable::new();
        assert!(!client.is_initialised());
        client.apply_update_types(
            100,
            &["Pod:Object:Param:Format", "not:a:real:type", "Enum:MediaType:audio"],
        );
        assert!(client.is_initialised());
        assert_eq!(client.from_v0(100), Some(FORMAT_OBJECT));
        assert_eq!(client.from_v0(101), None);
        assert_eq!(client.from_v0(102), Some(MEDIA_TYPE_AUDIO));
    }

    #[test]
    fn from_v2_finds_the_row_for_a_known_identifier() {
        let mut client = ClientTypeTable::new();
        client.apply_update_types(0, &["Enum:MediaSubtype:raw"]);
        let slot = client.from_v2(MEDIA_SUBTYPE_RAW).unwrap();
        assert_eq!(client.row_to_v2(slot as usize), Some(MEDIA_SUBTYPE_RAW));
    }
}
