// Spriteweave - Custom sprite insertion for SNES ROM images
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Binary tables handed to the main patch.
//!
//! The main patch `incbin`s these files, so every table has a fixed size
//! and layout:
//!
//! - sprite table records (16 bytes per sprite)
//! - status, cluster, extended and cape pointer lists (3 bytes per entry)
//! - the additional byte count table (`3 + count` per sprite)
//! - the version flag

mod pointer_list;
mod record;

pub use pointer_list::{PointerList, StatusPointerTable, POINTER_LIST_SIZE, STATUS_TABLE_SIZE};
pub use record::{encode_table, SpriteTable, RECORD_SIZE};

use crate::arena::PerLevelTables;
use crate::TOOL_VERSION;

/// Size of the byte count table (bit clear half, then bit set half).
pub const BYTE_COUNT_TABLE_SIZE: usize = 0x200;

/// Byte count forced onto reserved sprite numbers.
pub const RESERVED_BYTE_COUNT: u8 = 7;

/// Bit of the version flags marking per-level mode.
pub const FLAG_PER_LEVEL: u8 = 0x01;

/// Entry size of every sprite number, with and without the extra bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteCountTable {
    entries: [u8; BYTE_COUNT_TABLE_SIZE],
}

impl Default for ByteCountTable {
    fn default() -> Self {
        Self {
            entries: [3; BYTE_COUNT_TABLE_SIZE],
        }
    }
}

impl ByteCountTable {
    /// Store additional byte counts for a sprite number.
    pub fn set(&mut self, number: u8, clear: u8, set: u8) {
        self.entries[number as usize] = 3 + clear;
        self.entries[number as usize + 0x100] = 3 + set;
    }

    /// Mark a sprite number as reserved.
    pub fn reserve(&mut self, number: u8) {
        self.set(number, RESERVED_BYTE_COUNT - 3, RESERVED_BYTE_COUNT - 3);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.entries
    }
}

/// Build the 4-byte version flag.
pub fn version_flag(per_level: bool) -> [u8; 4] {
    let flags = if per_level { FLAG_PER_LEVEL } else { 0 };
    [TOOL_VERSION, flags, 0, 0]
}

/// Every serialized table of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTables {
    pub version_flag: [u8; 4],
    pub default_table: Vec<u8>,
    pub per_level: Option<PerLevelTables>,
    pub status_pointers: Vec<u8>,
    pub cluster: Vec<u8>,
    pub extended: Vec<u8>,
    pub extended_cape: Vec<u8>,
    pub byte_counts: Vec<u8>,
}

impl BinaryTables {
    /// File names and contents, in write order.
    pub fn files(&self) -> Vec<(&'static str, &[u8])> {
        let mut files: Vec<(&'static str, &[u8])> = vec![
            ("_versionflag.bin", &self.version_flag[..]),
            ("_DefaultTables.bin", &self.default_table),
        ];
        if let Some(per_level) = &self.per_level {
            files.push(("_PerLevelLvlPtrs.bin", &per_level.level_pointers));
            files.push(("_PerLevelSprPtrs.bin", &per_level.sprite_pointers));
            files.push(("_PerLevelT.bin", &per_level.data));
            files.push(("_PerLevelCustomPtrTable.bin", &per_level.custom_pointers));
        }
        files.push(("_CustomStatusPtr.bin", &self.status_pointers));
        files.push(("_ClusterPtr.bin", &self.cluster));
        files.push(("_ExtendedPtr.bin", &self.extended));
        files.push(("_ExtendedCapePtr.bin", &self.extended_cape));
        files.push(("_CustomSize.bin", &self.byte_counts));
        files
    }
}

/// Names of every table file that may be written.
pub const TABLE_FILES: [&str; 11] = [
    "_versionflag.bin",
    "_DefaultTables.bin",
    "_PerLevelLvlPtrs.bin",
    "_PerLevelSprPtrs.bin",
    "_PerLevelT.bin",
    "_PerLevelCustomPtrTable.bin",
    "_CustomStatusPtr.bin",
    "_ClusterPtr.bin",
    "_ExtendedPtr.bin",
    "_ExtendedCapePtr.bin",
    "_CustomSize.bin",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_counts() {
        let mut table = ByteCountTable::default();
        table.set(0x10, 2, 12);
        table.reserve(0xB0);
        let bytes = table.as_bytes();
        assert_eq!(bytes.len(), BYTE_COUNT_TABLE_SIZE);
        assert_eq!(bytes[0x00], 3);
        assert_eq!(bytes[0x10], 5);
        assert_eq!(bytes[0x110], 15);
        assert_eq!(bytes[0xB0], 7);
        assert_eq!(bytes[0x1B0], 7);
    }

    #[test]
    fn test_version_flag() {
        assert_eq!(version_flag(false), [TOOL_VERSION, 0, 0, 0]);
        assert_eq!(version_flag(true)[1], FLAG_PER_LEVEL);
    }

    #[test]
    fn test_files_without_per_level() {
        let tables = BinaryTables {
            version_flag: version_flag(false),
            default_table: vec![0xFF; RECORD_SIZE],
            per_level: None,
            status_pointers: StatusPointerTable::default().to_bytes(),
            cluster: PointerList::default().to_bytes(),
            extended: PointerList::default().to_bytes(),
            extended_cape: PointerList::default().to_bytes(),
            byte_counts: ByteCountTable::default().as_bytes().to_vec(),
        };
        let names: Vec<&str> = tables.files().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), 7);
        assert!(!names.contains(&"_PerLevelT.bin"));
        assert!(names.iter().all(|n| TABLE_FILES.contains(n)));
    }
}
