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

//! The 16-byte sprite table record.

use crate::rom::Pointer;

/// Size of one encoded sprite table record.
pub const RECORD_SIZE: usize = 0x10;

/// One row of the sprite table.
///
/// Byte layout:
///
/// | Offset | Size | Field              |
/// |--------|------|--------------------|
/// | 0      | 1    | type               |
/// | 1      | 1    | act-like           |
/// | 2      | 6    | tweak bytes        |
/// | 8      | 3    | init pointer       |
/// | 11     | 3    | main pointer       |
/// | 14     | 2    | extra property     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteTable {
    pub sprite_type: u8,
    pub act_like: u8,
    pub tweak: [u8; 6],
    pub init: Pointer,
    pub main: Pointer,
    pub extra: [u8; 2],
}

impl SpriteTable {
    /// Encode to the 16-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0] = self.sprite_type;
        out[1] = self.act_like;
        out[2..8].copy_from_slice(&self.tweak);
        out[8..11].copy_from_slice(&self.init.to_bytes());
        out[11..14].copy_from_slice(&self.main.to_bytes());
        out[14..16].copy_from_slice(&self.extra);
        out
    }

    /// Decode from the 16-byte wire form.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut tweak = [0u8; 6];
        tweak.copy_from_slice(&bytes[2..8]);
        Self {
            sprite_type: bytes[0],
            act_like: bytes[1],
            tweak,
            init: Pointer::from_bytes([bytes[8], bytes[9], bytes[10]]),
            main: Pointer::from_bytes([bytes[11], bytes[12], bytes[13]]),
            extra: [bytes[14], bytes[15]],
        }
    }

    /// Whether neither entry point has been set.
    pub fn has_no_entry_points(&self) -> bool {
        self.init.is_empty() && self.main.is_empty()
    }
}

/// Encode a full table, one record per row.
///
/// A table whose rows all lack entry points collapses into a single
/// all-`0xFF` record.
pub fn encode_table(rows: &[SpriteTable]) -> Vec<u8> {
    if rows.iter().all(SpriteTable::has_no_entry_points) {
        return vec![0xFF; RECORD_SIZE];
    }
    rows.iter().flat_map(|row| row.encode()).collect()
}
