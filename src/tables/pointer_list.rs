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

//! Fixed-size tri-byte pointer arrays.

use crate::error::{ErrorCode, InsertError, Result};
use crate::rom::Pointer;
use crate::sprite::StatusPointers;

/// Number of entries in the cluster and extended lists.
pub const POINTER_LIST_SIZE: usize = 0x80;

/// Number of entries in the status pointer table.
pub const STATUS_TABLE_SIZE: usize = 0x100;

fn index_error(what: &str, index: usize, len: usize) -> InsertError {
    InsertError::new(
        ErrorCode::OutOfRange,
        format!("{} index 0x{:X} exceeds table size 0x{:X}", what, index, len),
    )
}

/// An array of pointers whose unset entries hold the empty sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerList {
    entries: Vec<Pointer>,
}

impl Default for PointerList {
    fn default() -> Self {
        Self::new(POINTER_LIST_SIZE)
    }
}

impl PointerList {
    pub fn new(len: usize) -> Self {
        Self {
            entries: vec![Pointer::EMPTY; len],
        }
    }

    pub fn set(&mut self, index: usize, pointer: Pointer) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| index_error("Pointer list", index, len))?;
        *entry = pointer;
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<Pointer> {
        self.entries.get(index).copied()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|p| p.to_bytes()).collect()
    }
}

/// Status routines of every global sprite, 15 bytes per sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPointerTable {
    entries: Vec<StatusPointers>,
}

impl Default for StatusPointerTable {
    fn default() -> Self {
        Self {
            entries: vec![StatusPointers::UNUSED; STATUS_TABLE_SIZE],
        }
    }
}

impl StatusPointerTable {
    pub fn set(&mut self, number: u8, status: StatusPointers) {
        self.entries[number as usize] = status;
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|s| s.to_bytes()).collect()
    }
}
