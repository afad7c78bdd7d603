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

//! Bump allocation for per-level sprite tables.
//!
//! Per-level sprites are stored in three linked tables:
//!
//! ```text
//! level pointers (0x400)     directory (0x20 per level)    payload (0x10 per sprite)
//! +--------------+           +----------------------+      +------------------+
//! | level 105 ---+---------> | B0 B1 B2 ... BF      |      | record B2 @105   |
//! +--------------+           |       |              |      +------------------+
//!                            +-------+--------------+      | ...              |
//!                                    +-------------------> +------------------+
//! ```
//!
//! Every link is stored as `offset + 1` so that zero means "unused".

use crate::error::{ErrorCode, InsertError, Result};
use crate::sprite::{StatusPointers, LEVEL_COUNT, PER_LEVEL_FIRST};
use crate::tables::{SpriteTable, RECORD_SIZE};
use log::debug;

/// Size of the level pointer table.
pub const LEVEL_TABLE_SIZE: usize = LEVEL_COUNT * 2;

/// Directory bytes per level (16 slots, 2 bytes each).
pub const DIRECTORY_ENTRY_SIZE: usize = 0x20;

/// Capacity of the directory region.
pub const DIRECTORY_CAPACITY: usize = LEVEL_COUNT * DIRECTORY_ENTRY_SIZE;

/// Capacity of the payload region.
pub const PAYLOAD_CAPACITY: usize = 0x8000;

/// A bump allocator over a fixed-capacity byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    name: &'static str,
    buffer: Vec<u8>,
    cursor: usize,
}

impl Arena {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            buffer: vec![0; capacity],
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reserve `size` bytes and return their base offset.
    ///
    /// On failure the cursor is left where it was.
    pub fn allocate(&mut self, size: usize) -> Result<usize> {
        let base = self.cursor;
        let end = base
            .checked_add(size)
            .filter(|&end| end <= self.buffer.len())
            .ok_or_else(|| {
                InsertError::new(
                    ErrorCode::ArenaExhausted,
                    format!(
                        "The {} area is full (0x{:X} of 0x{:X} bytes used)",
                        self.name,
                        self.cursor,
                        self.buffer.len()
                    ),
                )
                .with_hint("remove some per-level sprites")
            })?;
        self.cursor = end;
        Ok(base)
    }

    /// Write into an already allocated range.
    pub fn write(&mut self, base: usize, bytes: &[u8]) -> Result<()> {
        match base.checked_add(bytes.len()) {
            Some(end) if end <= self.cursor => {
                self.buffer[base..end].copy_from_slice(bytes);
                Ok(())
            }
            _ => Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!(
                    "Write of {} bytes at 0x{:X} is outside the allocated {} area",
                    bytes.len(),
                    base,
                    self.name
                ),
            )),
        }
    }

    /// The allocated part of the buffer.
    pub fn used(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }
}

/// The four serialized per-level tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerLevelTables {
    pub level_pointers: Vec<u8>,
    pub sprite_pointers: Vec<u8>,
    pub data: Vec<u8>,
    pub custom_pointers: Vec<u8>,
}

/// Allocator state for all per-level sprites of a run.
#[derive(Debug, Clone)]
pub struct PerLevelArenas {
    level_pointers: Vec<u8>,
    directory: Arena,
    payload: Arena,
    status: Vec<u8>,
}

impl Default for PerLevelArenas {
    fn default() -> Self {
        Self {
            level_pointers: vec![0; LEVEL_TABLE_SIZE],
            directory: Arena::new("per-level directory", DIRECTORY_CAPACITY),
            payload: Arena::new("per-level sprite", PAYLOAD_CAPACITY),
            status: vec![0; PAYLOAD_CAPACITY],
        }
    }
}

impl PerLevelArenas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory offset of a level, allocating it on first use.
    pub fn level_directory(&mut self, level: u16) -> Result<usize> {
        let index = level as usize * 2;
        if index + 1 >= self.level_pointers.len() {
            return Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!("Level {:03X} is out of range", level),
            ));
        }
        let stored =
            u16::from_le_bytes([self.level_pointers[index], self.level_pointers[index + 1]]);
        if stored != 0 {
            return Ok(stored as usize - 1);
        }
        let base = self.directory.allocate(DIRECTORY_ENTRY_SIZE)?;
        let link = (base + 1) as u16;
        self.level_pointers[index..index + 2].copy_from_slice(&link.to_le_bytes());
        debug!("Level {:03X} directory at 0x{:04X}", level, base);
        Ok(base)
    }

    /// Place one per-level sprite and return its payload offset.
    pub fn place(
        &mut self,
        level: u16,
        number: u8,
        table: &SpriteTable,
        status: &StatusPointers,
    ) -> Result<usize> {
        let slot = number.checked_sub(PER_LEVEL_FIRST).map(usize::from);
        let Some(slot) = slot.filter(|&s| s < DIRECTORY_ENTRY_SIZE / 2) else {
            return Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!("Sprite {:02X} cannot be assigned to a level", number),
            ));
        };
        let directory = self.level_directory(level)?;
        let base = self.payload.allocate(RECORD_SIZE)?;
        let link = (base + 1) as u16;
        self.directory
            .write(directory + slot * 2, &link.to_le_bytes())?;
        self.payload.write(base, &table.encode())?;
        self.status[base..base + StatusPointers::SIZE].copy_from_slice(&status.to_bytes());
        self.status[base + StatusPointers::SIZE] = 0xFF;
        Ok(base)
    }

    /// Whether no per-level sprite has been placed.
    pub fn is_empty(&self) -> bool {
        self.payload.cursor() == 0
    }

    pub fn payload_cursor(&self) -> usize {
        self.payload.cursor()
    }

    /// Serialize the tables. Without sprites the variable tables are `[0xFF]`.
    pub fn finish(&self) -> PerLevelTables {
        if self.is_empty() {
            return PerLevelTables {
                level_pointers: self.level_pointers.clone(),
                sprite_pointers: vec![0xFF],
                data: vec![0xFF],
                custom_pointers: vec![0xFF],
            };
        }
        PerLevelTables {
            level_pointers: self.level_pointers.clone(),
            sprite_pointers: self.directory.used().to_vec(),
            data: self.payload.used().to_vec(),
            custom_pointers: self.status[..self.payload.cursor()].to_vec(),
        }
    }
}
