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

//! Sprite data remapping.
//!
//! When insertion changes how many bytes a sprite entry occupies in level
//! data, every level record is re-encoded to the new sizes. Records that
//! change length are moved to fresh space by the assembler.

mod relocation;
mod transcode;

pub use relocation::RelocationUnit;
pub use transcode::{entry_key, transcode_record, Transcoded, RECORD_LIMIT};

use std::collections::HashMap;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::assembler::Assembler;
use crate::error::{InsertError, Result};
use crate::rom::Rom;
use crate::sprite::LEVEL_COUNT;

/// Size of the extra byte count table.
pub const EXTRA_BYTE_TABLE_SIZE: usize = 0x400;

/// Byte marking that the ROM carries an extra byte count table.
const EXTRA_BYTE_TABLE_MARKER: usize = 0x07_730F;
const EXTRA_BYTE_TABLE_MARKER_VALUE: u8 = 0x42;

/// Location of the table pointer.
const EXTRA_BYTE_TABLE_POINTER: usize = 0x07_730C;

/// Bank bytes of the level sprite data pointers.
pub const LEVEL_BANK_TABLE: usize = 0x07_7100;

/// Low words of the level sprite data pointers.
pub const LEVEL_WORD_TABLE: usize = 0x02_EC00;

/// Entry sizes of every sprite key, as the game reads level data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraByteTable {
    sizes: [u8; EXTRA_BYTE_TABLE_SIZE],
}

impl Default for ExtraByteTable {
    fn default() -> Self {
        Self {
            sizes: [3; EXTRA_BYTE_TABLE_SIZE],
        }
    }
}

impl ExtraByteTable {
    /// Read the table from a ROM. ROMs without it use 3 for every key.
    pub fn read(rom: &Rom) -> Result<Self> {
        if rom.read_u8(EXTRA_BYTE_TABLE_MARKER)? != EXTRA_BYTE_TABLE_MARKER_VALUE {
            return Ok(Self::default());
        }
        let address = rom.read_u24(EXTRA_BYTE_TABLE_POINTER)?;
        let offset = rom.snes_to_pc(address)?;
        let mut table = Self::default();
        table
            .sizes
            .copy_from_slice(rom.read_n(offset, EXTRA_BYTE_TABLE_SIZE)?);
        Ok(table)
    }

    pub fn from_bytes(bytes: [u8; EXTRA_BYTE_TABLE_SIZE]) -> Self {
        Self { sizes: bytes }
    }

    pub fn get(&self, key: usize) -> u8 {
        self.sizes.get(key).copied().unwrap_or(3)
    }

    pub fn set(&mut self, key: usize, size: u8) {
        if let Some(entry) = self.sizes.get_mut(key) {
            *entry = size;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.sizes
    }
}

/// Settings of a remap run.
#[derive(Debug, Clone, Default)]
pub struct RemapOptions {
    /// Re-encode all levels even if no entry size changed.
    pub always_remap: bool,
    /// `sa1def.asm` included by every relocation patch.
    pub sa1def: PathBuf,
}

/// Re-encodes level sprite data after entry sizes changed.
pub struct RecordRemapper<'a, A: Assembler> {
    assembler: &'a mut A,
    options: RemapOptions,
}

fn level_offsets(level: usize) -> (usize, usize) {
    (LEVEL_BANK_TABLE + level, LEVEL_WORD_TABLE + level * 2)
}

fn level_pointer(rom: &Rom, level: usize) -> Result<u32> {
    let (bank, word) = level_offsets(level);
    Ok(((rom.read_u8(bank)? as u32) << 16) | rom.read_u16(word)? as u32)
}

impl<'a, A: Assembler> RecordRemapper<'a, A> {
    pub fn new(assembler: &'a mut A, options: RemapOptions) -> Self {
        Self { assembler, options }
    }

    /// Remap every level and return how many records were moved.
    ///
    /// On failure the image is restored to its state before the call.
    pub fn run(
        &mut self,
        rom: &mut Rom,
        before: &ExtraByteTable,
        after: &ExtraByteTable,
    ) -> Result<usize> {
        let changed = before != after;
        if changed {
            info!("Extra byte change detected");
        }
        if !changed && !self.options.always_remap {
            debug!("Extra bytes unchanged, nothing to remap");
            return Ok(0);
        }

        let snapshot = rom.data().to_vec();
        match self.remap_levels(rom, before, after) {
            Ok(count) => {
                info!("Sprite data remapped successfully ({} level(s))", count);
                Ok(count)
            }
            Err(err) => {
                rom.restore(snapshot);
                Err(err)
            }
        }
    }

    fn remap_levels(
        &mut self,
        rom: &mut Rom,
        before: &ExtraByteTable,
        after: &ExtraByteTable,
    ) -> Result<usize> {
        let mut handled: HashMap<u32, usize> = HashMap::new();
        let mut count = 0;

        for level in 0..LEVEL_COUNT {
            let pointer = level_pointer(rom, level)?;
            let start = match rom.snes_to_pc(pointer) {
                Ok(start) if start < rom.len() => start,
                _ => {
                    warn!(
                        "Level {:03X}: sprite data pointer ${:06X} is outside the ROM, skipped",
                        level, pointer
                    );
                    continue;
                }
            };

            if let Some(&first) = handled.get(&pointer) {
                self.share_pointer(rom, first, level)?;
                continue;
            }
            handled.insert(pointer, level);

            let record = transcode_record(rom.data(), start, before, after).map_err(|err| {
                InsertError::new(err.code, format!("Level {:03X}: {}", level, err.message))
            })?;
            if !record.is_resized() {
                continue;
            }

            let (bank, word) = level_offsets(level);
            let unit = RelocationUnit {
                level: level as u16,
                blob: record.bytes,
                bank_address: rom.pc_to_snes(bank),
                word_address: rom.pc_to_snes(word),
            };
            debug!(
                "Fixing sprite data for level {:03X}: 0x{:X} -> 0x{:X} bytes",
                level,
                record.consumed,
                unit.blob.len()
            );
            let patch = unit.patch(&self.options.sa1def);
            let symbols = self
                .assembler
                .apply(&patch, rom.data_mut())
                .map_err(|diagnostics| {
                    InsertError::assembler(
                        format!("Failed to relocate sprite data of level {:03X}", level),
                        diagnostics,
                    )
                })?;
            for symbol in symbols {
                debug!("\t{}", symbol);
            }
            count += 1;
        }
        Ok(count)
    }

    /// Give `level` the data pointer `first` ended up with.
    fn share_pointer(&self, rom: &mut Rom, first: usize, level: usize) -> Result<()> {
        let (first_bank, first_word) = level_offsets(first);
        let (bank, word) = level_offsets(level);
        let bank_byte = rom.read_u8(first_bank)?;
        let word_value = rom.read_u16(first_word)?;
        rom.write_u8(bank, bank_byte)?;
        rom.write_u16(word, word_value)?;
        debug!("Level {:03X} shares sprite data with level {:03X}", level, first);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_defaults_to_three() {
        let rom = Rom::from_bytes(vec![0; 0x80000]);
        let table = ExtraByteTable::read(&rom).unwrap();
        assert_eq!(table, ExtraByteTable::default());
        assert_eq!(table.get(0x3FF), 3);
    }

    #[test]
    fn test_table_is_read_through_pointer() {
        let mut rom = Rom::from_bytes(vec![0; 0x80000]);
        rom.write_u8(EXTRA_BYTE_TABLE_MARKER, 0x42).unwrap();
        rom.write_u24(EXTRA_BYTE_TABLE_POINTER, 0x0E_8000).unwrap();
        let offset = rom.snes_to_pc(0x0E_8000).unwrap();
        let mut sizes = [3u8; EXTRA_BYTE_TABLE_SIZE];
        sizes[0x105] = 7;
        rom.write_n(offset, &sizes).unwrap();

        let table = ExtraByteTable::read(&rom).unwrap();
        assert_eq!(table.get(0x105), 7);
        assert_eq!(table.get(0x005), 3);
    }
}
