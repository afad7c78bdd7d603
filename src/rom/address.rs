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

//! Mapping between SNES bus addresses and flat ROM file offsets.
//!
//! Two cartridge layouts are supported:
//! - LoROM: 32 KiB pages in the upper half of banks `$00-$7D`
//! - SA-1: LoROM pages for the first 4 MiB, plus HiROM-style banks `$C0-$FF`

use super::pointer::Pointer;
use crate::error::{ErrorCode, InsertError, Result};

/// Offset of the map mode byte in the internal header.
pub const MAP_MODE_OFFSET: usize = 0x7FD5;

/// Map mode value of SA-1 cartridges.
const SA1_MAP_MODE: u8 = 0x23;

/// Cartridge memory mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mapper {
    #[default]
    LoRom,
    Sa1,
}

impl Mapper {
    /// Detect the mapping from the internal header of a headerless image.
    pub fn detect(data: &[u8]) -> Self {
        match data.get(MAP_MODE_OFFSET) {
            Some(&SA1_MAP_MODE) => Mapper::Sa1,
            _ => Mapper::LoRom,
        }
    }
}

/// Pure address arithmetic for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    mapper: Mapper,
    empty: Pointer,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(Mapper::LoRom)
    }
}

impl AddressSpace {
    /// Create an address space whose empty sentinel is [`Pointer::EMPTY`].
    pub fn new(mapper: Mapper) -> Self {
        Self {
            mapper,
            empty: Pointer::EMPTY,
        }
    }

    /// Convert a SNES address to a flat offset.
    ///
    /// Returns `None` for addresses that do not map to ROM.
    pub fn to_flat(&self, native: u32) -> Option<usize> {
        if native > 0xFF_FFFF {
            return None;
        }
        match self.mapper {
            Mapper::LoRom => {
                let bank = native >> 16;
                if native & 0x8000 == 0 || (bank & 0x7F) >= 0x7E {
                    return None;
                }
                Some((((native & 0x7F_0000) >> 1) | (native & 0x7FFF)) as usize)
            }
            Mapper::Sa1 => {
                if native >= 0xC0_0000 {
                    return Some((native - 0x80_0000) as usize);
                }
                if native & 0x8000 == 0 {
                    return None;
                }
                let mut address = native;
                if address >= 0x80_0000 {
                    address -= 0x40_0000;
                }
                Some(((address & 0x7FFF) | ((address >> 1) & 0x7F_8000)) as usize)
            }
        }
    }

    /// Convert a flat offset to its canonical SNES address.
    pub fn to_native(&self, offset: usize) -> u32 {
        let offset = offset as u32;
        match self.mapper {
            Mapper::LoRom => (offset & 0x7FFF) | 0x8000 | ((offset & 0x3F_8000) << 1),
            Mapper::Sa1 => {
                if offset >= 0x40_0000 {
                    return offset + 0x80_0000;
                }
                let address = (offset & 0x7FFF) | ((offset & !0x7FFF) << 1) | 0x8000;
                if address >= 0x40_0000 {
                    address + 0x40_0000
                } else {
                    address
                }
            }
        }
    }

    /// Read a 2- or 3-byte pointer at a flat offset.
    ///
    /// A 2-byte read yields a pointer in bank `$00`.
    pub fn read_pointer(&self, image: &[u8], offset: usize, width: usize) -> Result<Pointer> {
        if !(2..=3).contains(&width) {
            return Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!("Unsupported pointer width {}", width),
            ));
        }
        let end = offset.checked_add(width).filter(|&end| end <= image.len());
        let Some(end) = end else {
            return Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!(
                    "Pointer read of {} bytes at 0x{:06X} exceeds image size 0x{:06X}",
                    width,
                    offset,
                    image.len()
                ),
            ));
        };
        let bytes = &image[offset..end];
        let bank = if width == 3 { bytes[2] } else { 0 };
        Ok(Pointer::from_bytes([bytes[0], bytes[1], bank]))
    }

    /// Whether a pointer is this address space's empty sentinel.
    pub fn is_empty(&self, pointer: Pointer) -> bool {
        pointer == self.empty
    }
}
