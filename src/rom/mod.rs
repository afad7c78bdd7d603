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

//! ROM image handling.
//!
//! A [`Rom`] owns the headerless image bytes and carries the optional
//! copier header separately, so every offset used by the rest of the crate
//! is a flat offset into the image proper.

mod address;
pub mod checks;
mod pointer;

pub use address::{AddressSpace, Mapper, MAP_MODE_OFFSET};
pub use pointer::{Pointer, EMPTY_POINTER_ADDRESS};

use crate::error::{ErrorCode, InsertError, Result};
use std::fs;
use std::path::Path;

/// Size of one LoROM page; copier headers are the remainder modulo this.
pub const PAGE_SIZE: usize = 0x8000;

/// A SNES ROM image with its copier header carried separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    header: Vec<u8>,
    data: Vec<u8>,
    space: AddressSpace,
}

impl Rom {
    /// Split raw file contents into header and image.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let header_size = bytes.len() % PAGE_SIZE;
        let data = bytes.split_off(header_size);
        let space = AddressSpace::new(Mapper::detect(&data));
        Self {
            header: bytes,
            data,
            space,
        }
    }

    /// Load a ROM file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            InsertError::new(
                ErrorCode::IoFailure,
                format!("Cannot read ROM {}: {}", path.display(), e),
            )
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Write header and image back to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut bytes = Vec::with_capacity(self.header.len() + self.data.len());
        bytes.extend_from_slice(&self.header);
        bytes.extend_from_slice(&self.data);
        fs::write(path, bytes).map_err(|e| {
            InsertError::new(
                ErrorCode::IoFailure,
                format!("Cannot write ROM {}: {}", path.display(), e),
            )
        })
    }

    /// The copier header (usually empty or 512 bytes).
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// The headerless image.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access for the external assembler.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Replace the whole image, keeping the header.
    pub fn restore(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Size of the headerless image.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert a SNES address to a flat offset, failing if unmapped.
    pub fn snes_to_pc(&self, address: u32) -> Result<usize> {
        self.space.to_flat(address).ok_or_else(|| {
            InsertError::new(
                ErrorCode::OutOfRange,
                format!("${:06X} does not map into the ROM", address),
            )
        })
    }

    /// Convert a flat offset to a SNES address.
    pub fn pc_to_snes(&self, offset: usize) -> u32 {
        self.space.to_native(offset)
    }

    fn check_range(&self, offset: usize, len: usize, what: &str) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!(
                    "{} of {} bytes at 0x{:06X} is outside the ROM (size 0x{:06X})",
                    what,
                    len,
                    offset,
                    self.data.len()
                ),
            )),
        }
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        self.check_range(offset, 1, "read")?;
        Ok(self.data[offset])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        self.check_range(offset, 2, "read")?;
        Ok(u16::from_le_bytes([self.data[offset], self.data[offset + 1]]))
    }

    pub fn read_u24(&self, offset: usize) -> Result<u32> {
        Ok(self.space.read_pointer(&self.data, offset, 3)?.addr())
    }

    pub fn read_n(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check_range(offset, len, "read")?;
        Ok(&self.data[offset..offset + len])
    }

    /// Read a 3-byte pointer stored at a SNES address.
    pub fn read_pointer_snes(&self, address: u32) -> Result<Pointer> {
        let offset = self.snes_to_pc(address)?;
        self.space.read_pointer(&self.data, offset, 3)
    }

    /// Whether a pointer read from this image means "unset".
    pub fn is_unset(&self, pointer: Pointer) -> bool {
        self.space.is_empty(pointer)
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        self.check_range(offset, 1, "write")?;
        self.data[offset] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<()> {
        self.write_n(offset, &value.to_le_bytes())
    }

    pub fn write_u24(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write_n(offset, &Pointer::from_snes(value).to_bytes())
    }

    pub fn write_n(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.check_range(offset, bytes.len(), "write")?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
