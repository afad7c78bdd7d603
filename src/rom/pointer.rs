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

//! Tri-byte SNES pointers.

use std::fmt;

/// Address of the `RTL` in bank 1 that marks an unset routine pointer.
pub const EMPTY_POINTER_ADDRESS: u32 = 0x01_8021;

/// A 24-bit SNES pointer stored as (low, high, bank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub low: u8,
    pub high: u8,
    pub bank: u8,
}

impl Pointer {
    /// The "unset" sentinel. Routine slots default to this value.
    pub const EMPTY: Pointer = Pointer::from_snes(EMPTY_POINTER_ADDRESS);

    /// The all-zero pointer. This is a valid value, not the sentinel.
    pub const NULL: Pointer = Pointer::from_snes(0);

    /// Build a pointer from a 24-bit SNES address.
    pub const fn from_snes(address: u32) -> Self {
        Self {
            low: (address & 0xFF) as u8,
            high: ((address >> 8) & 0xFF) as u8,
            bank: ((address >> 16) & 0xFF) as u8,
        }
    }

    /// Decode the little-endian wire form.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            low: bytes[0],
            high: bytes[1],
            bank: bytes[2],
        }
    }

    /// Encode to the little-endian wire form.
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.low, self.high, self.bank]
    }

    /// The 24-bit address.
    pub const fn addr(self) -> u32 {
        ((self.bank as u32) << 16) | ((self.high as u32) << 8) | self.low as u32
    }

    /// Replace the bank byte.
    pub const fn with_bank(self, bank: u8) -> Self {
        Self { bank, ..self }
    }

    /// Whether this is the default "unset" sentinel.
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:06X}", self.addr())
    }
}
