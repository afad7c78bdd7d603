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

//! Sanity checks run before anything touches the ROM.

use super::Rom;
use crate::error::{ErrorCode, InsertError, Result};
use crate::TOOL_VERSION;

/// Pointer that Lunar Magic sets once a level has been saved.
pub const LM_EDIT_POINTER: u32 = 0x06_F624;

/// First byte of Lunar Magic's VRAM optimization hijack.
pub const VRAM_PATCH_ADDRESS: u32 = 0x00_F6E4;

/// Location of the `STSD` tag written by a previous run.
pub const TOOL_TAG_ADDRESS: u32 = 0x02_FFE2;

/// Version byte following the tag.
pub const TOOL_VERSION_ADDRESS: u32 = TOOL_TAG_ADDRESS + 4;

/// Flags byte following the version.
pub const TOOL_FLAGS_ADDRESS: u32 = TOOL_TAG_ADDRESS + 5;

const JML_OPCODE: u8 = 0x5C;

/// Run every pre-insertion check.
pub fn run_checks(rom: &Rom) -> Result<()> {
    let edit = rom.read_pointer_snes(LM_EDIT_POINTER)?;
    if edit.addr() == 0xFF_FFFF {
        return Err(InsertError::new(
            ErrorCode::RomCheckFailed,
            "No level has been saved in Lunar Magic yet",
        )
        .with_hint("save any level in Lunar Magic before inserting sprites"));
    }

    let vram = rom.read_u8(rom.snes_to_pc(VRAM_PATCH_ADDRESS)?)?;
    if vram != JML_OPCODE {
        return Err(InsertError::new(
            ErrorCode::RomCheckFailed,
            "The Lunar Magic VRAM optimization patch is not installed",
        )
        .with_hint("apply the VRAM patch from Lunar Magic's menu and retry"));
    }

    let version = previous_version(rom)?;
    if let Some(version) = version {
        if version > TOOL_VERSION {
            return Err(InsertError::new(
                ErrorCode::RomCheckFailed,
                format!(
                    "The ROM was patched by a newer version (1.{:02X}); this is 1.{:02X}",
                    version, TOOL_VERSION
                ),
            ));
        }
    }

    Ok(())
}

/// Version byte left by a previous run, if any.
pub fn previous_version(rom: &Rom) -> Result<Option<u8>> {
    let version = rom.read_u8(rom.snes_to_pc(TOOL_VERSION_ADDRESS)?)?;
    Ok((version != 0xFF).then_some(version))
}

/// Whether a previous run tagged the ROM.
pub fn has_tool_tag(rom: &Rom) -> Result<bool> {
    let offset = rom.snes_to_pc(TOOL_TAG_ADDRESS)?;
    Ok(rom.read_n(offset, 4)? == b"STSD")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rom() -> Rom {
        let mut rom = Rom::from_bytes(vec![0xFF; 0x80000]);
        let edit = rom.snes_to_pc(LM_EDIT_POINTER).unwrap();
        rom.write_u24(edit, 0x12_8000).unwrap();
        let vram = rom.snes_to_pc(VRAM_PATCH_ADDRESS).unwrap();
        rom.write_u8(vram, JML_OPCODE).unwrap();
        rom
    }

    #[test]
    fn test_valid_rom_passes() {
        assert!(run_checks(&valid_rom()).is_ok());
    }

    #[test]
    fn test_unsaved_level_fails() {
        let mut rom = valid_rom();
        let edit = rom.snes_to_pc(LM_EDIT_POINTER).unwrap();
        rom.write_u24(edit, 0xFF_FFFF).unwrap();
        let err = run_checks(&rom).unwrap_err();
        assert_eq!(err.code, ErrorCode::RomCheckFailed);
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_missing_vram_patch_fails() {
        let mut rom = valid_rom();
        let vram = rom.snes_to_pc(VRAM_PATCH_ADDRESS).unwrap();
        rom.write_u8(vram, 0x22).unwrap();
        assert_eq!(run_checks(&rom).unwrap_err().code, ErrorCode::RomCheckFailed);
    }

    #[test]
    fn test_newer_version_fails() {
        let mut rom = valid_rom();
        let version = rom.snes_to_pc(TOOL_VERSION_ADDRESS).unwrap();
        rom.write_u8(version, TOOL_VERSION + 1).unwrap();
        assert!(run_checks(&rom).unwrap_err().message.contains("newer version"));

        rom.write_u8(version, TOOL_VERSION).unwrap();
        assert!(run_checks(&rom).is_ok());
    }

    #[test]
    fn test_tool_tag() {
        let mut rom = valid_rom();
        assert!(!has_tool_tag(&rom).unwrap());
        let tag = rom.snes_to_pc(TOOL_TAG_ADDRESS).unwrap();
        rom.write_n(tag, b"STSD").unwrap();
        assert!(has_tool_tag(&rom).unwrap());
    }
}
