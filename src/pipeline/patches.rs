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

//! Generated patch text.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::Patch;
use crate::error::{ErrorCode, InsertError, Result};
use crate::rom::checks::{has_tool_tag, TOOL_FLAGS_ADDRESS, TOOL_VERSION_ADDRESS};
use crate::rom::Rom;
use crate::sprite::SpriteSlot;
use crate::tables::FLAG_PER_LEVEL;

/// File name of the per-sprite wrapper patch.
pub const SPRITE_PATCH: &str = "spr_temp.asm";

/// File name of the shared routine library.
pub const SHARED_LIBRARY: &str = "shared.asm";

/// File name of the cleanup patch.
pub const CLEANUP_PATCH: &str = "_cleanup.asm";

/// File name of the generated configuration defines.
pub const CONFIG_FILE: &str = "config.asm";

/// Routine pointer table in the ROM.
pub const ROUTINE_TABLE: u32 = 0x03_E05C;

/// Maximum number of shared routines.
pub const MAX_ROUTINES: usize = 100;

/// Pointer to the per-level tables of a previous run.
const PER_LEVEL_TABLE_POINTER: u32 = 0x02_FFF1;

/// Pointer to the global sprite table of a previous run.
const GLOBAL_TABLE_POINTER: u32 = 0x02_FFEE;

/// Bank bytes of the per-level tables of old versions.
const OLD_PER_LEVEL_BANKS: u32 = 0x02_FFEA;

/// Cluster pointer table hijack and its vanilla value.
const CLUSTER_TABLE_POINTER: u32 = 0x00_A68A;
const VANILLA_CLUSTER_TABLE: u32 = 0x9C_1498;

/// Extended pointer table hijack and its vanilla value.
const EXTENDED_TABLE_POINTER: u32 = 0x02_9B1F;
const VANILLA_EXTENDED_TABLE: u32 = 0x17_6FBC;

/// First version with the current per-level layout.
const PER_LEVEL_LAYOUT_VERSION: u8 = 30;

/// Offset of the main pointer inside a sprite table record.
const MAIN_POINTER_OFFSET: u32 = 0x0B;

/// Render a path for asar, with forward slashes and escaped defines.
pub fn asar_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace('!', "\\!")
}

/// Defines describing the run, included by the main patch.
pub fn config_defines(per_level: bool, disable_255_per_level: bool) -> String {
    format!(
        "!PerLevel = {}\n!Disable255SpritesPerLevel = {}",
        u8::from(per_level),
        u8::from(disable_255_per_level)
    )
}

/// Wrapper patch assembling one sprite source.
pub fn sprite_wrapper(slot: &SpriteSlot, asm_dir: &Path, extra_defines: &[PathBuf]) -> Patch {
    let mut text = String::new();
    let _ = writeln!(text, "namespace nested on");
    let _ = writeln!(text, "incsrc \"{}\"", asar_path(&asm_dir.join("sa1def.asm")));
    for define in extra_defines {
        let _ = writeln!(text, "incsrc \"{}\"", asar_path(define));
    }
    let _ = writeln!(text, "incsrc \"{}\"", SHARED_LIBRARY);
    let _ = writeln!(text, "SPRITE_ENTRY_{}:", slot.id.number);
    let _ = writeln!(
        text,
        "incsrc \"{}\"",
        asar_path(&slot.directory.join("_header.asm"))
    );
    let _ = writeln!(text, "freecode cleaned");
    if let Some(source) = &slot.asm_file {
        let _ = writeln!(text, "\tincsrc \"{}\"", asar_path(source));
    }
    let _ = writeln!(text, "namespace nested off");
    Patch::text(SPRITE_PATCH, text)
}

const INCLUDE_ONCE_MACRO: &str = "\
macro include_once(target, base, offset)
\tif !<base> != 1
\t\t!<base> = 1
\t\tpushpc
\t\tif read3(<offset>+$03E05C) != $FFFFFF
\t\t\t<base> = read3(<offset>+$03E05C)
\t\telse
\t\t\tfreecode cleaned
\t\t\t\t#<base>:
\t\t\t\tprint \"\tRoutine: <base> inserted at $\",pc
\t\t\t\tnamespace <base>
\t\t\t\tincsrc \"<target>\"
\t\t\t\tnamespace off
\t\t\tORG <offset>+$03E05C
\t\t\t\tdl <base>
\t\tendif
\t\tpullpc
\tendif
endmacro
";

/// Collect `*.asm` files below a directory, sorted.
pub fn list_asm_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("asm"))
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Macro library giving every shared routine an `include_once` wrapper.
pub fn shared_routines(routines: &[PathBuf]) -> Result<String> {
    if routines.len() > MAX_ROUTINES {
        return Err(InsertError::new(
            ErrorCode::ArenaExhausted,
            format!(
                "{} shared routines found, at most {} are supported",
                routines.len(),
                MAX_ROUTINES
            ),
        )
        .with_hint("remove some routines from the routines directory"));
    }

    let mut text = String::from(INCLUDE_ONCE_MACRO);
    for (index, routine) in routines.iter().enumerate() {
        let name = routine
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = writeln!(text, "!{} = 0", name);
        let _ = writeln!(text, "macro {}()", name);
        let _ = writeln!(
            text,
            "\t%include_once(\"{}\", {}, ${:02X})",
            asar_path(routine),
            name,
            index * 3
        );
        let _ = writeln!(text, "\tJSL {}", name);
        let _ = writeln!(text, "endmacro");
    }
    Ok(text)
}

fn autoclean_table(rom: &Rom, text: &mut String, table: u32, count: u32) -> Result<()> {
    for i in 0..count {
        let pointer = rom.read_pointer_snes(table + i * 3)?;
        if !rom.is_unset(pointer) {
            let _ = writeln!(text, "autoclean ${:06X}", pointer.addr());
        }
    }
    Ok(())
}

fn read_word_snes(rom: &Rom, address: u32) -> Result<u32> {
    Ok(rom.read_u16(rom.snes_to_pc(address)?)? as u32)
}

/// Patch reclaiming everything a previous run inserted.
///
/// Returns `None` if the ROM carries no tag of a previous run.
pub fn cleanup_patch(rom: &Rom) -> Result<Option<String>> {
    if !has_tool_tag(rom)? {
        return Ok(None);
    }

    let version = rom.read_u8(rom.snes_to_pc(TOOL_VERSION_ADDRESS)?)?;
    let flags = rom.read_u8(rom.snes_to_pc(TOOL_FLAGS_ADDRESS)?)?;
    let per_level = flags & FLAG_PER_LEVEL != 0 || version < 2;
    let mut text = String::new();

    if per_level && version >= PER_LEVEL_LAYOUT_VERSION {
        let _ = writeln!(text, ";Per-Level sprites");
        let table = rom.read_pointer_snes(PER_LEVEL_TABLE_POINTER)?.addr();
        if table != 0xFF_FFFF && table != 0 {
            for level in 0..0x200u32 {
                let directory = read_word_snes(rom, table + level * 2)?;
                if directory == 0 {
                    continue;
                }
                for slot in 0..0x10u32 {
                    let data = read_word_snes(rom, directory + table + slot * 2)?;
                    if data == 0 {
                        continue;
                    }
                    let main = rom.read_pointer_snes(data + table + MAIN_POINTER_OFFSET)?;
                    if main.addr() == 0xFF_FFFF || rom.is_unset(main) {
                        continue;
                    }
                    let _ = writeln!(
                        text,
                        "autoclean ${:06X}\t;{:03X}:{:02X}",
                        main.addr(),
                        level,
                        0xB0 + slot
                    );
                }
            }
        }
    } else if per_level {
        for bank in 0..4u32 {
            let bank_byte = rom.read_u8(rom.snes_to_pc(OLD_PER_LEVEL_BANKS + bank)?)? as u32;
            if bank_byte == 0xFF {
                continue;
            }
            let table = (bank_byte << 16) | 0x8000;
            let _ = writeln!(
                text,
                ";Per level sprites for levels {:03X} - {:03X}",
                bank * 0x80,
                (bank + 1) * 0x80 - 1
            );
            for offset in (MAIN_POINTER_OFFSET..0x8000).step_by(0x10) {
                let main = rom.read_pointer_snes(table + offset)?;
                if main.addr() == 0xFF_FFFF {
                    break;
                }
                if !rom.is_unset(main) {
                    let _ = writeln!(text, "autoclean ${:06X}", main.addr());
                }
            }
        }
    }

    let limit = if version >= PER_LEVEL_LAYOUT_VERSION || !per_level {
        0x1000
    } else {
        0xF00
    };
    let _ = writeln!(text, ";Global sprites:");
    let global = rom.read_pointer_snes(GLOBAL_TABLE_POINTER)?.addr();
    if rom.read_pointer_snes(global)?.addr() != 0xFF_FFFF {
        for offset in (MAIN_POINTER_OFFSET..limit).step_by(0x10) {
            let main = rom.read_pointer_snes(global + offset)?;
            if !rom.is_unset(main) {
                let _ = writeln!(text, "autoclean ${:06X}", main.addr());
            }
        }
    }

    let _ = writeln!(text, "\n; Routines:");
    for i in 0..MAX_ROUTINES as u32 {
        let slot = ROUTINE_TABLE + i * 3;
        let routine = rom.read_pointer_snes(slot)?.addr();
        if routine != 0xFF_FFFF {
            let _ = writeln!(
                text,
                "autoclean ${:06X}\n\torg ${:06X}\n\tdl $FFFFFF",
                routine, slot
            );
        }
    }

    if version >= 1 {
        let _ = writeln!(text, "\n; Cluster:");
        let cluster = rom.read_pointer_snes(CLUSTER_TABLE_POINTER)?.addr();
        if cluster != VANILLA_CLUSTER_TABLE {
            autoclean_table(rom, &mut text, cluster, 0x80)?;
        }
        let _ = writeln!(text, "\n; Extended:");
        let extended = rom.read_pointer_snes(EXTENDED_TABLE_POINTER)?.addr();
        if extended != VANILLA_EXTENDED_TABLE {
            autoclean_table(rom, &mut text, extended, 0x80)?;
        }
    }

    Ok(Some(text))
}
