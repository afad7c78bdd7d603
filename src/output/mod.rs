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

//! Output module for Spriteweave.
//!
//! This module handles everything a run writes besides the ROM itself:
//! - binary tables for the main patches
//! - Lunar Magic companion files
//! - the `.extmod` log

mod lunar;

pub use lunar::{build_companions, CompanionFiles, CompanionInputs};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::tables::{BinaryTables, TABLE_FILES};
use crate::VERSION;

/// Write every table into the asm directory.
pub fn write_tables(asm_dir: &Path, tables: &BinaryTables) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, bytes) in tables.files() {
        let path = asm_dir.join(name);
        fs::write(&path, bytes)?;
        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }
    Ok(written)
}

/// Delete a generated file, ignoring files that are already gone.
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Delete every table file from the asm directory.
pub fn remove_tables(asm_dir: &Path) -> Result<()> {
    for name in TABLE_FILES {
        remove_file(&asm_dir.join(name))?;
    }
    Ok(())
}

/// Entry this tool leaves in the `.extmod` log.
pub fn extmod_entry() -> String {
    let mut parts = VERSION.split('.');
    let major = parts.next().unwrap_or("0");
    let minor = parts.next().and_then(|m| m.parse::<u32>().ok()).unwrap_or(0);
    format!("spriteweave v{}.{:02}\t", major, minor)
}

/// Append our entry to the ROM's `.extmod` log unless it already ends with it.
///
/// Returns whether the file changed.
pub fn append_extmod(rom: &Path) -> Result<bool> {
    let path = rom.with_extension("extmod");
    let entry = extmod_entry();
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if contents.ends_with(&entry) {
        return Ok(false);
    }
    fs::write(&path, contents + &entry)?;
    Ok(true)
}
