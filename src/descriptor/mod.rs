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

//! Sprite list and descriptor parsing.
//!
//! This module turns the text inputs of a run into [`SpriteSlot`]s:
//! - the sprite list, naming a descriptor per slot
//! - CFG descriptors
//! - JSON descriptors

mod cfg;
mod json;
mod list;

pub use cfg::apply_cfg;
pub use json::apply_json;
pub use list::parse_list;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ErrorCode, InsertError, Result};
use crate::sprite::{SpriteLists, SpriteSlot};

/// Directories sprite sources are looked up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirs {
    pub sprites: PathBuf,
    pub generators: PathBuf,
    pub shooters: PathBuf,
    pub extended: PathBuf,
    pub cluster: PathBuf,
}

impl SourceDirs {
    /// The default layout below a tool directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            sprites: root.join("sprites"),
            generators: root.join("generators"),
            shooters: root.join("shooters"),
            extended: root.join("extended"),
            cluster: root.join("cluster"),
        }
    }
}

pub(crate) fn malformed(file: &Path, message: impl std::fmt::Display) -> InsertError {
    InsertError::new(
        ErrorCode::MalformedSourceDescriptor,
        format!("{}: {}", file.display(), message),
    )
}

/// Read the descriptor of one sprite slot from disk.
pub fn load_descriptor(slot: &mut SpriteSlot) -> Result<()> {
    let Some(path) = slot.cfg_file.clone() else {
        return Ok(());
    };
    let text = fs::read_to_string(&path).map_err(|e| {
        InsertError::new(
            ErrorCode::IoFailure,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })?;

    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        apply_json(&text, &path, slot)?;
    } else {
        apply_cfg(&text, &path, slot)?;
    }

    if slot.is_tweak() {
        slot.use_vanilla_routines();
    }
    debug!(
        "Parsed {} for {}: type {:02X}, act-like {:02X}, byte counts {}:{}",
        path.display(),
        slot.id,
        slot.table.sprite_type,
        slot.table.act_like,
        slot.byte_count,
        slot.extra_byte_count
    );
    Ok(())
}

/// Read the descriptors of every sprite in the lists.
pub fn load_descriptors(lists: &mut SpriteLists) -> Result<()> {
    for slot in lists.sprites.iter_mut() {
        load_descriptor(slot)?;
    }
    Ok(())
}

/// Read a list file and every descriptor it names.
pub fn read_sprite_lists(list: &Path, dirs: &SourceDirs, per_level: bool) -> Result<SpriteLists> {
    let text = fs::read_to_string(list).map_err(|e| {
        InsertError::new(
            ErrorCode::IoFailure,
            format!("Cannot read list {}: {}", list.display(), e),
        )
    })?;
    let mut lists = parse_list(&text, dirs, per_level)?;
    load_descriptors(&mut lists)?;
    Ok(lists)
}
