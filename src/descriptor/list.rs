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

//! Sprite list parser.
//!
//! ```text
//! SPRITE:
//! 00 goomba.json
//! 105:B0 boss.cfg        ; per-level, needs --per-level
//! CLUSTER:
//! 00 flame.asm
//! ```

use std::path::PathBuf;

use super::SourceDirs;
use crate::error::{ErrorCode, InsertError, Result};
use crate::sprite::{ListKind, SlotId, SpriteLists, SpriteSlot, MAX_LEVEL};

/// Sprites from here on are generators.
const FIRST_GENERATOR: u8 = 0xC0;

/// Last generator number.
const LAST_GENERATOR: u8 = 0xD0;

fn line_error(line: usize, message: impl std::fmt::Display) -> InsertError {
    InsertError::new(
        ErrorCode::MalformedSourceDescriptor,
        format!("Error on line {}: {}", line, message),
    )
}

fn parse_hex<T: TryFrom<u32>>(text: &str, line: usize, what: &str, max: u32) -> Result<T> {
    let value = u32::from_str_radix(text, 16)
        .map_err(|_| line_error(line, format!("invalid {} '{}'", what, text)))?;
    if value > max {
        return Err(line_error(
            line,
            format!("{} must be at most {:X}, got {:X}", what, max, value),
        ));
    }
    T::try_from(value).map_err(|_| line_error(line, format!("invalid {} '{}'", what, text)))
}

/// Directory of a sprite number within a list.
fn directory_for(dirs: &SourceDirs, kind: ListKind, number: u8) -> PathBuf {
    match kind {
        ListKind::Extended => dirs.extended.clone(),
        ListKind::Cluster => dirs.cluster.clone(),
        ListKind::Sprite if number < FIRST_GENERATOR => dirs.sprites.clone(),
        ListKind::Sprite if number <= LAST_GENERATOR => dirs.generators.clone(),
        ListKind::Sprite => dirs.shooters.clone(),
    }
}

/// Parse a sprite list into slots.
///
/// Only the list itself is read; descriptor files are loaded separately.
/// Line numbers in errors are 1-based.
pub fn parse_list(text: &str, dirs: &SourceDirs, per_level: bool) -> Result<SpriteLists> {
    let mut lists = SpriteLists::default();
    let mut kind = ListKind::Sprite;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }
        if let Some(header) = [ListKind::Sprite, ListKind::Extended, ListKind::Cluster]
            .into_iter()
            .find(|k| k.header() == content)
        {
            kind = header;
            continue;
        }

        let Some((slot_text, file)) = content.split_once(char::is_whitespace) else {
            return Err(line_error(line, "malformed line"));
        };
        let file = file.trim();
        if file.is_empty() {
            return Err(line_error(line, "malformed line"));
        }

        let id = match (kind, slot_text.split_once(':')) {
            (ListKind::Sprite, Some((level, number))) => {
                if !per_level {
                    return Err(line_error(
                        line,
                        "Trying to insert per level sprites without the --per-level flag",
                    ));
                }
                let level: u16 = parse_hex(level, line, "level", MAX_LEVEL as u32)?;
                let number: u8 = parse_hex(number, line, "sprite number", 0xFF)?;
                if !SlotId::is_per_level_number(number) {
                    return Err(line_error(line, "Only sprite B0-BF can be assigned a level"));
                }
                SlotId::per_level(level, number)
            }
            (ListKind::Sprite, None) => {
                SlotId::global(kind, parse_hex(slot_text, line, "sprite number", 0xFF)?)
            }
            (_, Some(_)) => {
                return Err(line_error(line, format!("{} sprites cannot be per level", kind)));
            }
            (_, None) => SlotId::global(
                kind,
                parse_hex(slot_text, line, "sprite number", kind.capacity() as u32 - 1)?,
            ),
        };

        let directory = directory_for(dirs, kind, id.number);
        let path = directory.join(file);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut slot = SpriteSlot::new(id, line, directory);
        match kind {
            ListKind::Sprite => {
                if extension != "json" && extension != "cfg" {
                    return Err(line_error(line, format!("Unknown filetype '{}'", file)));
                }
                slot.cfg_file = Some(path);
            }
            _ => {
                if extension != "asm" {
                    return Err(line_error(line, format!("'{}' is not an asm file", file)));
                }
                slot.asm_file = Some(path);
            }
        }

        lists.insert(slot)?;
    }

    Ok(lists)
}
