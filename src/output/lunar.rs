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

//! Lunar Magic companion files.
//!
//! - `.ssc`: how sprites are drawn in the editor
//! - `.mwt`: names of sprite collection entries
//! - `.mw2`: sprite collection entries
//! - `.s16`: map16 tiles used by the displays

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::TilePlacement;
use crate::sprite::{Display, SlotId, SpriteLists, SpriteSlot};

/// Display tiles from here on refer to sprite map16 data.
const CUSTOM_TILE_FIRST: u16 = 0x300;

/// Offset of sprite map16 pages in the editor.
const CUSTOM_TILE_OFFSET: usize = 0x100;

/// User files merged into the generated ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionInputs {
    pub ssc: Option<Vec<u8>>,
    pub mwt: Option<Vec<u8>>,
    /// Includes the user file's trailing `0xFF`.
    pub mw2: Option<Vec<u8>>,
}

impl CompanionInputs {
    /// Read whichever of the user files are given.
    pub fn read(ssc: Option<&Path>, mwt: Option<&Path>, mw2: Option<&Path>) -> Result<Self> {
        let read = |path: Option<&Path>| -> Result<Option<Vec<u8>>> {
            path.map(fs::read).transpose().map_err(Into::into)
        };
        Ok(Self {
            ssc: read(ssc)?,
            mwt: read(mwt)?,
            mw2: read(mw2)?,
        })
    }
}

/// Contents of the four companion files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionFiles {
    pub ssc: Vec<u8>,
    pub mwt: Vec<u8>,
    pub mw2: Vec<u8>,
    pub s16: Vec<u8>,
}

fn display_lines(number: u8, slot: &SpriteSlot, display: &Display, base: usize) -> String {
    let refd = display.y as u32 * 0x1000
        + display.x as u32 * 0x100
        + 0x20
        + if display.extra_bit { 0x10 } else { 0 };

    let description = if display.description.is_empty() {
        slot.asm_file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        display.description.clone()
    };

    let mut text = String::new();
    let _ = writeln!(text, "{:02X} {:04X} {}", number, refd, description);
    let _ = write!(text, "{:02X} {:04X}", number, refd + 2);
    if display.use_text && !display.display_text.is_empty() {
        let _ = write!(text, " 0,0,*{}*", display.display_text);
    } else {
        for tile in &display.tiles {
            if !tile.text.is_empty() {
                let _ = write!(text, " 0,0,*{}*", tile.text);
                break;
            }
            let mut number = tile.tile as usize;
            if tile.tile >= CUSTOM_TILE_FIRST {
                number += CUSTOM_TILE_OFFSET + base;
            }
            let _ = write!(text, " {},{},{:X}", tile.x_offset, tile.y_offset, number);
        }
    }
    text.push('\n');
    text
}

/// Build the companion files for every global sprite.
///
/// In per-level mode the sprites `B0`-`BF` are left out.
pub fn build_companions(
    lists: &SpriteLists,
    tiles: &TilePlacement,
    inputs: &CompanionInputs,
    per_level: bool,
) -> CompanionFiles {
    let mut ssc = inputs.ssc.clone().unwrap_or_default();
    let mut mwt = inputs.mwt.clone().unwrap_or_default();
    let mut mw2 = match &inputs.mw2 {
        Some(user) => user[..user.len().saturating_sub(1)].to_vec(),
        None => vec![0x00],
    };

    for number in 0..=0xFFu8 {
        if per_level && SlotId::is_per_level_number(number) {
            continue;
        }
        let Some(slot) = lists.sprites.global(number) else {
            continue;
        };
        let base = tiles.base(number);

        for display in &slot.displays {
            ssc.extend_from_slice(display_lines(number, slot, display, base).as_bytes());
        }

        for (index, collection) in slot.collections.iter().enumerate() {
            let count = if collection.extra_bit {
                slot.extra_byte_count
            } else {
                slot.byte_count
            } as usize;
            mw2.push(0x79 + if collection.extra_bit { 0x04 } else { 0 });
            mw2.push(0x70);
            mw2.push(number);
            mw2.extend_from_slice(&collection.props[..count.min(collection.props.len())]);

            let line = if index == 0 {
                format!("{:02X}\t{}\n", number, collection.name)
            } else {
                format!("\t{}\n", collection.name)
            };
            mwt.extend_from_slice(line.as_bytes());
        }
    }
    mw2.push(0xFF);

    CompanionFiles {
        ssc,
        mwt,
        mw2,
        s16: tiles.pool.to_bytes(),
    }
}

impl CompanionFiles {
    /// Write the files next to the ROM, named after it.
    pub fn write(&self, rom: &Path) -> Result<()> {
        fs::write(rom.with_extension("ssc"), &self.ssc)?;
        fs::write(rom.with_extension("mwt"), &self.mwt)?;
        fs::write(rom.with_extension("mw2"), &self.mw2)?;
        fs::write(rom.with_extension("s16"), &self.s16)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{Collection, DisplayTile, ListKind};
    use crate::tiles::TilePool;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn goomba() -> SpriteSlot {
        let mut slot = SpriteSlot::new(
            SlotId::global(ListKind::Sprite, 0x12),
            1,
            PathBuf::from("sprites"),
        );
        slot.asm_file = Some(PathBuf::from("sprites/goomba.asm"));
        slot.set_byte_counts(1, 2);
        slot
    }

    fn placement(number: u8, base: usize) -> TilePlacement {
        let mut tiles = TilePlacement {
            pool: TilePool::new(2),
            ..Default::default()
        };
        tiles.bases.insert(number, base);
        tiles
    }

    #[test]
    fn test_display_lines() {
        let mut slot = goomba();
        slot.displays.push(Display {
            x: 1,
            y: 2,
            extra_bit: true,
            tiles: vec![
                DisplayTile {
                    x_offset: 0,
                    y_offset: -16,
                    tile: 0x302,
                    ..Default::default()
                },
                DisplayTile {
                    x_offset: 8,
                    y_offset: 0,
                    tile: 0x24,
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let mut lists = SpriteLists::default();
        lists.insert(slot).unwrap();

        let files = build_companions(&lists, &placement(0x12, 4), &CompanionInputs::default(), false);
        assert_eq!(
            String::from_utf8(files.ssc).unwrap(),
            "12 2130 goomba.asm\n12 2132 0,-16,406 8,0,24\n"
        );
        assert_eq!(files.mw2, vec![0x00, 0xFF]);
        assert_eq!(files.s16.len(), 16);
    }

    #[test]
    fn test_text_display_stops_at_text() {
        let mut slot = goomba();
        slot.displays.push(Display {
            description: "Goomba".to_string(),
            tiles: vec![
                DisplayTile {
                    text: "GO".to_string(),
                    ..Default::default()
                },
                DisplayTile {
                    tile: 0x10,
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        let mut lists = SpriteLists::default();
        lists.insert(slot).unwrap();

        let files = build_companions(&lists, &TilePlacement::default(), &CompanionInputs::default(), false);
        assert_eq!(
            String::from_utf8(files.ssc).unwrap(),
            "12 0020 Goomba\n12 0022 0,0,*GO*\n"
        );
    }

    #[test]
    fn test_collections() {
        let mut slot = goomba();
        slot.collections.push(Collection {
            name: "Goomba".to_string(),
            extra_bit: false,
            props: [0xA1, 0xA2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        });
        slot.collections.push(Collection {
            name: "Goomba (extra)".to_string(),
            extra_bit: true,
            props: [0xB1, 0xB2, 0xB3, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        });
        let mut lists = SpriteLists::default();
        lists.insert(slot).unwrap();

        let inputs = CompanionInputs {
            mw2: Some(vec![0x00, 0x79, 0x70, 0x01, 0xFF]),
            mwt: Some(b"01\tShell\n".to_vec()),
            ..Default::default()
        };
        let files = build_companions(&lists, &TilePlacement::default(), &inputs, false);
        assert_eq!(
            files.mw2,
            vec![
                0x00, 0x79, 0x70, 0x01, // user entries
                0x79, 0x70, 0x12, 0xA1, // one byte with the extra bit clear
                0x7D, 0x70, 0x12, 0xB1, 0xB2, // two with it set
                0xFF
            ]
        );
        assert_eq!(
            String::from_utf8(files.mwt).unwrap(),
            "01\tShell\n12\tGoomba\n\tGoomba (extra)\n"
        );
    }

    #[test]
    fn test_per_level_numbers_are_skipped() {
        let mut slot = SpriteSlot::new(
            SlotId::global(ListKind::Sprite, 0xB4),
            1,
            PathBuf::from("sprites"),
        );
        slot.displays.push(Display::default());
        let mut lists = SpriteLists::default();
        lists.insert(slot).unwrap();

        let files = build_companions(&lists, &TilePlacement::default(), &CompanionInputs::default(), true);
        assert!(files.ssc.is_empty());
    }

    #[test]
    fn test_write_next_to_rom() {
        let dir = tempfile::tempdir().unwrap();
        let rom = dir.path().join("hack.smc");
        let files = CompanionFiles {
            ssc: b"ssc".to_vec(),
            mwt: b"mwt".to_vec(),
            mw2: vec![0x00, 0xFF],
            s16: vec![0; 8],
        };
        files.write(&rom).unwrap();
        assert_eq!(fs::read(dir.path().join("hack.mw2")).unwrap(), vec![0x00, 0xFF]);
        assert_eq!(fs::read(dir.path().join("hack.s16")).unwrap().len(), 8);
    }
}
