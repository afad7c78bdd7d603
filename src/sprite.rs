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

//! Sprite slot model.
//!
//! A [`SpriteSlot`] is one line of the sprite list plus everything learned
//! about it afterwards: the descriptor contents, the entry points returned
//! by the assembler and, for per-level sprites, its placement.

use crate::error::{ErrorCode, InsertError, Result};
use crate::rom::Pointer;
use crate::tables::SpriteTable;
use crate::tiles::TileQuad;
use std::fmt;
use std::path::PathBuf;

/// First sprite number that may be assigned per level.
pub const PER_LEVEL_FIRST: u8 = 0xB0;

/// Last sprite number that may be assigned per level.
pub const PER_LEVEL_LAST: u8 = 0xBF;

/// Highest level number.
pub const MAX_LEVEL: u16 = 0x1FF;

/// Number of levels.
pub const LEVEL_COUNT: usize = 0x200;

/// Largest additional byte count a sprite may request.
pub const MAX_EXTRA_BYTES: u8 = 12;

/// Base of the vanilla init pointer table.
pub const VANILLA_INIT_TABLE: u32 = 0x01_817D;

/// Base of the vanilla main pointer table.
pub const VANILLA_MAIN_TABLE: u32 = 0x01_85CC;

/// Which list a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListKind {
    Sprite,
    Extended,
    Cluster,
}

impl ListKind {
    /// Number of slots in a global list of this kind.
    pub fn capacity(&self) -> usize {
        match self {
            ListKind::Sprite => 0x100,
            ListKind::Extended | ListKind::Cluster => 0x80,
        }
    }

    /// Section header used in list files.
    pub fn header(&self) -> &'static str {
        match self {
            ListKind::Sprite => "SPRITE:",
            ListKind::Extended => "EXTENDED:",
            ListKind::Cluster => "CLUSTER:",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListKind::Sprite => "sprite",
            ListKind::Extended => "extended",
            ListKind::Cluster => "cluster",
        };
        write!(f, "{}", name)
    }
}

/// Identity of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub kind: ListKind,
    pub number: u8,
    /// `Some(level)` for per-level sprites.
    pub level: Option<u16>,
}

impl SlotId {
    pub fn global(kind: ListKind, number: u8) -> Self {
        Self {
            kind,
            number,
            level: None,
        }
    }

    pub fn per_level(level: u16, number: u8) -> Self {
        Self {
            kind: ListKind::Sprite,
            number,
            level: Some(level),
        }
    }

    /// Whether the number may be used as a per-level sprite.
    pub fn is_per_level_number(number: u8) -> bool {
        (PER_LEVEL_FIRST..=PER_LEVEL_LAST).contains(&number)
    }

    /// Processing order: per-level sprites by level, then globals.
    pub fn order_key(&self) -> (bool, u16, u8) {
        match self.level {
            Some(level) => (false, level, self.number),
            None => (true, 0, self.number),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Some(level) => write!(f, "{} {:03X}:{:02X}", self.kind, level, self.number),
            None => write!(f, "{} {:02X}", self.kind, self.number),
        }
    }
}

/// Symbol names the assembler may report, in matching order.
pub const ENTRY_SYMBOLS: [&str; 8] = [
    "init",
    "main",
    "cape",
    "mouth",
    "kicked",
    "carriable",
    "carried",
    "goal",
];

/// Optional routines of a normal sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPointers {
    pub mouth: Pointer,
    pub kicked: Pointer,
    pub carriable: Pointer,
    pub carried: Pointer,
    pub goal: Pointer,
}

impl Default for StatusPointers {
    fn default() -> Self {
        Self {
            mouth: Pointer::NULL,
            kicked: Pointer::NULL,
            carriable: Pointer::NULL,
            carried: Pointer::NULL,
            goal: Pointer::NULL,
        }
    }
}

impl StatusPointers {
    /// Size of the encoded pointer group.
    pub const SIZE: usize = 15;

    /// Pointer group of an unused slot.
    pub const UNUSED: StatusPointers = StatusPointers {
        mouth: Pointer::EMPTY,
        kicked: Pointer::EMPTY,
        carriable: Pointer::EMPTY,
        carried: Pointer::EMPTY,
        goal: Pointer::EMPTY,
    };

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        for (chunk, pointer) in out.chunks_mut(3).zip([
            self.mouth,
            self.kicked,
            self.carriable,
            self.carried,
            self.goal,
        ]) {
            chunk.copy_from_slice(&pointer.to_bytes());
        }
        out
    }
}

/// One tile of a Lunar Magic display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayTile {
    pub x_offset: i32,
    pub y_offset: i32,
    pub tile: u16,
    /// Text drawn instead of a tile, if non-empty.
    pub text: String,
}

/// How a sprite looks in the Lunar Magic editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Display {
    pub description: String,
    pub tiles: Vec<DisplayTile>,
    pub extra_bit: bool,
    pub x: u8,
    pub y: u8,
    pub display_text: String,
    pub use_text: bool,
}

/// An entry of the Lunar Magic sprite collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Collection {
    pub name: String,
    pub extra_bit: bool,
    pub props: [u8; MAX_EXTRA_BYTES as usize],
}

/// A sprite list entry and everything resolved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSlot {
    pub id: SlotId,
    /// Line of the list file, 0-based.
    pub line: usize,
    pub directory: PathBuf,
    pub asm_file: Option<PathBuf>,
    pub cfg_file: Option<PathBuf>,
    pub table: SpriteTable,
    /// `None` until the assembler has reported the routines.
    pub status: Option<StatusPointers>,
    /// Cape routine of an extended sprite.
    pub cape: Pointer,
    pub byte_count: u8,
    pub extra_byte_count: u8,
    pub map16: Vec<TileQuad>,
    pub displays: Vec<Display>,
    pub collections: Vec<Collection>,
}

impl SpriteSlot {
    pub fn new(id: SlotId, line: usize, directory: PathBuf) -> Self {
        Self {
            id,
            line,
            directory,
            asm_file: None,
            cfg_file: None,
            table: SpriteTable::default(),
            status: None,
            cape: Pointer::EMPTY,
            byte_count: 0,
            extra_byte_count: 0,
            map16: Vec::new(),
            displays: Vec::new(),
            collections: Vec::new(),
        }
    }

    /// Set the additional byte counts, clamped to [`MAX_EXTRA_BYTES`].
    pub fn set_byte_counts(&mut self, clear: u8, set: u8) {
        self.byte_count = clear.min(MAX_EXTRA_BYTES);
        self.extra_byte_count = set.min(MAX_EXTRA_BYTES);
    }

    /// Whether the slot tweaks a vanilla sprite instead of bringing code.
    pub fn is_tweak(&self) -> bool {
        self.id.kind == ListKind::Sprite && self.table.sprite_type == 0
    }

    /// Point init and main into the vanilla pointer tables.
    pub fn use_vanilla_routines(&mut self) {
        let offset = 2 * self.id.number as u32;
        self.table.init = Pointer::from_snes(VANILLA_INIT_TABLE + offset);
        self.table.main = Pointer::from_snes(VANILLA_MAIN_TABLE + offset);
    }

    /// Whether the assembler needs to see this slot.
    pub fn needs_assembly(&self) -> bool {
        !self.is_tweak() && self.asm_file.is_some()
    }

    /// Fail if neither entry point was resolved.
    pub fn check_entry_points(&self) -> Result<()> {
        if self.table.has_no_entry_points() {
            let source = self
                .asm_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| self.id.to_string());
            return Err(InsertError::new(
                ErrorCode::MissingEntryPoints,
                format!("Sprite {} had neither INIT nor MAIN defined", source),
            )
            .with_hint("label the routines with `print \"INIT \",pc` and `print \"MAIN \",pc`"));
        }
        Ok(())
    }
}

/// All slots of one list kind, kept in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteList {
    kind: ListKind,
    slots: Vec<SpriteSlot>,
}

impl SpriteList {
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
        }
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Add a slot, rejecting a reused number.
    pub fn insert(&mut self, slot: SpriteSlot) -> Result<()> {
        if self.get(slot.id.number, slot.id.level).is_some() {
            return Err(InsertError::new(
                ErrorCode::DuplicateSlot,
                format!(
                    "Error on line {}: Sprite number already used ({})",
                    slot.line, slot.id
                ),
            ));
        }
        let key = slot.id.order_key();
        let index = self.slots.partition_point(|s| s.id.order_key() < key);
        self.slots.insert(index, slot);
        Ok(())
    }

    pub fn get(&self, number: u8, level: Option<u16>) -> Option<&SpriteSlot> {
        self.slots
            .iter()
            .find(|s| s.id.number == number && s.id.level == level)
    }

    /// The global slot for a number.
    pub fn global(&self, number: u8) -> Option<&SpriteSlot> {
        self.get(number, None)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpriteSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SpriteSlot> {
        self.slots.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The sprite, extended and cluster lists of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteLists {
    pub sprites: SpriteList,
    pub extended: SpriteList,
    pub cluster: SpriteList,
}

impl Default for SpriteLists {
    fn default() -> Self {
        Self {
            sprites: SpriteList::new(ListKind::Sprite),
            extended: SpriteList::new(ListKind::Extended),
            cluster: SpriteList::new(ListKind::Cluster),
        }
    }
}

impl SpriteLists {
    pub fn get(&self, kind: ListKind) -> &SpriteList {
        match kind {
            ListKind::Sprite => &self.sprites,
            ListKind::Extended => &self.extended,
            ListKind::Cluster => &self.cluster,
        }
    }

    pub fn get_mut(&mut self, kind: ListKind) -> &mut SpriteList {
        match kind {
            ListKind::Sprite => &mut self.sprites,
            ListKind::Extended => &mut self.extended,
            ListKind::Cluster => &mut self.cluster,
        }
    }

    /// Add a slot to the list of its kind.
    pub fn insert(&mut self, slot: SpriteSlot) -> Result<()> {
        self.get_mut(slot.id.kind).insert(slot)
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.sprites.len() + self.extended.len() + self.cluster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
