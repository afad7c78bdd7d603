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

//! Sprite insertion pipeline.
//!
//! Every list runs through the same stages:
//! - `Pending -> Resolved`: sources are assembled and their routines harvested
//! - `Resolved -> Placed`: per-level sprites and map16 tiles get their space
//! - `Placed -> Serialized`: all binary tables are built
//!
//! Slots sharing a source share one assembler call.

pub mod patches;

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};

use crate::arena::PerLevelArenas;
use crate::assembler::{Assembler, Symbol};
use crate::error::{ErrorCode, InsertError, Result};
use crate::rom::{Pointer, Rom};
use crate::sprite::{ListKind, SpriteLists, SpriteSlot, StatusPointers, ENTRY_SYMBOLS};
use crate::tables::{
    encode_table, version_flag, BinaryTables, ByteCountTable, PointerList, SpriteTable,
    StatusPointerTable, POINTER_LIST_SIZE,
};
use crate::tiles::TilePool;
use crate::TOOL_VERSION;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    Resolved,
    Placed,
    Serialized,
}

/// Settings of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Directory holding `sa1def.asm` and the shared library.
    pub asm_dir: PathBuf,
    /// Define files included by every sprite patch.
    pub extra_defines: Vec<PathBuf>,
    pub per_level: bool,
}

/// Routines resolved for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution {
    init: Pointer,
    main: Pointer,
    status: Option<StatusPointers>,
    cape: Pointer,
}

impl Resolution {
    fn of(slot: &SpriteSlot) -> Self {
        Self {
            init: slot.table.init,
            main: slot.table.main,
            status: slot.status,
            cape: slot.cape,
        }
    }

    fn apply_to(&self, slot: &mut SpriteSlot) {
        slot.table.init = self.init;
        slot.table.main = self.main;
        slot.status = self.status;
        slot.cape = self.cape;
    }
}

/// Map16 placement of the global sprites.
#[derive(Debug, Clone, Default)]
pub struct TilePlacement {
    pub pool: TilePool,
    /// First quad of every sprite with map16 data.
    pub bases: BTreeMap<u8, usize>,
}

impl TilePlacement {
    /// Quad index of a sprite's first tile, 0 if it brought none.
    pub fn base(&self, number: u8) -> usize {
        self.bases.get(&number).copied().unwrap_or(0)
    }
}

/// Drop `.` components and fold `..` so equal files compare equal.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn required_version(symbol: &Symbol) -> Option<u8> {
    symbol.address.map(|v| v.min(0xFF) as u8).or_else(|| {
        let digits = symbol.name.get(4..)?.trim();
        let digits = digits.strip_prefix('$').unwrap_or(digits);
        u32::from_str_radix(digits, 16).ok().map(|v| v.min(0xFF) as u8)
    })
}

/// Store the routines a patch printed into the slot.
pub fn harvest_symbols(slot: &mut SpriteSlot, symbols: &[Symbol]) -> Result<()> {
    let mut status = StatusPointers::default();
    let mut cape = Pointer::NULL;
    slot.table.init = Pointer::EMPTY;
    slot.table.main = Pointer::EMPTY;

    for symbol in symbols {
        let name = symbol.name.to_lowercase();
        let entry = ENTRY_SYMBOLS.iter().find(|e| name.starts_with(*e));
        match (entry, symbol.address) {
            (Some(&entry), Some(address)) => {
                let pointer = Pointer::from_snes(address);
                match entry {
                    "init" => slot.table.init = pointer,
                    "main" => slot.table.main = pointer,
                    "cape" => cape = pointer,
                    "mouth" => status.mouth = pointer,
                    "kicked" => status.kicked = pointer,
                    "carriable" => status.carriable = pointer,
                    "carried" => status.carried = pointer,
                    _ => status.goal = pointer,
                }
            }
            _ if name.starts_with("verg") => {
                let required = required_version(symbol).unwrap_or(0xFF);
                if required > TOOL_VERSION {
                    return Err(InsertError::new(
                        ErrorCode::VersionGuardFailed,
                        format!(
                            "{} requires tool version {:02X}, this is {:02X}",
                            slot.id, required, TOOL_VERSION
                        ),
                    )
                    .with_hint("update the tool to insert this sprite"));
                }
            }
            _ => info!("{}", symbol),
        }
    }

    match slot.id.kind {
        ListKind::Sprite => slot.status = Some(status),
        ListKind::Extended => {
            slot.cape = cape;
            slot.status = None;
        }
        ListKind::Cluster => slot.status = None,
    }
    Ok(())
}

/// The staged insertion of all sprite lists.
pub struct InsertionPipeline<'a, A: Assembler> {
    assembler: &'a mut A,
    options: PipelineOptions,
    stage: Stage,
    arenas: PerLevelArenas,
    tiles: TilePlacement,
    assembled: usize,
}

impl<'a, A: Assembler> InsertionPipeline<'a, A> {
    pub fn new(assembler: &'a mut A, options: PipelineOptions) -> Self {
        Self {
            assembler,
            options,
            stage: Stage::Pending,
            arenas: PerLevelArenas::new(),
            tiles: TilePlacement::default(),
            assembled: 0,
        }
    }

    /// Start map16 placement from an existing tile pool.
    pub fn with_tile_pool(mut self, pool: TilePool) -> Self {
        self.tiles.pool = pool;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of sources handed to the assembler.
    pub fn assembled(&self) -> usize {
        self.assembled
    }

    pub fn tiles(&self) -> &TilePlacement {
        &self.tiles
    }

    fn expect_stage(&self, expected: Stage) -> Result<()> {
        if self.stage != expected {
            return Err(InsertError::new(
                ErrorCode::OutOfRange,
                format!(
                    "Pipeline is {:?}, expected {:?}",
                    self.stage, expected
                ),
            ));
        }
        Ok(())
    }

    /// Run all stages and return the serialized tables.
    pub fn run(&mut self, lists: &mut SpriteLists, rom: &mut Rom) -> Result<BinaryTables> {
        self.resolve(lists, rom)?;
        self.place(lists)?;
        self.serialize(lists)
    }

    /// Assemble every source and harvest its routines.
    pub fn resolve(&mut self, lists: &mut SpriteLists, rom: &mut Rom) -> Result<()> {
        self.expect_stage(Stage::Pending)?;
        for kind in [ListKind::Sprite, ListKind::Cluster, ListKind::Extended] {
            let mut resolved: HashMap<PathBuf, Resolution> = HashMap::new();
            let before = self.assembled;
            for slot in lists.get_mut(kind).iter_mut() {
                self.resolve_slot(slot, rom, &mut resolved)?;
            }
            info!(
                "Resolved {} {} slot(s), {} assembled",
                lists.get(kind).len(),
                kind,
                self.assembled - before
            );
        }
        self.stage = Stage::Resolved;
        Ok(())
    }

    fn resolve_slot(
        &mut self,
        slot: &mut SpriteSlot,
        rom: &mut Rom,
        resolved: &mut HashMap<PathBuf, Resolution>,
    ) -> Result<()> {
        if !slot.needs_assembly() {
            return Ok(());
        }
        let Some(source) = slot.asm_file.as_deref().map(normalize_path) else {
            return Ok(());
        };

        if let Some(resolution) = resolved.get(&source) {
            debug!("{} shares {}", slot.id, source.display());
            resolution.apply_to(slot);
            return Ok(());
        }

        let patch =
            patches::sprite_wrapper(slot, &self.options.asm_dir, &self.options.extra_defines);
        self.assembled += 1;
        let symbols = self
            .assembler
            .apply(&patch, rom.data_mut())
            .map_err(|diagnostics| {
                InsertError::assembler(
                    format!("Failed to assemble {} ({})", source.display(), slot.id),
                    diagnostics,
                )
            })?;

        harvest_symbols(slot, &symbols)?;
        slot.check_entry_points()?;
        debug!(
            "{}: init ${:06X}, main ${:06X}",
            slot.id,
            slot.table.init.addr(),
            slot.table.main.addr()
        );
        resolved.insert(source, Resolution::of(slot));
        Ok(())
    }

    /// Give per-level sprites their records and map16 data its tiles.
    pub fn place(&mut self, lists: &SpriteLists) -> Result<()> {
        self.expect_stage(Stage::Resolved)?;
        for slot in lists.sprites.iter() {
            match slot.id.level {
                Some(level) => {
                    let status = slot.status.unwrap_or(StatusPointers::UNUSED);
                    let base = self
                        .arenas
                        .place(level, slot.id.number, &slot.table, &status)?;
                    debug!("{} record at 0x{:04X}", slot.id, base);
                }
                None if self.is_reserved(slot.id.number) => {
                    warn!(
                        "{} is reserved for per-level sprites and will be ignored",
                        slot.id
                    );
                }
                None => {
                    let base = self.tiles.pool.place(&slot.map16)?;
                    if !slot.map16.is_empty() {
                        debug!("{} map16 at tile 0x{:X}", slot.id, base);
                        self.tiles.bases.insert(slot.id.number, base);
                    }
                }
            }
        }
        self.stage = Stage::Placed;
        Ok(())
    }

    fn is_reserved(&self, number: u8) -> bool {
        self.options.per_level && crate::sprite::SlotId::is_per_level_number(number)
    }

    /// Build every binary table.
    pub fn serialize(&mut self, lists: &SpriteLists) -> Result<BinaryTables> {
        self.expect_stage(Stage::Placed)?;

        let mut rows = vec![SpriteTable::default(); 0x100];
        let mut status = StatusPointerTable::default();
        let mut byte_counts = ByteCountTable::default();
        for number in 0..=0xFFu8 {
            if self.is_reserved(number) {
                byte_counts.reserve(number);
                continue;
            }
            let Some(slot) = lists.sprites.global(number) else {
                continue;
            };
            rows[number as usize] = slot.table;
            if let Some(pointers) = slot.status {
                status.set(number, pointers);
            }
            byte_counts.set(number, slot.byte_count, slot.extra_byte_count);
        }

        let mut cluster = PointerList::new(POINTER_LIST_SIZE);
        for slot in lists.cluster.iter() {
            cluster.set(slot.id.number as usize, slot.table.main)?;
        }
        let mut extended = PointerList::new(POINTER_LIST_SIZE);
        let mut extended_cape = PointerList::new(POINTER_LIST_SIZE);
        for slot in lists.extended.iter() {
            extended.set(slot.id.number as usize, slot.table.main)?;
            extended_cape.set(slot.id.number as usize, slot.cape)?;
        }

        let per_level = self.options.per_level.then(|| self.arenas.finish());
        if let Some(tables) = &per_level {
            info!(
                "Per-level tables: {} byte(s) of sprite records",
                self.arenas.payload_cursor()
            );
            debug!("Level directory uses {} byte(s)", tables.sprite_pointers.len());
        }

        self.stage = Stage::Serialized;
        Ok(BinaryTables {
            version_flag: version_flag(self.options.per_level),
            default_table: encode_table(&rows),
            per_level,
            status_pointers: status.to_bytes(),
            cluster: cluster.to_bytes(),
            extended: extended.to_bytes(),
            extended_cape: extended_cape.to_bytes(),
            byte_counts: byte_counts.as_bytes().to_vec(),
        })
    }
}
