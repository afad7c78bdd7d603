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

//! A complete run: insertion followed by remapping.

use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::assembler::{Assembler, Patch, Symbol};
use crate::config::{ToolOptions, ToolPaths};
use crate::descriptor::read_sprite_lists;
use crate::error::{ErrorCode, InsertError, Result};
use crate::output::{
    append_extmod, build_companions, remove_file, remove_tables, write_tables, CompanionInputs,
};
use crate::pipeline::patches::{
    cleanup_patch, config_defines, list_asm_files, shared_routines, CLEANUP_PATCH, CONFIG_FILE,
    SHARED_LIBRARY,
};
use crate::pipeline::{InsertionPipeline, PipelineOptions};
use crate::remap::{ExtraByteTable, RecordRemapper, RemapOptions};
use crate::rom::{checks, Rom};
use crate::tiles::TilePool;

/// Main patches applied after the tables are written, in order.
pub const MAIN_PATCHES: [&str; 3] = ["main.asm", "cluster.asm", "extended.asm"];

/// Why a run failed.
#[derive(Debug, Error)]
pub enum RunError {
    /// Insertion failed; the ROM file is untouched.
    #[error("{0}")]
    Insert(#[from] InsertError),
    /// Remapping failed; the ROM keeps the insertion.
    #[error("{0}")]
    Remap(InsertError),
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        RunError::Insert(err.into())
    }
}

impl RunError {
    pub fn error(&self) -> &InsertError {
        match self {
            RunError::Insert(e) | RunError::Remap(e) => e,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Remap(_) => 2,
            RunError::Insert(e) if e.code == ErrorCode::IoFailure => 3,
            RunError::Insert(_) => 1,
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Slots across all lists.
    pub slots: usize,
    /// Sources handed to the assembler.
    pub assembled: usize,
    /// Levels whose sprite data was moved.
    pub remapped: usize,
}

fn apply_patch<A: Assembler>(assembler: &mut A, rom: &mut Rom, patch: &Patch) -> Result<Vec<Symbol>> {
    let symbols = assembler
        .apply(patch, rom.data_mut())
        .map_err(|diagnostics| {
            InsertError::assembler(format!("Failed to apply {}", patch.name), diagnostics)
        })?;
    for symbol in &symbols {
        debug!("\t{}", symbol);
    }
    Ok(symbols)
}

fn apply_file<A: Assembler>(assembler: &mut A, rom: &mut Rom, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(InsertError::new(
            ErrorCode::IoFailure,
            format!("Missing patch {}", path.display()),
        ));
    }
    info!("Applying {}", path.display());
    apply_patch(assembler, rom, &Patch::file(path))?;
    Ok(())
}

/// Insert every listed sprite into the ROM, then remap level data.
pub fn run<A: Assembler>(
    options: &ToolOptions,
    paths: &ToolPaths,
    assembler: &mut A,
) -> std::result::Result<RunReport, RunError> {
    let mut rom = Rom::load(&paths.rom)?;
    checks::run_checks(&rom)?;
    let before = ExtraByteTable::read(&rom)?;
    let asm_dir = &paths.asm_dir;

    fs::write(
        asm_dir.join(CONFIG_FILE),
        config_defines(options.per_level, options.disable_255_per_level),
    )?;
    let extra_defines = list_asm_files(&paths.extra_defines())?;

    let mut lists = read_sprite_lists(&paths.list, &paths.sources, options.per_level)?;
    info!("Read {} slot(s) from {}", lists.len(), paths.list.display());

    if let Some(text) = cleanup_patch(&rom)? {
        info!("Cleaning up a previous run");
        apply_patch(assembler, &mut rom, &Patch::text(CLEANUP_PATCH, text))?;
    }

    let routines = list_asm_files(&paths.routines)?;
    fs::write(asm_dir.join(SHARED_LIBRARY), shared_routines(&routines)?)?;
    info!("{} shared routine(s) available", routines.len());

    let pool = match &paths.s16 {
        Some(path) => TilePool::from_s16(&fs::read(path)?),
        None => TilePool::default(),
    };
    let (tables, tiles, assembled) = {
        let mut pipeline = InsertionPipeline::new(
            assembler,
            PipelineOptions {
                asm_dir: asm_dir.clone(),
                extra_defines,
                per_level: options.per_level,
            },
        )
        .with_tile_pool(pool);
        let tables = pipeline.run(&mut lists, &mut rom)?;
        (tables, pipeline.tiles().clone(), pipeline.assembled())
    };

    write_tables(asm_dir, &tables)?;
    let inputs = CompanionInputs::read(
        paths.ssc.as_deref(),
        paths.mwt.as_deref(),
        paths.mw2.as_deref(),
    )?;
    build_companions(&lists, &tiles, &inputs, options.per_level).write(&paths.rom)?;

    for name in MAIN_PATCHES {
        apply_file(assembler, &mut rom, &asm_dir.join(name))?;
    }
    for hijack in list_asm_files(&paths.extra_hijacks())? {
        apply_file(assembler, &mut rom, &hijack)?;
    }

    if !options.keep_temp {
        remove_tables(asm_dir)?;
        remove_file(&asm_dir.join(SHARED_LIBRARY))?;
    }
    if options.ext_mod {
        append_extmod(&paths.rom)?;
    }
    rom.save(&paths.rom)?;
    info!("All sprites applied successfully");

    let mut report = RunReport {
        slots: lists.len(),
        assembled,
        remapped: 0,
    };
    if options.remap {
        let after = ExtraByteTable::read(&rom).map_err(RunError::Remap)?;
        let mut remapper = RecordRemapper::new(
            assembler,
            RemapOptions {
                always_remap: options.always_remap,
                sa1def: paths.sa1def(),
            },
        );
        report.remapped = remapper
            .run(&mut rom, &before, &after)
            .map_err(RunError::Remap)?;
        if report.remapped > 0 {
            rom.save(&paths.rom).map_err(RunError::Remap)?;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let insert = RunError::from(InsertError::new(ErrorCode::DuplicateSlot, "dup"));
        assert_eq!(insert.exit_code(), 1);
        let io = RunError::from(InsertError::new(ErrorCode::IoFailure, "io"));
        assert_eq!(io.exit_code(), 3);
        let remap = RunError::Remap(InsertError::new(ErrorCode::MalformedRecord, "bad"));
        assert_eq!(remap.exit_code(), 2);
        assert_eq!(remap.error().code, ErrorCode::MalformedRecord);
    }
}
