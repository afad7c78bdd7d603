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

//! Resolved configuration of a run.

use std::path::{Path, PathBuf};

use crate::descriptor::SourceDirs;

/// Switches of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOptions {
    pub debug: bool,
    /// Keep generated patches and tables.
    pub keep_temp: bool,
    pub per_level: bool,
    pub disable_255_per_level: bool,
    /// Log the run in the ROM's `.extmod` file.
    pub ext_mod: bool,
    pub remap: bool,
    pub always_remap: bool,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            debug: false,
            keep_temp: false,
            per_level: false,
            disable_255_per_level: false,
            ext_mod: true,
            remap: true,
            always_remap: false,
        }
    }
}

/// Every file and directory a run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub rom: PathBuf,
    pub list: PathBuf,
    pub asm_dir: PathBuf,
    pub routines: PathBuf,
    pub sources: SourceDirs,
    /// User files merged into the Lunar Magic companions.
    pub ssc: Option<PathBuf>,
    pub mwt: Option<PathBuf>,
    pub mw2: Option<PathBuf>,
    /// Base tile pool.
    pub s16: Option<PathBuf>,
}

impl ToolPaths {
    /// The default layout below a tool directory.
    pub fn new(rom: impl Into<PathBuf>, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            rom: rom.into(),
            list: root.join("list.txt"),
            asm_dir: root.join("asm"),
            routines: root.join("routines"),
            sources: SourceDirs::new(root),
            ssc: None,
            mwt: None,
            mw2: None,
            s16: None,
        }
    }

    pub fn sa1def(&self) -> PathBuf {
        self.asm_dir.join("sa1def.asm")
    }

    pub fn extra_defines(&self) -> PathBuf {
        self.asm_dir.join("ExtraDefines")
    }

    pub fn extra_hijacks(&self) -> PathBuf {
        self.asm_dir.join("ExtraHijacks")
    }
}
