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

//! Shared helpers for the integration tests.

#![allow(dead_code)]

use spriteweave::assembler::{Assembler, Diagnostic, Patch, Symbol};
use spriteweave::remap::{LEVEL_BANK_TABLE, LEVEL_WORD_TABLE};

/// Size of the test ROM image.
pub const ROM_SIZE: usize = 0x80000;

/// Flat offset of the record every level points at by default.
pub const DEFAULT_RECORD: usize = 0x06_0000;

/// Flat offset where relocated records are placed.
pub const RELOCATION_AREA: usize = 0x05_0000;

/// A LoROM image that passes the pre-insertion checks.
///
/// Every level points at an empty sprite data record.
pub fn test_image() -> Vec<u8> {
    let mut image = vec![0u8; ROM_SIZE];
    // map mode: LoROM
    image[0x7FD5] = 0x20;
    // Lunar Magic VRAM patch
    image[0x76E4] = 0x5C;
    // no previous run
    image[0x01_7FE6] = 0xFF;
    image[DEFAULT_RECORD] = 0x00;
    image[DEFAULT_RECORD + 1] = 0xFF;
    for level in 0..0x200 {
        set_level_pointer(&mut image, level, snes(DEFAULT_RECORD));
    }
    image
}

/// LoROM address of a flat offset.
pub fn snes(offset: usize) -> u32 {
    ((offset & 0x7FFF) | 0x8000 | ((offset & 0x3F_8000) << 1)) as u32
}

pub fn set_level_pointer(image: &mut [u8], level: usize, address: u32) {
    image[LEVEL_BANK_TABLE + level] = (address >> 16) as u8;
    let word = LEVEL_WORD_TABLE + level * 2;
    image[word] = address as u8;
    image[word + 1] = (address >> 8) as u8;
}

pub fn level_pointer(image: &[u8], level: usize) -> u32 {
    let word = LEVEL_WORD_TABLE + level * 2;
    ((image[LEVEL_BANK_TABLE + level] as u32) << 16)
        | ((image[word + 1] as u32) << 8)
        | image[word] as u32
}

/// An assembler that answers from a script instead of running asar.
///
/// Sprite patches print the symbols registered for the source they include.
/// Relocation patches store their blob in the relocation area and repoint
/// the level, like the real patch would.
#[derive(Debug, Default)]
pub struct MockAssembler {
    pub patches: Vec<Patch>,
    prints: Vec<(String, Vec<String>)>,
    fail_on: Vec<String>,
    fail_after_relocations: Option<usize>,
    relocations: usize,
    next_free: usize,
}

impl MockAssembler {
    pub fn new() -> Self {
        Self {
            next_free: RELOCATION_AREA,
            ..Default::default()
        }
    }

    /// Prints for every patch whose text mentions `source`.
    pub fn with_prints(mut self, source: &str, prints: &[&str]) -> Self {
        self.prints.push((
            source.to_string(),
            prints.iter().map(|p| p.to_string()).collect(),
        ));
        self
    }

    /// Fail patches whose name or text mentions `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    /// Fail every relocation after the first `count`.
    pub fn failing_after_relocations(mut self, count: usize) -> Self {
        self.fail_after_relocations = Some(count);
        self
    }

    pub fn patch_names(&self) -> Vec<String> {
        self.patches.iter().map(|p| p.name.clone()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.patches.iter().filter(|p| p.name == name).count()
    }

    fn relocate(&mut self, patch: &Patch, image: &mut [u8]) -> Result<(), Vec<Diagnostic>> {
        if self
            .fail_after_relocations
            .is_some_and(|limit| self.relocations >= limit)
        {
            return Err(vec![Diagnostic::new("no free space left")]);
        }
        let level = patch
            .name
            .trim_start_matches("_tmp_")
            .trim_end_matches(".asm");
        let level = usize::from_str_radix(level, 16).map_err(|_| Vec::new())?;
        let blob = &patch.binaries[0].1;
        image[self.next_free..self.next_free + blob.len()].copy_from_slice(blob);
        set_level_pointer(image, level, snes(self.next_free));
        self.next_free += blob.len().next_multiple_of(0x10);
        self.relocations += 1;
        Ok(())
    }
}

impl Assembler for MockAssembler {
    fn apply(&mut self, patch: &Patch, image: &mut Vec<u8>) -> Result<Vec<Symbol>, Vec<Diagnostic>> {
        self.patches.push(patch.clone());
        let text = patch.as_text().unwrap_or_default().to_string();

        if self
            .fail_on
            .iter()
            .any(|f| patch.name.contains(f.as_str()) || text.contains(f.as_str()))
        {
            return Err(vec![Diagnostic::new("scripted failure").at(patch.name.clone(), 1)]);
        }

        if patch.name.starts_with("_tmp_") {
            self.relocate(patch, image)?;
            return Ok(Vec::new());
        }

        let prints = self
            .prints
            .iter()
            .find(|(source, _)| text.contains(source.as_str()))
            .map(|(_, prints)| prints.iter().map(|p| Symbol::parse(p)).collect())
            .unwrap_or_default();
        Ok(prints)
    }
}
