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

use std::fmt::Write as _;
use std::path::Path;

use crate::assembler::Patch;
use crate::pipeline::patches::asar_path;

/// A re-encoded record moved to fresh space by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationUnit {
    pub level: u16,
    pub blob: Vec<u8>,
    /// SNES address of the level's bank byte.
    pub bank_address: u32,
    /// SNES address of the level's pointer word.
    pub word_address: u32,
}

impl RelocationUnit {
    pub fn label(&self) -> String {
        format!("SpriteData{:X}", self.level)
    }

    pub fn patch_name(&self) -> String {
        format!("_tmp_{:X}.asm", self.level)
    }

    pub fn binary_name(&self) -> String {
        format!("_tmp_bin_{:X}.bin", self.level)
    }

    /// Patch text freeing the old record and pointing the level at the blob.
    pub fn text(&self, sa1def: &Path) -> String {
        let label = self.label();
        let bank = self.bank_address;
        let word = self.word_address;
        let mut text = String::new();
        let _ = writeln!(text, "incsrc \"{}\"\n", asar_path(sa1def));
        let _ = writeln!(
            text,
            "!oldDataPointer = read2(${:06X})|(read1(${:06X})<<16)",
            word, bank
        );
        let _ = writeln!(
            text,
            "!oldDataSize = read2(pctosnes(snestopc(!oldDataPointer)-4))+1"
        );
        let _ = writeln!(text, "autoclean !oldDataPointer\n");
        let _ = writeln!(text, "org ${:06X}\n\tdb {}>>16\n", bank, label);
        let _ = writeln!(text, "org ${:06X}\n\tdw {}\n", word, label);
        let _ = writeln!(text, "freedata cleaned\n{}:", label);
        let _ = writeln!(text, "\t!newDataPointer = {}", label);
        let _ = writeln!(text, "\tincbin {}", self.binary_name());
        let _ = writeln!(text, "{}_end:", label);
        let _ = writeln!(
            text,
            "\tprint \"Data pointer $\",hex(!oldDataPointer), \" : $\",hex(!newDataPointer)"
        );
        let _ = writeln!(
            text,
            "\tprint \"Data size    $\",hex(!oldDataSize),\" : $\",hex({}_end-{}-1)",
            label, label
        );
        text
    }

    pub fn patch(&self, sa1def: &Path) -> Patch {
        Patch::text(self.patch_name(), self.text(sa1def))
            .with_binary(self.binary_name(), self.blob.clone())
    }
}
