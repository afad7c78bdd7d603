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

//! Level sprite data remapping against a scripted assembler.

mod common;

use common::{level_pointer, set_level_pointer, snes, test_image, MockAssembler, RELOCATION_AREA};
use pretty_assertions::assert_eq;
use spriteweave::remap::{ExtraByteTable, RecordRemapper, RemapOptions};
use spriteweave::{ErrorCode, Rom};

const LEVEL_105_RECORD: usize = 0x06_0100;
const LEVEL_106_RECORD: usize = 0x06_0200;

/// Level 105 holds `[05 + 3 bytes][07 + 3 bytes][FF]`.
fn image_with_level_105() -> Vec<u8> {
    let mut image = test_image();
    let record = [0x00, 0x10, 0x20, 0x05, 0x30, 0x40, 0x07, 0xFF];
    image[LEVEL_105_RECORD..LEVEL_105_RECORD + record.len()].copy_from_slice(&record);
    set_level_pointer(&mut image, 0x105, snes(LEVEL_105_RECORD));
    image
}

fn grown(key: usize, size: u8) -> (ExtraByteTable, ExtraByteTable) {
    let before = ExtraByteTable::default();
    let mut after = ExtraByteTable::default();
    after.set(key, size);
    (before, after)
}

fn options() -> RemapOptions {
    RemapOptions {
        always_remap: false,
        sa1def: "asm/sa1def.asm".into(),
    }
}

#[test]
fn test_grown_entry_is_relocated() {
    let mut rom = Rom::from_bytes(image_with_level_105());
    let (before, after) = grown(0x05, 5);
    let mut assembler = MockAssembler::new();

    let count = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &before, &after)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(assembler.patch_names(), vec!["_tmp_105.asm"]);
    assert_eq!(level_pointer(rom.data(), 0x105), snes(RELOCATION_AREA));
    assert_eq!(
        &rom.data()[RELOCATION_AREA..RELOCATION_AREA + 10],
        &[0x00, 0x10, 0x20, 0x05, 0x00, 0x00, 0x30, 0x40, 0x07, 0xFF]
    );
    // the empty default record has no entries and keeps its place
    assert_eq!(level_pointer(rom.data(), 0x000), snes(common::DEFAULT_RECORD));
}

#[test]
fn test_unchanged_tables_leave_image_alone() {
    let image = image_with_level_105();
    let mut rom = Rom::from_bytes(image.clone());
    let table = ExtraByteTable::default();
    let mut assembler = MockAssembler::new();

    let count = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &table, &table)
        .unwrap();

    assert_eq!(count, 0);
    assert!(assembler.patches.is_empty());
    assert!(rom.data() == image.as_slice());
}

#[test]
fn test_always_remap_without_changes_moves_nothing() {
    let image = image_with_level_105();
    let mut rom = Rom::from_bytes(image.clone());
    let table = ExtraByteTable::default();
    let mut assembler = MockAssembler::new();

    let count = RecordRemapper::new(
        &mut assembler,
        RemapOptions {
            always_remap: true,
            ..options()
        },
    )
    .run(&mut rom, &table, &table)
    .unwrap();

    assert_eq!(count, 0);
    assert!(rom.data() == image.as_slice());
}

#[test]
fn test_shared_record_is_moved_once() {
    let mut image = image_with_level_105();
    set_level_pointer(&mut image, 0x106, snes(LEVEL_105_RECORD));
    let mut rom = Rom::from_bytes(image);
    let (before, after) = grown(0x07, 4);
    let mut assembler = MockAssembler::new();

    let count = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &before, &after)
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(assembler.count("_tmp_105.asm"), 1);
    assert_eq!(assembler.count("_tmp_106.asm"), 0);
    assert_eq!(
        level_pointer(rom.data(), 0x106),
        level_pointer(rom.data(), 0x105)
    );
}

#[test]
fn test_failure_restores_image() {
    let mut image = image_with_level_105();
    let record = [0x00, 0x10, 0x20, 0x05, 0xFF];
    image[LEVEL_106_RECORD..LEVEL_106_RECORD + record.len()].copy_from_slice(&record);
    set_level_pointer(&mut image, 0x106, snes(LEVEL_106_RECORD));
    let mut rom = Rom::from_bytes(image.clone());
    let (before, after) = grown(0x05, 4);
    let mut assembler = MockAssembler::new().failing_after_relocations(1);

    let err = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &before, &after)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::AssemblerError);
    assert!(err.message.contains("106"));
    assert_eq!(assembler.patches.len(), 2);
    assert!(rom.data() == image.as_slice(), "image was not restored");
}

#[test]
fn test_malformed_record_restores_image() {
    let mut image = image_with_level_105();
    // record running into the end of the image
    let last = image.len() - 2;
    image[last] = 0x00;
    image[last + 1] = 0x10;
    set_level_pointer(&mut image, 0x1FF, snes(last));
    let mut rom = Rom::from_bytes(image.clone());
    let (before, after) = grown(0x05, 4);
    let mut assembler = MockAssembler::new();

    let err = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &before, &after)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::MalformedRecord);
    assert!(err.message.contains("Level 1FF"));
    assert!(rom.data() == image.as_slice());
}

#[test]
fn test_unmapped_pointer_is_skipped() {
    let mut image = image_with_level_105();
    set_level_pointer(&mut image, 0x010, 0x7E_0000);
    let mut rom = Rom::from_bytes(image);
    let (before, after) = grown(0x05, 5);
    let mut assembler = MockAssembler::new();

    let count = RecordRemapper::new(&mut assembler, options())
        .run(&mut rom, &before, &after)
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(level_pointer(rom.data(), 0x010), 0x7E_0000);
}
