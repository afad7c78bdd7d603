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

//! Fuzz target for level sprite data transcoding.
//!
//! Feeds random records and entry size tables to the transcoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_transcode

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spriteweave::remap::{transcode_record, ExtraByteTable, RECORD_LIMIT};

#[derive(Debug, Arbitrary)]
struct Input {
    record: Vec<u8>,
    grown: Vec<(u16, u8)>,
}

fuzz_target!(|input: Input| {
    let before = ExtraByteTable::default();
    let mut after = ExtraByteTable::default();
    for (key, size) in input.grown {
        after.set(key as usize % 0x400, size);
    }

    if let Ok(out) = transcode_record(&input.record, 0, &before, &after) {
        assert!(out.bytes.len() <= RECORD_LIMIT);
        assert!(out.consumed <= input.record.len());
    }
});
