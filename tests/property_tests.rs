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

//! Property-based tests for Spriteweave.
//!
//! These tests verify invariants that should hold for all inputs,
//! using proptest for random input generation.

mod common;

use proptest::prelude::*;
use spriteweave::arena::Arena;
use spriteweave::remap::{transcode_record, ExtraByteTable, RecordRemapper, RemapOptions};
use spriteweave::rom::{AddressSpace, Mapper};
use spriteweave::tiles::{SubTile, TilePool, TileQuad};
use spriteweave::{ErrorCode, Rom};

// ============================================================================
// Address Mapping
// ============================================================================

fn lorom_address() -> impl Strategy<Value = u32> {
    (0x00u32..0x7E, 0x8000u32..0x10000).prop_map(|(bank, low)| (bank << 16) | low)
}

proptest! {
    /// Property: canonical LoROM addresses survive a round trip.
    #[test]
    fn prop_lorom_round_trip(address in lorom_address()) {
        let space = AddressSpace::new(Mapper::LoRom);
        let flat = space.to_flat(address);
        prop_assert!(flat.is_some());
        prop_assert_eq!(space.to_native(flat.unwrap()), address);
    }

    /// Property: flat offsets survive a round trip under both mappers.
    #[test]
    fn prop_flat_round_trip(offset in 0usize..0x3F_0000, sa1 in any::<bool>()) {
        let space = AddressSpace::new(if sa1 { Mapper::Sa1 } else { Mapper::LoRom });
        let native = space.to_native(offset);
        prop_assert_eq!(space.to_flat(native), Some(offset));
    }
}

// ============================================================================
// Arena Allocation
// ============================================================================

proptest! {
    /// Property: the cursor never decreases and never passes capacity.
    #[test]
    fn prop_arena_monotonic(sizes in prop::collection::vec(0usize..0x40, 0..64)) {
        let mut arena = Arena::new("test", 0x400);
        let mut last = 0;
        for size in sizes {
            match arena.allocate(size) {
                Ok(base) => {
                    prop_assert_eq!(base, last);
                    prop_assert!(arena.cursor() >= last);
                    last = arena.cursor();
                }
                Err(err) => {
                    prop_assert_eq!(err.code, ErrorCode::ArenaExhausted);
                    prop_assert_eq!(arena.cursor(), last);
                }
            }
            prop_assert!(arena.cursor() <= arena.capacity());
        }
    }
}

// ============================================================================
// Tile Pool
// ============================================================================

fn used_quad() -> TileQuad {
    TileQuad {
        top_left: SubTile { tile: 1, prop: 0 },
        ..Default::default()
    }
}

proptest! {
    /// Property: a free run never overlaps a used quad.
    #[test]
    fn prop_free_run_is_free(
        used in prop::collection::vec(any::<bool>(), 1..64),
        count in 1usize..8,
    ) {
        let mut pool = TilePool::new(used.len());
        for (index, &is_used) in used.iter().enumerate() {
            if is_used {
                pool.replace_range(index, &[used_quad()]).unwrap();
            }
        }

        match pool.find_free_run(count) {
            Some(index) => {
                prop_assert!(index + count <= pool.len());
                prop_assert!(pool.quads()[index..index + count].iter().all(TileQuad::is_empty));
                // no earlier run exists
                for start in 0..index {
                    prop_assert!(!pool.quads()[start..start + count].iter().all(TileQuad::is_empty));
                }
            }
            None => {
                for window in pool.quads().windows(count) {
                    prop_assert!(!window.iter().all(TileQuad::is_empty));
                }
            }
        }
    }

    /// Property: placing quads never changes the pool length.
    #[test]
    fn prop_place_keeps_length(count in 0usize..8, len in 1usize..32) {
        let mut pool = TilePool::new(len);
        let quads = vec![used_quad(); count];
        let _ = pool.place(&quads);
        prop_assert_eq!(pool.len(), len);
    }
}

// ============================================================================
// Record Transcoding
// ============================================================================

fn record() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((0u8..0xF0, any::<u8>(), any::<u8>()), 0..32).prop_map(|entries| {
        let mut bytes = vec![0x00];
        for (a, b, c) in entries {
            bytes.extend_from_slice(&[a, b, c]);
        }
        bytes.push(0xFF);
        bytes
    })
}

fn entry(first: impl Strategy<Value = u8>) -> impl Strategy<Value = [u8; 3]> {
    (first, any::<u8>(), any::<u8>()).prop_map(|(a, b, c)| [a, b, c])
}

/// A screen: its marker byte, the entry right after it, and plain entries.
fn screen() -> impl Strategy<Value = (u8, [u8; 3], Vec<[u8; 3]>)> {
    (
        any::<u8>().prop_filter("end marker", |m| *m != 0xFE),
        entry(any::<u8>()),
        prop::collection::vec(entry(0u8..0xFF), 0..8),
    )
}

/// An extended record and its number of entries.
fn extended_record() -> impl Strategy<Value = (Vec<u8>, usize)> {
    (
        prop::collection::vec(entry(0u8..0xFF), 0..8),
        prop::collection::vec(screen(), 0..6),
    )
        .prop_map(|(leading, screens)| {
            let mut bytes = vec![0x20];
            let mut entries = leading.len();
            for e in &leading {
                bytes.extend_from_slice(e);
            }
            for (marker, first, rest) in screens {
                bytes.extend_from_slice(&[0xFF, marker]);
                bytes.extend_from_slice(&first);
                for e in &rest {
                    bytes.extend_from_slice(e);
                }
                entries += 1 + rest.len();
            }
            bytes.extend_from_slice(&[0xFF, 0xFE]);
            (bytes, entries)
        })
}

proptest! {
    /// Property: identical tables reproduce an extended record byte for byte.
    #[test]
    fn prop_identity_transcode_extended(record in extended_record()) {
        let (bytes, _) = record;
        let table = ExtraByteTable::default();
        let out = transcode_record(&bytes, 0, &table, &table).unwrap();
        prop_assert_eq!(&out.bytes, &bytes);
        prop_assert_eq!(out.consumed, bytes.len());
    }

    /// Property: growing every entry of an extended record pads each one.
    #[test]
    fn prop_growth_adds_padding_extended(record in extended_record(), extra in 1u8..4) {
        let (bytes, entries) = record;
        let before = ExtraByteTable::default();
        let after = ExtraByteTable::from_bytes([3 + extra; 0x400]);
        let out = transcode_record(&bytes, 0, &before, &after).unwrap();
        prop_assert_eq!(out.bytes.len(), bytes.len() + entries * extra as usize);
        prop_assert_eq!(out.consumed, bytes.len());
    }

    /// Property: identical tables reproduce the record byte for byte.
    #[test]
    fn prop_identity_transcode(bytes in record()) {
        let table = ExtraByteTable::default();
        let out = transcode_record(&bytes, 0, &table, &table).unwrap();
        prop_assert_eq!(&out.bytes, &bytes);
        prop_assert_eq!(out.consumed, bytes.len());
    }

    /// Property: growing every entry adds exactly the new bytes.
    #[test]
    fn prop_growth_adds_padding(bytes in record(), extra in 0u8..4) {
        let before = ExtraByteTable::default();
        let after = ExtraByteTable::from_bytes([3 + extra; 0x400]);
        let entries = (bytes.len() - 2) / 3;
        let out = transcode_record(&bytes, 0, &before, &after).unwrap();
        prop_assert_eq!(out.bytes.len(), bytes.len() + entries * extra as usize);
    }

    /// Property: transcoding there and back restores the record.
    #[test]
    fn prop_shrink_after_growth_restores(bytes in record(), extra in 1u8..4) {
        let small = ExtraByteTable::default();
        let large = ExtraByteTable::from_bytes([3 + extra; 0x400]);
        let grown = transcode_record(&bytes, 0, &small, &large).unwrap();
        let back = transcode_record(&grown.bytes, 0, &large, &small).unwrap();
        prop_assert_eq!(back.bytes, bytes);
        prop_assert_eq!(back.consumed, grown.bytes.len());
    }

    /// Property: a second remap with the same tables moves nothing.
    #[test]
    fn prop_remap_is_idempotent(extra in 4u8..7, key in 0usize..0x100) {
        let mut image = common::test_image();
        let record_at = 0x06_0100;
        let record = [0x00, 0x10, 0x20, key as u8, 0x30, 0x40, 0x07, 0xFF];
        image[record_at..record_at + record.len()].copy_from_slice(&record);
        common::set_level_pointer(&mut image, 0x105, common::snes(record_at));

        let before = ExtraByteTable::default();
        let mut after = ExtraByteTable::default();
        after.set(key, extra);
        let options = RemapOptions {
            always_remap: false,
            sa1def: "asm/sa1def.asm".into(),
        };

        let mut rom = Rom::from_bytes(image);
        let mut assembler = common::MockAssembler::new();
        let first = RecordRemapper::new(&mut assembler, options.clone())
            .run(&mut rom, &before, &after)
            .unwrap();
        prop_assert_eq!(first, 1);

        let snapshot = rom.data().to_vec();
        let second = RecordRemapper::new(&mut assembler, options)
            .run(&mut rom, &after, &after)
            .unwrap();
        prop_assert_eq!(second, 0);
        prop_assert!(rom.data() == snapshot.as_slice());
    }
}
