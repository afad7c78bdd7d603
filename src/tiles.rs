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

//! Map16 tile pool.
//!
//! Lunar Magic keeps sprite display tiles in an `.s16` file: a flat array
//! of 16x16 tiles, each made of four 8x8 sub-tiles stored as
//! (tile number, properties) byte pairs. Custom sprites bring their own
//! tiles, which are spliced into the first free run of the pool.

use crate::error::{ErrorCode, InsertError, Result};

/// Number of tile quads in a full `.s16` file.
pub const POOL_SIZE: usize = 0x3800;

/// Size of one encoded quad.
pub const QUAD_SIZE: usize = 8;

/// One 8x8 sub-tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubTile {
    pub tile: u8,
    pub prop: u8,
}

impl SubTile {
    pub fn is_empty(&self) -> bool {
        self.tile == 0 && self.prop == 0
    }
}

/// A 16x16 tile made of four sub-tiles.
///
/// Storage order is top-left, bottom-left, top-right, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileQuad {
    pub top_left: SubTile,
    pub bottom_left: SubTile,
    pub top_right: SubTile,
    pub bottom_right: SubTile,
}

impl TileQuad {
    pub fn from_bytes(b: [u8; QUAD_SIZE]) -> Self {
        Self {
            top_left: SubTile { tile: b[0], prop: b[1] },
            bottom_left: SubTile { tile: b[2], prop: b[3] },
            top_right: SubTile { tile: b[4], prop: b[5] },
            bottom_right: SubTile { tile: b[6], prop: b[7] },
        }
    }

    pub fn to_bytes(&self) -> [u8; QUAD_SIZE] {
        [
            self.top_left.tile,
            self.top_left.prop,
            self.bottom_left.tile,
            self.bottom_left.prop,
            self.top_right.tile,
            self.top_right.prop,
            self.bottom_right.tile,
            self.bottom_right.prop,
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.top_left.is_empty()
            && self.bottom_left.is_empty()
            && self.top_right.is_empty()
            && self.bottom_right.is_empty()
    }
}

/// Decode a byte stream into quads. A trailing partial quad is zero-filled.
pub fn quads_from_bytes(data: &[u8]) -> Vec<TileQuad> {
    data.chunks(QUAD_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; QUAD_SIZE];
            raw[..chunk.len()].copy_from_slice(chunk);
            TileQuad::from_bytes(raw)
        })
        .collect()
}

/// A fixed-length sequence of tile quads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePool {
    quads: Vec<TileQuad>,
}

impl Default for TilePool {
    fn default() -> Self {
        Self::new(POOL_SIZE)
    }
}

impl TilePool {
    /// Create a pool of `len` empty quads.
    pub fn new(len: usize) -> Self {
        Self {
            quads: vec![TileQuad::default(); len],
        }
    }

    /// Create a full-size pool seeded from an existing `.s16` file.
    ///
    /// Data beyond the pool size is ignored; a short file leaves the rest empty.
    pub fn from_s16(data: &[u8]) -> Self {
        let mut pool = Self::default();
        for (slot, quad) in pool.quads.iter_mut().zip(quads_from_bytes(data)) {
            *slot = quad;
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn quads(&self) -> &[TileQuad] {
        &self.quads
    }

    /// Find the first index whose next `count` quads are all empty.
    ///
    /// A request for zero quads always answers index 0.
    pub fn find_free_run(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return Some(0);
        }
        let mut run = 0;
        for (index, quad) in self.quads.iter().enumerate() {
            if quad.is_empty() {
                run += 1;
                if run == count {
                    return Some(index + 1 - count);
                }
            } else {
                run = 0;
            }
        }
        None
    }

    /// Overwrite quads starting at `index`. The pool length never changes.
    pub fn replace_range(&mut self, index: usize, quads: &[TileQuad]) -> Result<()> {
        let end = index
            .checked_add(quads.len())
            .filter(|&end| end <= self.quads.len())
            .ok_or_else(|| {
                InsertError::new(
                    ErrorCode::OutOfRange,
                    format!(
                        "Tile range {}..{} exceeds pool size {}",
                        index,
                        index + quads.len(),
                        self.quads.len()
                    ),
                )
            })?;
        self.quads[index..end].copy_from_slice(quads);
        Ok(())
    }

    /// Place quads in the first free run and return its index.
    pub fn place(&mut self, quads: &[TileQuad]) -> Result<usize> {
        let index = self.find_free_run(quads.len()).ok_or_else(|| {
            InsertError::new(
                ErrorCode::TilePoolExhausted,
                format!("No room for {} map16 tiles in the tile pool", quads.len()),
            )
            .with_hint("remove custom map16 data or free tiles in the base .s16 file")
        })?;
        self.replace_range(index, quads)?;
        Ok(index)
    }

    /// Encode the pool as an `.s16` file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.quads.iter().flat_map(|q| q.to_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(value: u8) -> TileQuad {
        TileQuad::from_bytes([value; QUAD_SIZE])
    }

    #[test]
    fn test_quad_byte_order() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let quad = TileQuad::from_bytes(bytes);
        assert_eq!(quad.bottom_left, SubTile { tile: 3, prop: 4 });
        assert_eq!(quad.top_right, SubTile { tile: 5, prop: 6 });
        assert_eq!(quad.to_bytes(), bytes);
    }

    #[test]
    fn test_find_free_run_skips_occupied() {
        let mut pool = TilePool::new(8);
        pool.replace_range(1, &[filled(1)]).unwrap();
        pool.replace_range(4, &[filled(1)]).unwrap();
        // free: 0, 2, 3, 5, 6, 7
        assert_eq!(pool.find_free_run(1), Some(0));
        assert_eq!(pool.find_free_run(2), Some(2));
        assert_eq!(pool.find_free_run(3), Some(5));
        assert_eq!(pool.find_free_run(4), None);
    }

    #[test]
    fn test_zero_count_is_index_zero() {
        let mut pool = TilePool::new(2);
        pool.replace_range(0, &[filled(9), filled(9)]).unwrap();
        assert_eq!(pool.find_free_run(0), Some(0));
    }

    #[test]
    fn test_replace_preserves_length() {
        let mut pool = TilePool::new(4);
        pool.replace_range(2, &[filled(1), filled(2)]).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.quads()[3], filled(2));
        assert!(pool.replace_range(3, &[filled(1), filled(2)]).is_err());
    }

    #[test]
    fn test_place_exhausted() {
        let mut pool = TilePool::new(2);
        assert_eq!(pool.place(&[filled(1)]).unwrap(), 0);
        let err = pool.place(&[filled(1), filled(1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TilePoolExhausted);
    }

    #[test]
    fn test_from_s16_pads_to_full_size() {
        let pool = TilePool::from_s16(&[0xAA; 12]);
        assert_eq!(pool.len(), POOL_SIZE);
        assert_eq!(pool.quads()[0], filled(0xAA));
        assert_eq!(
            pool.quads()[1].to_bytes(),
            [0xAA, 0xAA, 0xAA, 0xAA, 0, 0, 0, 0]
        );
        assert!(pool.quads()[2].is_empty());
        assert_eq!(pool.to_bytes().len(), POOL_SIZE * QUAD_SIZE);
    }
}
