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

//! Re-encoding of level sprite data.
//!
//! ```text
//! header  entry...                         end
//! 00      YYYYEEsy XXXXSSSS NNNNNNNN [..]  FF
//! ```
//!
//! With bit `0x20` of the header set, `FF xx` is a two-byte marker and
//! only `FF FE` ends the record.

use super::ExtraByteTable;
use crate::error::{ErrorCode, InsertError, Result};

/// Size a re-encoded record must stay below.
pub const RECORD_LIMIT: usize = 0x800;

/// Header bit enabling two-byte markers.
const EXTENDED_FRAMING: u8 = 0x20;

/// Second marker byte ending an extended record.
const EXTENDED_END: u8 = 0xFE;

/// Size of an entry without extra bytes.
const ENTRY_SIZE: u8 = 3;

/// A record re-encoded for the new entry sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    /// Length of the record as stored in the image.
    pub consumed: usize,
}

impl Transcoded {
    /// Whether the record no longer fits its old space.
    pub fn is_resized(&self) -> bool {
        self.bytes.len() != self.consumed
    }
}

fn byte_at(image: &[u8], offset: usize) -> Result<u8> {
    image.get(offset).copied().ok_or_else(|| {
        InsertError::new(
            ErrorCode::MalformedRecord,
            format!("Sprite data runs past the end of the ROM at 0x{:06X}", offset),
        )
    })
}

fn bytes_at(image: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| image.get(offset..end))
        .ok_or_else(|| {
            InsertError::new(
                ErrorCode::MalformedRecord,
                format!("Sprite data runs past the end of the ROM at 0x{:06X}", offset),
            )
        })
}

/// Fail once `out` has reached `limit` bytes.
fn check_limit(out: &[u8], start: usize, limit: usize) -> Result<()> {
    if out.len() >= limit {
        return Err(InsertError::new(
            ErrorCode::RecordTooLarge,
            format!(
                "Sprite data at 0x{:06X} grows beyond 0x{:X} bytes",
                start, RECORD_LIMIT
            ),
        ));
    }
    Ok(())
}

/// Table key of an entry: sprite number plus the two extra bits.
pub fn entry_key(entry: &[u8]) -> usize {
    (((entry[0] & 0x0C) as usize) << 6) | entry[2] as usize
}

/// Re-encode the record at `start` from `before` to `after` entry sizes.
///
/// Each entry keeps `min(before, after)` bytes and is zero-padded up to
/// its new size.
pub fn transcode_record(
    image: &[u8],
    start: usize,
    before: &ExtraByteTable,
    after: &ExtraByteTable,
) -> Result<Transcoded> {
    let header = byte_at(image, start)?;
    let extended = header & EXTENDED_FRAMING != 0;
    let mut out = vec![header];
    let mut offset = start + 1;

    loop {
        // room for one more entry
        check_limit(&out, start, RECORD_LIMIT - ENTRY_SIZE as usize)?;
        let first = byte_at(image, offset)?;
        if first == 0xFF {
            out.push(0xFF);
            if !extended {
                offset += 1;
                break;
            }
            let marker = byte_at(image, offset + 1)?;
            out.push(marker);
            offset += 2;
            if marker == EXTENDED_END {
                break;
            }
            // a screen marker is always followed by an entry, even one starting with FF
        }

        let entry = bytes_at(image, offset, ENTRY_SIZE as usize)?;
        let key = entry_key(entry);
        let old_size = before.get(key);
        let new_size = after.get(key);
        if old_size < ENTRY_SIZE || new_size < ENTRY_SIZE {
            return Err(InsertError::new(
                ErrorCode::MalformedRecord,
                format!(
                    "Sprite {:03X} at 0x{:06X} has an entry size below 3 ({} -> {})",
                    key, offset, old_size, new_size
                ),
            ));
        }

        let kept = old_size.min(new_size) as usize;
        out.extend_from_slice(bytes_at(image, offset, kept)?);
        out.resize(out.len() + (new_size as usize - kept), 0);
        check_limit(&out, start, RECORD_LIMIT)?;
        offset += old_size as usize;
    }

    Ok(Transcoded {
        bytes: out,
        consumed: offset - start,
    })
}
