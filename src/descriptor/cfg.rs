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

//! CFG descriptor parser.
//!
//! ```text
//! 01                  type
//! 36                  act-like
//! 00 00 31 81 00 00   tweak bytes
//! 00 00               extra property bytes
//! goomba.asm          source file
//! 2:3                 additional byte counts (optional)
//! ```

use std::path::Path;

use super::malformed;
use crate::error::Result;
use crate::sprite::SpriteSlot;

fn hex_byte(text: &str, file: &Path, what: &str) -> Result<u8> {
    u8::from_str_radix(text.trim(), 16)
        .map_err(|_| malformed(file, format!("invalid {} '{}'", what, text.trim())))
}

fn hex_bytes<const N: usize>(line: &str, file: &Path, what: &str) -> Result<[u8; N]> {
    let values = line
        .split_whitespace()
        .map(|part| hex_byte(part, file, what))
        .collect::<Result<Vec<u8>>>()?;
    values.try_into().map_err(|values: Vec<u8>| {
        malformed(
            file,
            format!("expected {} {}, found {}", N, what, values.len()),
        )
    })
}

/// Parse `clear:set` byte counts. Anything else counts as zero.
fn byte_counts(line: &str) -> (u8, u8) {
    line.trim()
        .split_once(':')
        .and_then(|(clear, set)| {
            let clear = u8::from_str_radix(clear.trim(), 16).ok()?;
            let set = u8::from_str_radix(set.trim(), 16).ok()?;
            Some((clear, set))
        })
        .unwrap_or((0, 0))
}

/// Apply a CFG descriptor to a slot.
///
/// `file` names the descriptor in errors and anchors the source path.
pub fn apply_cfg(text: &str, file: &Path, slot: &mut SpriteSlot) -> Result<()> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() != 5 && lines.len() != 6 {
        return Err(malformed(
            file,
            format!("expected 5 or 6 lines, found {}", lines.len()),
        ));
    }

    slot.table.sprite_type = hex_byte(lines[0], file, "type")?;
    slot.table.act_like = hex_byte(lines[1], file, "act-like")?;
    slot.table.tweak = hex_bytes::<6>(lines[2], file, "tweak bytes")?;
    slot.table.extra = hex_bytes::<2>(lines[3], file, "extra property bytes")?;

    let base = file.parent().unwrap_or_else(|| Path::new(""));
    slot.asm_file = Some(base.join(lines[4].trim()));

    let (clear, set) = lines.get(5).map(|l| byte_counts(l)).unwrap_or((0, 0));
    slot.set_byte_counts(clear, set);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::sprite::{ListKind, SlotId};
    use std::path::PathBuf;

    fn slot() -> SpriteSlot {
        SpriteSlot::new(SlotId::global(ListKind::Sprite, 0), 1, PathBuf::from("sprites"))
    }

    #[test]
    fn test_full_cfg() {
        let mut s = slot();
        let text = "01\n36\n00 00 31 81 00 00\n\n0A 0B\ngoomba.asm\n2:E\n";
        apply_cfg(text, Path::new("sprites/goomba.cfg"), &mut s).unwrap();

        assert_eq!(s.table.sprite_type, 0x01);
        assert_eq!(s.table.act_like, 0x36);
        assert_eq!(s.table.tweak, [0x00, 0x00, 0x31, 0x81, 0x00, 0x00]);
        assert_eq!(s.table.extra, [0x0A, 0x0B]);
        assert_eq!(s.asm_file, Some(PathBuf::from("sprites/goomba.asm")));
        assert_eq!((s.byte_count, s.extra_byte_count), (2, 12));
    }

    #[test]
    fn test_five_lines_without_counts() {
        let mut s = slot();
        apply_cfg("00\n10\n0 0 0 0 0 0\n0 0\nx.asm", Path::new("x.cfg"), &mut s).unwrap();
        assert_eq!((s.byte_count, s.extra_byte_count), (0, 0));
        assert!(s.is_tweak());
    }

    #[test]
    fn test_bad_counts_are_zero() {
        assert_eq!(byte_counts("nonsense"), (0, 0));
        assert_eq!(byte_counts("3:4"), (3, 4));
    }

    #[test]
    fn test_wrong_line_count() {
        let err = apply_cfg("01\n36\n", Path::new("bad.cfg"), &mut slot()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedSourceDescriptor);
        assert!(err.message.contains("bad.cfg"));
    }

    #[test]
    fn test_wrong_tweak_count() {
        let err = apply_cfg(
            "01\n36\n00 00 31\n00 00\na.asm\n",
            Path::new("a.cfg"),
            &mut slot(),
        )
        .unwrap_err();
        assert!(err.message.contains("expected 6 tweak bytes, found 3"));
    }
}
