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

//! Boundary to the external 65c816 assembler.
//!
//! Spriteweave never assembles code itself. It hands [`Patch`]es to an
//! [`Assembler`], which patches the image in place and returns the lines
//! the patch printed as [`Symbol`]s, or the [`Diagnostic`]s explaining
//! why it failed.

mod asar;

pub use asar::{find_asar, AsarProcess};

use std::fmt;
use std::path::PathBuf;

/// Something that applies patches to an image.
pub trait Assembler {
    /// Apply a patch to the image.
    ///
    /// On failure the image must be left as it was.
    fn apply(&mut self, patch: &Patch, image: &mut Vec<u8>)
        -> Result<Vec<Symbol>, Vec<Diagnostic>>;
}

/// Where the patch source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSource {
    /// Generated patch text.
    Text(String),
    /// An existing patch file on disk.
    File(PathBuf),
}

/// One unit of work for the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// File name used when the text is written to disk.
    pub name: String,
    pub source: PatchSource,
    /// Files the patch `incbin`s, written next to it.
    pub binaries: Vec<(String, Vec<u8>)>,
}

impl Patch {
    /// A patch from generated text.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: PatchSource::Text(text.into()),
            binaries: Vec::new(),
        }
    }

    /// A patch read from a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source: PatchSource::File(path),
            binaries: Vec::new(),
        }
    }

    /// Attach a binary file.
    pub fn with_binary(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.binaries.push((name.into(), data));
        self
    }

    /// The patch text, if it was generated.
    pub fn as_text(&self) -> Option<&str> {
        match &self.source {
            PatchSource::Text(text) => Some(text),
            PatchSource::File(_) => None,
        }
    }
}

/// A line printed by a patch, optionally carrying an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: Option<u32>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, address: Option<u32>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Parse a printed line of the form `NAME $XXXXXX`.
    ///
    /// Lines that do not end in a hex number become a symbol without
    /// address named after the whole line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some((name, rest)) = line.split_once(char::is_whitespace) {
            let digits = rest.trim();
            let digits = digits.strip_prefix('$').unwrap_or(digits);
            if !digits.is_empty() {
                if let Ok(address) = u32::from_str_radix(digits, 16) {
                    return Self::new(name, Some(address));
                }
            }
        }
        Self::new(line, None)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(f, "{} ${:06X}", self.name, address),
            None => write!(f, "{}", self.name),
        }
    }
}

/// An error or warning reported by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a source location.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Parse one line of assembler error output.
    ///
    /// Understands `file:line: error: message`; anything else becomes a
    /// message without location.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        for marker in [": error: ", ": fatal error: ", ": warning: "] {
            if let Some((location, message)) = line.split_once(marker) {
                if let Some((file, number)) = location.rsplit_once(':') {
                    if let Ok(number) = number.trim().parse::<u32>() {
                        return Self::new(message.trim()).at(file.trim(), number);
                    }
                }
                return Self::new(message.trim());
            }
        }
        Self::new(line)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}: {}", file, line, self.message),
            (Some(file), None) => write!(f, "{}: {}", file, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}
