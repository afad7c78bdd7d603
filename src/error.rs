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

//! Error types for Spriteweave.
//!
//! Every failure of a run is reported as an [`InsertError`] carrying an
//! [`ErrorCode`]. Errors are terminal: nothing in the crate retries.

use crate::assembler::Diagnostic;
use std::io;
use thiserror::Error;

/// Error codes for insertion and remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Descriptor errors (E001-E009)
    MalformedSourceDescriptor,
    DuplicateSlot,

    // Assembly errors (E010-E029)
    MissingEntryPoints,
    VersionGuardFailed,
    AssemblerError,

    // Layout errors (E100-E199)
    ArenaExhausted,
    TilePoolExhausted,
    OutOfRange,

    // Remap errors (E200-E299)
    MalformedRecord,
    RecordTooLarge,

    // ROM checks (E300)
    RomCheckFailed,

    // Environment (E900)
    IoFailure,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedSourceDescriptor => "E001",
            ErrorCode::DuplicateSlot => "E002",

            ErrorCode::MissingEntryPoints => "E010",
            ErrorCode::VersionGuardFailed => "E011",
            ErrorCode::AssemblerError => "E020",

            ErrorCode::ArenaExhausted => "E100",
            ErrorCode::TilePoolExhausted => "E101",
            ErrorCode::OutOfRange => "E102",

            ErrorCode::MalformedRecord => "E200",
            ErrorCode::RecordTooLarge => "E201",

            ErrorCode::RomCheckFailed => "E300",

            ErrorCode::IoFailure => "E900",
        }
    }
}

/// An insertion or remap error.
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct InsertError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
    /// Diagnostics reported by the external assembler, if any.
    pub diagnostics: Vec<Diagnostic>,
}

impl InsertError {
    /// Create a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
            diagnostics: Vec::new(),
        }
    }

    /// Create an assembler error carrying its diagnostics.
    pub fn assembler(message: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::new(ErrorCode::AssemblerError, message)
        }
    }

    /// Add a hint to this error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Get the error code string.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }
}

impl From<io::Error> for InsertError {
    fn from(err: io::Error) -> Self {
        InsertError::new(ErrorCode::IoFailure, err.to_string())
    }
}

/// Result type for Spriteweave operations.
pub type Result<T> = std::result::Result<T, InsertError>;

/// Format an error for the console, including assembler diagnostics.
pub fn format_error(error: &InsertError) -> String {
    let mut output = String::new();

    output.push_str(&format!("error[{}]: {}\n", error.code_str(), error.message));

    for diagnostic in &error.diagnostics {
        output.push_str(&format!("  --> {}\n", diagnostic));
    }

    if let Some(hint) = &error.hint {
        output.push_str(&format!("  = hint: {}\n", hint));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(ErrorCode::MalformedSourceDescriptor.code(), "E001");
        assert_eq!(ErrorCode::ArenaExhausted.code(), "E100");
        assert_eq!(ErrorCode::MalformedRecord.code(), "E200");
        assert_eq!(ErrorCode::IoFailure.code(), "E900");
    }

    #[test]
    fn test_display_includes_code() {
        let error = InsertError::new(ErrorCode::DuplicateSlot, "Sprite number already used");
        assert_eq!(error.to_string(), "[E002] Sprite number already used");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = io::Error::new(io::ErrorKind::NotFound, "rom.smc");
        let error: InsertError = io.into();
        assert_eq!(error.code, ErrorCode::IoFailure);
        assert!(error.message.contains("rom.smc"));
    }

    #[test]
    fn test_format_error_with_diagnostics() {
        let error = InsertError::assembler(
            "Failed to assemble sprites/goomba.asm",
            vec![Diagnostic::new("undefined label 'Foo'").at("goomba.asm", 12)],
        )
        .with_hint("check the sprite source");

        let formatted = format_error(&error);
        assert!(formatted.starts_with("error[E020]: Failed to assemble"));
        assert!(formatted.contains("goomba.asm:12: undefined label 'Foo'"));
        assert!(formatted.contains("= hint: check the sprite source"));
    }
}
