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

//! Spriteweave Library
//!
//! This library provides all the components needed to insert custom sprites
//! into Super Mario World ROM images and to keep level sprite data consistent
//! afterwards.
//!
//! # Modules
//!
//! - [`error`] - Error types and error reporting
//! - [`rom`] - ROM images, address mapping and pointers
//! - [`descriptor`] - Sprite list, CFG and JSON parsing
//! - [`sprite`] - Sprite slots and lists
//! - [`assembler`] - The external assembler boundary
//! - [`pipeline`] - Staged insertion and patch text
//! - [`arena`] - Per-level table allocation
//! - [`tiles`] - Map16 tile pool
//! - [`tables`] - Binary table encoding
//! - [`remap`] - Level sprite data remapping
//! - [`output`] - Table files and Lunar Magic companions
//!
//! # Example
//!
//! ```no_run
//! use spriteweave::assembler::{find_asar, AsarProcess};
//! use spriteweave::{run, ToolOptions, ToolPaths};
//!
//! let paths = ToolPaths::new("hack.smc", ".");
//! let mut asar = AsarProcess::new(find_asar().unwrap(), paths.asm_dir.clone());
//! match run(&ToolOptions::default(), &paths, &mut asar) {
//!     Ok(report) => println!("Inserted {} sprite(s)", report.slots),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod arena;
pub mod assembler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod remap;
pub mod rom;
pub mod sprite;
pub mod tables;
pub mod tiles;
mod tool;

// Re-export commonly used types
pub use config::{ToolOptions, ToolPaths};
pub use error::{format_error, ErrorCode, InsertError, Result};
pub use rom::{Pointer, Rom};
pub use tool::{run, RunError, RunReport, MAIN_PATCHES};

/// The version of Spriteweave.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the tool.
pub const NAME: &str = "Spriteweave";

/// Version stamped into the ROM and checked against `VERG` prints.
pub const TOOL_VERSION: u8 = 0x32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "Spriteweave");
    }
}
