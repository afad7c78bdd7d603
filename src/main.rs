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

//! Spriteweave CLI
//!
//! Inserts custom sprites into a Super Mario World ROM.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use spriteweave::assembler::{find_asar, AsarProcess};
use spriteweave::{format_error, run, RunError, ToolOptions, ToolPaths};

/// Spriteweave - Custom sprite insertion for SNES ROM images
#[derive(Parser, Debug)]
#[command(name = "spriteweave")]
#[command(version)]
#[command(about = "Inserts custom sprites into Super Mario World ROM images")]
#[command(long_about = r#"
Spriteweave assembles the sprites named in a list file with asar and
inserts them, together with their tables, into a Super Mario World ROM.
If the number of extra bytes of any sprite changed, the sprite data of
every level is remapped to the new sizes afterwards.

Paths default to the directory the executable lives in.

Example usage:
  spriteweave hack.smc
  spriteweave hack.smc -l mylist.txt --per-level
  spriteweave hack.smc --no-remap -k
"#)]
struct Cli {
    /// ROM to insert the sprites into
    rom: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Keep generated patches and tables
    #[arg(short, long)]
    keep_temp: bool,

    /// Enable per-level sprites (B0-BF)
    #[arg(long, visible_alias = "pl")]
    per_level: bool,

    /// Disable the 255 sprites per level support
    #[arg(long = "disable-255-per-level", visible_alias = "d255spl")]
    disable_255_per_level: bool,

    /// Base directory of the default paths
    #[arg(long)]
    tool_dir: Option<PathBuf>,

    /// Sprite list file
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Directory with main.asm and the other main patches
    #[arg(short, long)]
    asm_dir: Option<PathBuf>,

    /// Directory of normal sprites
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Directory of shooters
    #[arg(long)]
    shooters: Option<PathBuf>,

    /// Directory of generators
    #[arg(long)]
    generators: Option<PathBuf>,

    /// Directory of extended sprites
    #[arg(long)]
    extended: Option<PathBuf>,

    /// Directory of cluster sprites
    #[arg(long)]
    cluster: Option<PathBuf>,

    /// Directory of shared routines
    #[arg(long)]
    routines: Option<PathBuf>,

    /// ssc file merged into <rom>.ssc
    #[arg(long)]
    ssc: Option<PathBuf>,

    /// mwt file merged into <rom>.mwt
    #[arg(long)]
    mwt: Option<PathBuf>,

    /// mw2 file merged into <rom>.mw2, ending with 0xFF
    #[arg(long)]
    mw2: Option<PathBuf>,

    /// Base s16 file for <rom>.s16
    #[arg(long)]
    s16: Option<PathBuf>,

    /// Do not log the run in <rom>.extmod
    #[arg(long)]
    no_extmod: bool,

    /// Skip sprite data remapping
    #[arg(long)]
    no_remap: bool,

    /// Remap sprite data even if no extra byte count changed
    #[arg(long, conflicts_with = "no_remap")]
    always_remap: bool,

    /// Path to the asar binary (auto-detected if not specified)
    #[arg(long)]
    assembler: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> ToolOptions {
        ToolOptions {
            debug: self.debug,
            keep_temp: self.keep_temp,
            per_level: self.per_level,
            disable_255_per_level: self.disable_255_per_level,
            ext_mod: !self.no_extmod,
            remap: !self.no_remap,
            always_remap: self.always_remap,
        }
    }

    fn paths(&self) -> ToolPaths {
        let root = self.tool_dir.clone().unwrap_or_else(default_tool_dir);
        let mut paths = ToolPaths::new(&self.rom, root);
        let overrides = [
            (&self.list, &mut paths.list),
            (&self.asm_dir, &mut paths.asm_dir),
            (&self.routines, &mut paths.routines),
            (&self.sprites, &mut paths.sources.sprites),
            (&self.shooters, &mut paths.sources.shooters),
            (&self.generators, &mut paths.sources.generators),
            (&self.extended, &mut paths.sources.extended),
            (&self.cluster, &mut paths.sources.cluster),
        ];
        for (arg, path) in overrides {
            if let Some(arg) = arg {
                *path = arg.clone();
            }
        }
        paths.ssc = self.ssc.clone();
        paths.mwt = self.mwt.clone();
        paths.mw2 = self.mw2.clone();
        paths.s16 = self.s16.clone();
        paths
    }
}

fn default_tool_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let options = cli.options();
    let paths = cli.paths();

    let asar = match cli.assembler.clone().or_else(find_asar) {
        Some(path) => path,
        None => {
            eprintln!("Error: asar not found.");
            eprintln!();
            eprintln!("Install asar or specify the path with --assembler:");
            eprintln!("  Manual:  --assembler /path/to/asar");
            return ExitCode::from(3);
        }
    };
    let mut assembler = AsarProcess::new(asar, paths.asm_dir.clone()).keep_temp(options.keep_temp);

    match run(&options, &paths, &mut assembler) {
        Ok(report) => {
            println!(
                "Inserted {} sprite(s) into {} ({} assembled, {} level(s) remapped)",
                report.slots,
                paths.rom.display(),
                report.assembled,
                report.remapped
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprint!("{}", format_error(e.error()));
            if let RunError::Remap(_) = e {
                eprintln!("Sprite data was not remapped; the ROM keeps the inserted sprites.");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
