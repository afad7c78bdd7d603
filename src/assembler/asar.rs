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

//! Asar detection and invocation as a child process.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use super::{Assembler, Diagnostic, Patch, PatchSource, Symbol};

/// Asar binary names to search for, in order of preference.
const ASAR_BINARIES: &[&str] = &["asar", "asar-standalone"];

/// Lines asar prints on its own that are not patch prints.
const ASAR_CHATTER: &[&str] = &["Assembling completed without problems."];

/// Find asar on the system.
///
/// Searches the system PATH and returns the first binary found.
///
/// # Example
///
/// ```no_run
/// use spriteweave::assembler::find_asar;
///
/// if let Some(asar) = find_asar() {
///     println!("Found asar: {}", asar.display());
/// }
/// ```
pub fn find_asar() -> Option<PathBuf> {
    for binary in ASAR_BINARIES {
        if let Ok(path) = which::which(binary) {
            return Some(path);
        }
    }
    None
}

/// Runs an external asar binary for every patch.
///
/// Generated patches and their binaries are written into the work
/// directory, so relative `incsrc` and `incbin` paths resolve against it.
/// The image is passed through a temporary ROM file in the same directory.
#[derive(Debug, Clone)]
pub struct AsarProcess {
    /// Path to the asar binary.
    asar_path: PathBuf,
    /// Directory generated patches are written to.
    work_dir: PathBuf,
    /// Keep generated patch files after use.
    keep_temp: bool,
}

impl AsarProcess {
    /// Create a new runner.
    ///
    /// # Arguments
    ///
    /// * `asar_path` - Path to the asar binary
    /// * `work_dir` - Directory for generated patches (usually the asm directory)
    pub fn new(asar_path: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            asar_path,
            work_dir,
            keep_temp: false,
        }
    }

    /// Keep generated patch files after applying them.
    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Get the asar binary path.
    pub fn asar_path(&self) -> &Path {
        &self.asar_path
    }

    /// Get the work directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Write generated files for a patch and return the patch path.
    fn materialize(&self, patch: &Patch) -> std::io::Result<(PathBuf, Vec<PathBuf>)> {
        let mut written = Vec::new();
        for (name, data) in &patch.binaries {
            let path = self.work_dir.join(name);
            fs::write(&path, data)?;
            written.push(path);
        }
        let patch_path = match &patch.source {
            PatchSource::Text(text) => {
                let path = self.work_dir.join(&patch.name);
                fs::write(&path, text)?;
                written.push(path.clone());
                path
            }
            PatchSource::File(path) => path.clone(),
        };
        Ok((patch_path, written))
    }

    fn cleanup(&self, written: &[PathBuf]) {
        if self.keep_temp {
            return;
        }
        for path in written {
            let _ = fs::remove_file(path);
        }
    }

    fn run(&self, patch_path: &Path, image: &mut Vec<u8>) -> Result<Vec<Symbol>, Vec<Diagnostic>> {
        let io_failure = |what: &str, e: std::io::Error| vec![Diagnostic::new(format!("{}: {}", what, e))];

        let mut rom = tempfile::Builder::new()
            .prefix("spriteweave-")
            .suffix(".smc")
            .tempfile_in(&self.work_dir)
            .map_err(|e| io_failure("Cannot create temporary ROM", e))?;
        rom.write_all(image)
            .and_then(|_| rom.flush())
            .map_err(|e| io_failure("Cannot write temporary ROM", e))?;

        debug!("Running {} on {}", self.asar_path.display(), patch_path.display());

        let output = Command::new(&self.asar_path)
            .arg("--no-title-check")
            .arg(patch_path)
            .arg(rom.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| io_failure("Failed to run asar", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let mut diagnostics = parse_diagnostics(&stderr);
            if diagnostics.is_empty() {
                diagnostics.push(Diagnostic::new(format!(
                    "asar exited with {} while applying {}",
                    output.status,
                    patch_path.display()
                )));
            }
            return Err(diagnostics);
        }

        *image = fs::read(rom.path()).map_err(|e| io_failure("Cannot read patched ROM", e))?;
        Ok(parse_prints(&stdout))
    }
}

impl Assembler for AsarProcess {
    fn apply(&mut self, patch: &Patch, image: &mut Vec<u8>) -> Result<Vec<Symbol>, Vec<Diagnostic>> {
        let (patch_path, written) = self
            .materialize(patch)
            .map_err(|e| vec![Diagnostic::new(format!("Cannot write {}: {}", patch.name, e))])?;
        let result = self.run(&patch_path, image);
        self.cleanup(&written);
        result
    }
}

/// Turn asar's standard output into symbols.
pub(crate) fn parse_prints(stdout: &str) -> Vec<Symbol> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !ASAR_CHATTER.contains(line))
        .map(Symbol::parse)
        .collect()
}

/// Turn asar's error output into diagnostics.
pub(crate) fn parse_diagnostics(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Diagnostic::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prints_skips_chatter() {
        let symbols = parse_prints("INIT $128000\n\nMAIN $128010\nAssembling completed without problems.\n");
        assert_eq!(
            symbols,
            vec![
                Symbol::new("INIT", Some(0x12_8000)),
                Symbol::new("MAIN", Some(0x12_8010)),
            ]
        );
    }

    #[test]
    fn test_parse_diagnostics() {
        let diags = parse_diagnostics("a.asm:3: error: (E5101): Unknown command.\n\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(3));
    }

    #[test]
    fn test_materialize_writes_text_and_binaries() {
        let dir = tempfile::tempdir().unwrap();
        let asar = AsarProcess::new(PathBuf::from("asar"), dir.path().to_path_buf());
        let patch = Patch::text("p.asm", "incbin d.bin").with_binary("d.bin", vec![1, 2]);

        let (path, written) = asar.materialize(&patch).unwrap();
        assert_eq!(path, dir.path().join("p.asm"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "incbin d.bin");
        assert_eq!(fs::read(dir.path().join("d.bin")).unwrap(), vec![1, 2]);

        asar.cleanup(&written);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    fn fake_asar(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-asar");
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_reads_back_image_and_prints() {
        let dir = tempfile::tempdir().unwrap();
        // $3 is the ROM path; overwrite its first byte
        let asar = fake_asar(
            dir.path(),
            "printf '\\252' | dd of=\"$3\" bs=1 count=1 conv=notrunc 2>/dev/null\necho 'MAIN $128000'",
        );
        let mut process = AsarProcess::new(asar, dir.path().to_path_buf());
        let mut image = vec![0u8; 0x8000];

        let symbols = process.apply(&Patch::text("t.asm", ""), &mut image).unwrap();
        assert_eq!(symbols, vec![Symbol::new("MAIN", Some(0x12_8000))]);
        assert_eq!(image[0], 0xAA);
        assert_eq!(image.len(), 0x8000);
        assert!(!dir.path().join("t.asm").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_failure_keeps_image() {
        let dir = tempfile::tempdir().unwrap();
        let asar = fake_asar(dir.path(), "echo 't.asm:1: error: broken' >&2\nexit 1");
        let mut process = AsarProcess::new(asar, dir.path().to_path_buf());
        let mut image = vec![0x55u8; 0x8000];

        let diags = process.apply(&Patch::text("t.asm", ""), &mut image).unwrap_err();
        assert_eq!(diags, vec![Diagnostic::new("broken").at("t.asm", 1)]);
        assert!(image.iter().all(|&b| b == 0x55));
    }
}
