//! SoundFont bookkeeping.
//!
//! Several SoundFonts can be loaded at once. The table maps every
//! (program, bank) pair to the index of the most recently loaded SoundFont
//! that provides it, so a program change can be routed to the right
//! synthesizer or trigger a lazy load of the missing bank.

use crate::midi::DRUM_BANK;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File extensions tried, in order, when fetching a bank lazily.
const BANK_EXTENSIONS: [&str; 2] = ["sf2", "sf3"];

/// A preset exposed by a loaded SoundFont.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetInfo {
    pub program: u8,
    pub bank: u16,
    pub name: String,
}

/// Program × bank → loaded SoundFont index lookup.
#[derive(Debug, Clone, Default)]
pub struct SoundFontTable {
    entries: HashMap<(u8, u16), usize>,
    names: HashMap<(u8, u16), String>,
}

impl SoundFontTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the presets of the SoundFont loaded at `index`.
    /// Later registrations replace earlier ones for the same pair.
    pub fn register(&mut self, index: usize, presets: &[PresetInfo]) {
        for preset in presets {
            let key = (preset.program, preset.bank);
            self.entries.insert(key, index);
            self.names.insert(key, preset.name.clone());
        }
    }

    /// Returns the SoundFont index providing a program in a bank.
    pub fn lookup(&self, program: u8, bank: u16) -> Option<usize> {
        self.entries.get(&(program, bank)).copied()
    }

    /// Returns the preset name for a program in a bank, if loaded.
    pub fn instrument_name(&self, program: u8, bank: u16) -> Option<&str> {
        self.names.get(&(program, bank)).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Base file name of the lazily fetched bank for a program.
///
/// Percussion lives in a single `128` file; melodic programs are one file
/// per program, zero-padded to three digits.
pub fn bank_file_stem(program: u8, bank: u16) -> String {
    if bank == DRUM_BANK {
        DRUM_BANK.to_string()
    } else {
        format!("{:03}", program)
    }
}

/// Candidate paths for a lazily fetched bank, in preference order.
pub fn bank_candidates(dir: &Path, program: u8, bank: u16) -> Vec<PathBuf> {
    let stem = bank_file_stem(program, bank);
    BANK_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .collect()
}

/// Returns the first candidate bank file that exists on disk.
pub fn find_bank_file(dir: &Path, program: u8, bank: u16) -> Option<PathBuf> {
    bank_candidates(dir, program, bank)
        .into_iter()
        .find(|p| p.is_file())
}
