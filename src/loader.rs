//! File loading shared by drag-and-drop, paste and the file picker.
//!
//! Every input surface funnels into [`load_file`], which dispatches on the
//! file extension. Unrecognized files are ignored.

use crate::audio::EngineError;
use crate::midi::MidiImportError;
use std::path::Path;
use thiserror::Error;

/// Extensions accepted as MIDI files.
pub const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];
/// Extensions accepted as SoundFonts.
pub const SOUNDFONT_EXTENSIONS: [&str; 2] = ["sf2", "sf3"];

/// Errors raised while loading a dropped or picked file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Midi(#[from] MidiImportError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What a file will be loaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Midi,
    SoundFont,
}

impl FileKind {
    /// Classifies a path by extension, case-insensitively.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if MIDI_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Midi)
        } else if SOUNDFONT_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::SoundFont)
        } else {
            None
        }
    }
}

/// Something files can be loaded into.
pub trait FileTarget {
    /// Stops playback and loads a MIDI file into the player.
    fn load_midi(&mut self, path: &Path) -> Result<(), LoadError>;

    /// Loads an additional SoundFont into the synthesizer.
    fn load_soundfont(&mut self, path: &Path) -> Result<(), LoadError>;
}

/// Loads `path` into `target` according to its extension.
///
/// # Returns
///
/// The kind of file that was loaded, or `None` if it was ignored
pub fn load_file<T: FileTarget + ?Sized>(
    target: &mut T,
    path: &Path,
) -> Result<Option<FileKind>, LoadError> {
    let Some(kind) = FileKind::detect(path) else {
        tracing::debug!(?path, "Ignoring file with unsupported extension");
        return Ok(None);
    };
    match kind {
        FileKind::Midi => target.load_midi(path)?,
        FileKind::SoundFont => target.load_soundfont(path)?,
    }
    Ok(Some(kind))
}

/// Splits pasted or dropped text into file paths.
///
/// Terminals deliver drops as pasted text: one or more paths separated by
/// newlines, optionally quoted, with spaces escaped by backslashes or
/// encoded as `file://` URLs.
pub fn paths_from_paste(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = line
                .strip_prefix('\'')
                .and_then(|l| l.strip_suffix('\''))
                .or_else(|| line.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
                .unwrap_or(line);
            let line = line.strip_prefix("file://").unwrap_or(line);
            line.replace("\\ ", " ").replace("%20", " ")
        })
        .collect()
}
