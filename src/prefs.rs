//! Persisted theme preference.
//!
//! One boolean flag is stored under [`DARK_MODE_KEY`] as `"1"` or `"0"`.
//! A missing key means light mode.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key of the dark mode flag.
pub const DARK_MODE_KEY: &str = "darkMode";

/// Errors reading or writing preferences.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to access preferences file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid preferences file: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Reads the theme from the store.
pub fn load_theme(store: &dyn PreferenceStore) -> Theme {
    match store.get(DARK_MODE_KEY).as_deref() {
        Some("1") => Theme::Dark,
        _ => Theme::Light,
    }
}

/// Flips the dark mode flag and returns the new theme.
pub fn toggle_dark_mode(store: &mut dyn PreferenceStore) -> Result<Theme, PrefsError> {
    let theme = if load_theme(store).is_dark() {
        store.set(DARK_MODE_KEY, "0")?;
        Theme::Light
    } else {
        store.set(DARK_MODE_KEY, "1")?;
        Theme::Dark
    };
    tracing::info!(theme = theme.name(), "Theme changed");
    Ok(theme)
}

/// Preferences kept in a JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store, starting empty if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrefsError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store, used when no preferences file is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("midiviz-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_absent_means_light() {
        let store = MemoryStore::default();
        assert_eq!(load_theme(&store), Theme::Light);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut store = MemoryStore::default();
        store.set(DARK_MODE_KEY, "0").unwrap();

        assert_eq!(toggle_dark_mode(&mut store).unwrap(), Theme::Dark);
        assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("1"));
        assert_eq!(toggle_dark_mode(&mut store).unwrap(), Theme::Light);
        assert_eq!(store.get(DARK_MODE_KEY).as_deref(), Some("0"));
        assert_eq!(load_theme(&store), Theme::Light);
    }

    #[test]
    fn test_json_store_persists() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(load_theme(&store), Theme::Light);
        toggle_dark_mode(&mut store).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(load_theme(&reopened), Theme::Dark);
        assert_eq!(reopened.get(DARK_MODE_KEY).as_deref(), Some("1"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(PrefsError::Json(_))
        ));
        fs::remove_file(&path).unwrap();
    }
}
