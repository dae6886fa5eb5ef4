use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::{ThemeMode, ThemePreferenceStore};
use crate::domain::ImageError;

const APP_CONFIG_DIR_NAME: &str = "pictor";
const PREFERENCES_FILE_NAME: &str = "preferences.json";
const THEME_KEY_DARK: &str = "dark";
const THEME_KEY_LIGHT: &str = "light";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

/// JSON preference file under the platform config directory. Unreadable or
/// malformed files behave like an absent preference.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn from_default_location() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: config_dir
                .join(APP_CONFIG_DIR_NAME)
                .join(PREFERENCES_FILE_NAME),
        }
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_file(&self) -> Option<PreferencesFile> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write_file(&self, preferences: &PreferencesFile) -> Result<(), ImageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                ImageError::internal(format!(
                    "could not create preference directory {}: {error}",
                    parent.display()
                ))
            })?;
        }

        let serialized = serde_json::to_string_pretty(preferences).map_err(|error| {
            ImageError::internal(format!("could not serialize preferences: {error}"))
        })?;
        fs::write(&self.path, serialized).map_err(|error| {
            ImageError::internal(format!(
                "could not write preference file {}: {error}",
                self.path.display()
            ))
        })
    }
}

impl ThemePreferenceStore for FilePreferenceStore {
    fn load_theme(&self) -> Option<ThemeMode> {
        match self.read_file()?.theme?.as_str() {
            THEME_KEY_DARK => Some(ThemeMode::Dark),
            THEME_KEY_LIGHT => Some(ThemeMode::Light),
            _ => None,
        }
    }

    fn store_theme(&self, mode: ThemeMode) -> Result<(), ImageError> {
        let mut preferences = self.read_file().unwrap_or_default();
        preferences.theme = Some(
            match mode {
                ThemeMode::Dark => THEME_KEY_DARK,
                ThemeMode::Light => THEME_KEY_LIGHT,
            }
            .to_string(),
        );
        self.write_file(&preferences)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::app::{ThemeMode, ThemePreferenceStore};

    use super::FilePreferenceStore;

    #[test]
    fn load_theme_returns_none_without_a_preference_file() {
        let dir = tempdir().expect("temp dir should be created");
        let store = FilePreferenceStore::at_path(dir.path().join("preferences.json"));

        assert_eq!(store.load_theme(), None);
    }

    #[test]
    fn store_theme_round_trips_through_the_file() {
        let dir = tempdir().expect("temp dir should be created");
        let store = FilePreferenceStore::at_path(dir.path().join("preferences.json"));

        store
            .store_theme(ThemeMode::Dark)
            .expect("store should succeed");
        assert_eq!(store.load_theme(), Some(ThemeMode::Dark));

        store
            .store_theme(ThemeMode::Light)
            .expect("store should succeed");
        assert_eq!(store.load_theme(), Some(ThemeMode::Light));
    }

    #[test]
    fn store_theme_creates_missing_parent_directories() {
        let dir = tempdir().expect("temp dir should be created");
        let store = FilePreferenceStore::at_path(dir.path().join("nested").join("prefs.json"));

        store
            .store_theme(ThemeMode::Dark)
            .expect("store should create parents and succeed");
        assert_eq!(store.load_theme(), Some(ThemeMode::Dark));
    }

    #[test]
    fn persisted_value_uses_the_documented_key_and_values() {
        let dir = tempdir().expect("temp dir should be created");
        let path = dir.path().join("preferences.json");
        let store = FilePreferenceStore::at_path(path.clone());

        store
            .store_theme(ThemeMode::Dark)
            .expect("store should succeed");

        let raw = fs::read_to_string(&path).expect("preference file should exist");
        let parsed: serde_json::Value =
            serde_json::from_str(&raw).expect("preference file should be JSON");
        assert_eq!(parsed["theme"], "dark");
    }

    #[test]
    fn malformed_preference_files_behave_like_absent_preferences() {
        let dir = tempdir().expect("temp dir should be created");
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").expect("fixture write should succeed");

        let store = FilePreferenceStore::at_path(path);
        assert_eq!(store.load_theme(), None);
    }

    #[test]
    fn unknown_theme_values_behave_like_absent_preferences() {
        let dir = tempdir().expect("temp dir should be created");
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{"theme":"solarized"}"#).expect("fixture write should succeed");

        let store = FilePreferenceStore::at_path(path);
        assert_eq!(store.load_theme(), None);
    }
}
