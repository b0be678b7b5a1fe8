//! Key-value persistence for settings sections.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::Section;
use crate::Result;

/// Typed get/set over a key-value settings backend.
pub trait SettingsStore {
    /// Load a section, falling back to its default when nothing is stored.
    fn load<T: Section>(&self) -> Result<T>;

    /// Persist a section under its key.
    fn save<T: Section>(&self, value: &T) -> Result<()>;
}

/// One pretty-printed JSON file per section inside a settings directory.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    dir: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a section key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load<T: Section>(&self) -> Result<T> {
        let path = self.path_for(T::KEY);
        if !path.exists() {
            return Ok(T::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                tracing::debug!(key = T::KEY, path = %path.display(), "Loaded settings");
                Ok(value)
            }
            Err(error) => {
                tracing::warn!(
                    key = T::KEY,
                    path = %path.display(),
                    %error,
                    "Unreadable settings file, using defaults"
                );
                Ok(T::default())
            }
        }
    }

    fn save<T: Section>(&self, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(T::KEY);
        let serialized = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, serialized)?;
        tracing::debug!(key = T::KEY, path = %path.display(), "Saved settings");
        Ok(())
    }
}

/// In-memory store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load<T: Section>(&self) -> Result<T> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(T::KEY) {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(T::default()),
        }
    }

    fn save<T: Section>(&self, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(T::KEY, serialized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{PicListConfig, S3Config, UploadMethod, UploadMethodConfig};

    #[test]
    fn json_store_returns_defaults_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("settings"));

        let s3: S3Config = store.load().unwrap();
        assert_eq!(s3, S3Config::default());
        let piclist: PicListConfig = store.load().unwrap();
        assert_eq!(piclist.server_url, "http://127.0.0.1:36677");
    }

    #[test]
    fn json_store_roundtrip_writes_one_file_per_section() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path());

        let config = S3Config {
            endpoint: "https://s3.example.com".to_string(),
            bucket: "notes".to_string(),
            ..S3Config::default()
        };
        store.save(&config).unwrap();
        store
            .save(&UploadMethodConfig {
                upload_method: UploadMethod::PicList,
            })
            .unwrap();

        assert!(dir.path().join("s3-config.json").exists());
        assert!(dir.path().join("upload-method.json").exists());
        assert_eq!(store.load::<S3Config>().unwrap(), config);
        assert_eq!(
            store.load::<UploadMethodConfig>().unwrap().upload_method,
            UploadMethod::PicList
        );

        let raw = std::fs::read_to_string(dir.path().join("s3-config.json")).unwrap();
        assert!(raw.contains("\"endpoint\": \"https://s3.example.com\""));
    }

    #[test]
    fn json_store_falls_back_to_defaults_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s3-config.json"), "{not json").unwrap();
        let store = JsonFileSettingsStore::new(dir.path());

        assert_eq!(store.load::<S3Config>().unwrap(), S3Config::default());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load::<S3Config>().unwrap(), S3Config::default());

        let config = PicListConfig {
            api_key: "key".to_string(),
            ..PicListConfig::default()
        };
        store.save(&config).unwrap();
        assert_eq!(store.load::<PicListConfig>().unwrap(), config);
    }
}
