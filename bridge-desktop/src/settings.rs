//! Settings Storage backed by a JSON file

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const SETTINGS_FILE_NAME: &str = "settings.json";
const APP_DIR_NAME: &str = "alexandria";

/// JSON-file settings store
///
/// Keeps the full map in memory and rewrites the file on every mutation:
/// - Values survive restarts
/// - Writes go to a sibling temp file and are renamed into place
/// - A missing file is an empty store
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileSettingsStore {
    /// Open (or lazily create) a settings file at the given path
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let values = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        debug!(path = ?path, keys = values.len(), "Opened settings store");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store in the platform config directory
    /// (e.g. `~/.config/alexandria/settings.json`)
    pub async fn open_default() -> Result<Self> {
        let dir = dirs::config_dir().ok_or_else(|| {
            BridgeError::NotAvailable("No configuration directory on this platform".to_string())
        })?;
        Self::open(dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME)).await
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(BridgeError::Io)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| {
                warn!(path = ?self.path, error = %e, "Failed to replace settings file");
                BridgeError::Io(e)
            })?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().await;
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        values.insert(key.to_string(), value.to_string());
        self.persist(&values).await?;

        debug!(key = key, "Stored setting");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
            debug!(key = key, "Deleted setting");
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values.lock().await.keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut values = self.values.lock().await;
        values.clear();
        self.persist(&values).await?;

        debug!("Cleared all settings");
        Ok(())
    }
}

/// Process-local settings store, used by tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with initial values
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values.lock().await.keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.values.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("alexandria-settings-{}", uuid::Uuid::new_v4()))
            .join(SETTINGS_FILE_NAME)
    }

    #[tokio::test]
    async fn test_string_operations() {
        let store = JsonFileSettingsStore::open(temp_settings_path()).await.unwrap();

        store.set_string("sort", "author").await.unwrap();
        assert_eq!(
            store.get_string("sort").await.unwrap(),
            Some("author".to_string())
        );

        store.delete("sort").await.unwrap();
        assert_eq!(store.get_string("sort").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let path = temp_settings_path();
        {
            let store = JsonFileSettingsStore::open(path.clone()).await.unwrap();
            store.set_string("sortDirection", "descending").await.unwrap();
            store.set_string("readStatusFilter", "reading").await.unwrap();
        }

        let reopened = JsonFileSettingsStore::open(path.clone()).await.unwrap();
        assert_eq!(
            reopened.get_string("sortDirection").await.unwrap(),
            Some("descending".to_string())
        );
        let mut keys = reopened.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["readStatusFilter", "sortDirection"]);

        reopened.clear_all().await.unwrap();
        assert!(reopened.list_keys().await.unwrap().is_empty());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = temp_settings_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = JsonFileSettingsStore::open(path.clone()).await;
        assert!(matches!(result, Err(BridgeError::Serialization(_))));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_memory_store_seeded_values() {
        let store = MemorySettingsStore::with_values([("sort", "rating")]);
        assert_eq!(
            store.get_string("sort").await.unwrap(),
            Some("rating".to_string())
        );
        assert!(store.has_key("sort").await.unwrap());
        assert!(!store.has_key("sortDirection").await.unwrap());
    }
}
