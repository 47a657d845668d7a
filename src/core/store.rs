use crate::core::normalizer::normalize;
use crate::domain::model::{ConfigState, ImportPrefs};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde_json::Value;

pub const STATE_KEY: &str = "pestes-config.v1.json";
pub const PREFS_KEY: &str = "pestes-config.prefs.v1.json";

/// Persists the state blob and the import preferences blob.
pub struct StateStore<S: Storage> {
    storage: S,
}

impl<S: Storage> StateStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Missing or corrupt blobs fall back to the default state.
    /// Only storage failures are errors.
    pub async fn load_state(&self) -> Result<ConfigState> {
        let Some(bytes) = self.storage.read_file(STATE_KEY).await? else {
            tracing::debug!("No saved state, starting from defaults");
            return Ok(ConfigState::default());
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(raw) => Ok(normalize(&raw)),
            Err(e) => {
                tracing::warn!("Saved state is not valid JSON ({}), using defaults", e);
                Ok(ConfigState::default())
            }
        }
    }

    /// Overwrites the whole blob.
    pub async fn save_state(&self, state: &ConfigState) -> Result<()> {
        let data = serde_json::to_vec(state)?;
        self.storage.write_file(STATE_KEY, &data).await?;
        tracing::debug!("Saved state ({} bytes)", data.len());
        Ok(())
    }

    pub async fn load_prefs(&self) -> Result<ImportPrefs> {
        let defaults = ImportPrefs::default();
        let Some(bytes) = self.storage.read_file(PREFS_KEY).await? else {
            return Ok(defaults);
        };

        let raw: Value = match serde_json::from_slice(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Saved import preferences are corrupt ({}), using defaults", e);
                return Ok(defaults);
            }
        };

        let pick = |key: &str, fallback: String| {
            raw.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };

        Ok(ImportPrefs {
            services: pick("services", defaults.services.clone()),
            categories: pick("categories", defaults.categories.clone()),
        })
    }

    pub async fn save_prefs(&self, prefs: &ImportPrefs) -> Result<()> {
        let data = serde_json::to_vec(prefs)?;
        self.storage.write_file(PREFS_KEY, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Category, DEFAULT_SERVICES_URL};
    use crate::utils::error::CatalogError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_reads: bool,
    }

    impl MockStorage {
        async fn put(&self, key: &str, data: &str) {
            self.files.lock().await.insert(key.to_string(), data.as_bytes().to_vec());
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if self.fail_reads {
                return Err(CatalogError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("Cannot read: {}", key),
                )));
            }
            Ok(self.files.lock().await.get(key).cloned())
        }

        async fn write_file(&self, key: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(key.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_state_defaults_when_missing() {
        let store = StateStore::new(MockStorage::default());
        assert_eq!(store.load_state().await.unwrap(), ConfigState::default());
    }

    #[tokio::test]
    async fn test_load_state_defaults_when_corrupt() {
        let storage = MockStorage::default();
        storage.put(STATE_KEY, "{ this is not json").await;
        let store = StateStore::new(storage);
        assert_eq!(store.load_state().await.unwrap(), ConfigState::default());
    }

    #[tokio::test]
    async fn test_load_state_normalizes_blob() {
        let storage = MockStorage::default();
        storage
            .put(STATE_KEY, r#"{"primaries": [{"id": "Uusi Tab", "label": "Uusi", "order": "4"}]}"#)
            .await;
        let store = StateStore::new(storage);
        let state = store.load_state().await.unwrap();
        assert_eq!(state.primaries, vec![Category::new("uusi_tab", "Uusi", 4)]);
    }

    #[tokio::test]
    async fn test_save_then_load_state() {
        let store = StateStore::new(MockStorage::default());
        let mut state = ConfigState::default();
        state.primaries.pop();
        store.save_state(&state).await.unwrap();
        assert_eq!(store.load_state().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let store = StateStore::new(MockStorage {
            fail_reads: true,
            ..MockStorage::default()
        });
        assert!(store.load_state().await.is_err());
    }

    #[tokio::test]
    async fn test_prefs_fall_back_per_field() {
        let storage = MockStorage::default();
        storage
            .put(PREFS_KEY, r#"{"services": "", "categories": "https://example.com/c.csv"}"#)
            .await;
        let store = StateStore::new(storage);
        let prefs = store.load_prefs().await.unwrap();
        assert_eq!(prefs.services, DEFAULT_SERVICES_URL);
        assert_eq!(prefs.categories, "https://example.com/c.csv");
    }

    #[tokio::test]
    async fn test_prefs_round_trip() {
        let store = StateStore::new(MockStorage::default());
        let prefs = ImportPrefs {
            services: "https://example.com/s.csv".to_string(),
            categories: "https://example.com/c.csv".to_string(),
        };
        store.save_prefs(&prefs).await.unwrap();
        assert_eq!(store.load_prefs().await.unwrap(), prefs);
    }
}
