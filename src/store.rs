use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use crate::models::RateWindow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// Stored api key + rate window. Only the rate limiter writes the window
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn load_window(&self) -> Result<Option<RateWindow>, StoreError>;

    async fn save_window(&self, window: RateWindow) -> Result<(), StoreError>;

    async fn load_api_key(&self) -> Result<Option<String>, StoreError>;

    async fn save_api_key(&self, api_key: &str) -> Result<(), StoreError>;
}

// On-disk layout, same keys the settings page reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateWindow>,
}

// In-process store; state is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedState> {
        // a poisoned guard still holds consistent plain data
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn load_window(&self) -> Result<Option<RateWindow>, StoreError> {
        Ok(self.lock().rate_limit)
    }

    async fn save_window(&self, window: RateWindow) -> Result<(), StoreError> {
        self.lock().rate_limit = Some(window);
        Ok(())
    }

    async fn load_api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock().gemini_api_key.clone())
    }

    async fn save_api_key(&self, api_key: &str) -> Result<(), StoreError> {
        self.lock().gemini_api_key = Some(api_key.to_string());
        Ok(())
    }
}

// Single JSON document on disk. Writes go to a sibling temp file and are
// renamed into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes this process's read-modify-write of the file
    write_lock: AsyncMutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_state(&self) -> Result<PersistedState, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(PersistedState::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut PersistedState) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut state = self.read_state().await?;
        apply(&mut state);

        let json = serde_json::to_vec_pretty(&state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for JsonFileStore {
    async fn load_window(&self) -> Result<Option<RateWindow>, StoreError> {
        Ok(self.read_state().await?.rate_limit)
    }

    async fn save_window(&self, window: RateWindow) -> Result<(), StoreError> {
        self.update(|state| state.rate_limit = Some(window)).await
    }

    async fn load_api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read_state().await?.gemini_api_key)
    }

    async fn save_api_key(&self, api_key: &str) -> Result<(), StoreError> {
        let api_key = api_key.to_string();
        self.update(move |state| state.gemini_api_key = Some(api_key)).await
    }
}
