//! Cursor store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{CursorStore, LocalStorage};
use crate::error::Result;
use crate::models::validate_cursor_name;

/// On-disk cursor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CursorDocument {
    value: DateTime<Utc>,
}

/// Cursor persisted as `cursors/<name>.json` in local storage.
#[derive(Debug, Clone)]
pub struct FileCursor {
    storage: LocalStorage,
    name: String,
}

impl FileCursor {
    pub fn new(storage: LocalStorage, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    /// Like [`FileCursor::new`], rejecting names that are not plain file names.
    pub fn try_new(storage: LocalStorage, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_cursor_name(&name)?;
        Ok(Self::new(storage, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> String {
        format!("cursors/{}.json", self.name)
    }

    /// Forget the stored value so the next pass starts from the default.
    pub async fn reset(&self) -> Result<()> {
        log::info!("Resetting cursor '{}'", self.name);
        self.storage.remove(&self.key()).await
    }
}

#[async_trait]
impl CursorStore for FileCursor {
    async fn get(&self) -> Result<Option<DateTime<Utc>>> {
        let document: Option<CursorDocument> = self.storage.read_json(&self.key()).await?;
        Ok(document.map(|d| d.value))
    }

    async fn set(&self, value: DateTime<Utc>) -> Result<()> {
        self.storage
            .write_json(&self.key(), &CursorDocument { value })
            .await?;
        log::debug!("Cursor '{}' set to {}", self.name, value.to_rfc3339());
        Ok(())
    }
}

/// In-process cursor; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    value: Mutex<Option<DateTime<Utc>>>,
    writes: Mutex<Vec<DateTime<Utc>>>,
}

impl MemoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(value: DateTime<Utc>) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every value passed to `set`, in order.
    pub async fn writes(&self) -> Vec<DateTime<Utc>> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl CursorStore for MemoryCursor {
    async fn get(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.value.lock().await)
    }

    async fn set(&self, value: DateTime<Utc>) -> Result<()> {
        *self.value.lock().await = Some(value);
        self.writes.lock().await.push(value);
        Ok(())
    }
}
