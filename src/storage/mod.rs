//! Durable state for the crawler.
//!
//! The only state the pass itself owns is the cursor: one UTC instant per
//! logical stream meaning "everything at or before this has been processed".
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml              # Crawler configuration
//! ├── cursors/
//! │   └── catalog.json         # {"value": "2024-03-01T12:00:00Z"}
//! └── packages/                # PackageStore records
//!     └── newtonsoft.json/
//!         └── 12.0.3.json
//! ```

pub mod cursor;
pub mod local;
pub mod packages;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

// Re-export for convenience
pub use cursor::{FileCursor, MemoryCursor};
pub use local::LocalStorage;
pub use packages::{PackageRecord, PackageStore};

/// Durable resume point for one logical stream.
///
/// Writers are expected to be single: only the catalog processor calls `set`,
/// always with non-decreasing values.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Stored value, or `None` when the stream has never committed.
    async fn get(&self) -> Result<Option<DateTime<Utc>>>;

    /// Overwrite the stored value.
    async fn set(&self, value: DateTime<Utc>) -> Result<()>;
}
