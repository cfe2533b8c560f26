// src/services/leaf_processor.rs

//! Per-kind consumers of catalog leaves.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CatalogItem, LeafItem};

/// Side-effecting consumer the catalog processor dispatches into.
///
/// A call returns `Ok` only once its effects are durable. The same leaf may
/// be delivered again after a crash between processing and the cursor write,
/// so implementations must be idempotent (upsert by package identity).
#[async_trait]
pub trait LeafProcessor: Send + Sync {
    async fn process_package_details(&self, leaf: &LeafItem) -> Result<()>;

    async fn process_package_delete(&self, leaf: &LeafItem) -> Result<()>;
}

/// Processor that only logs what it sees.
#[derive(Debug, Default)]
pub struct LoggingLeafProcessor {
    details: AtomicUsize,
    deletes: AtomicUsize,
}

impl LoggingLeafProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// (details, deletes) seen so far.
    pub fn counts(&self) -> (usize, usize) {
        (
            self.details.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl LeafProcessor for LoggingLeafProcessor {
    async fn process_package_details(&self, leaf: &LeafItem) -> Result<()> {
        self.details.fetch_add(1, Ordering::Relaxed);
        match leaf.as_details() {
            Some(details) => log::info!(
                "[{}] {} details (listed: {}, prerelease: {})",
                leaf.commit_timestamp().to_rfc3339(),
                leaf.identity(),
                details.is_listed(),
                details.is_prerelease
            ),
            None => log::info!(
                "[{}] {} details",
                leaf.commit_timestamp().to_rfc3339(),
                leaf.identity()
            ),
        }
        Ok(())
    }

    async fn process_package_delete(&self, leaf: &LeafItem) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "[{}] {} deleted",
            leaf.commit_timestamp().to_rfc3339(),
            leaf.identity()
        );
        Ok(())
    }
}
