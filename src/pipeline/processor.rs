// src/pipeline/processor.rs

//! Catalog processor.
//!
//! One pass walks the catalog from the stored cursor up to "now" (or a fixed
//! upper bound), dispatches every selected leaf to a [`LeafProcessor`] and
//! advances the cursor after each leaf that was processed successfully.
//!
//! ```text
//! Idle → FetchingIndex → SelectingPages
//!      → { FetchingPage → SelectingLeaves
//!          → { FetchingLeaf → Dispatching → Committing }* }*
//!      → Idle | Failed | Cancelled
//! ```
//!
//! Leaves sharing a commit timestamp are committed together: the cursor is
//! written once the first leaf with a later timestamp comes up, or when the
//! pass ends. A group may continue on the next page, so it stays pending
//! across page boundaries. A stored cursor never covers a timestamp with
//! unprocessed leaves left behind it.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::bounds::{select_leaves, select_pages};
use crate::error::{AppError, Result};
use crate::models::{CatalogItem, LeafItem, LeafKind, LeafRef, PageRef, ProcessorConfig};
use crate::services::{CatalogClient, LeafProcessor};
use crate::storage::CursorStore;

/// Where a pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    FetchingIndex,
    SelectingPages,
    FetchingPage,
    SelectingLeaves,
    FetchingLeaf,
    Dispatching,
    Committing,
    Failed,
    Cancelled,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub min_commit_timestamp: DateTime<Utc>,
    pub max_commit_timestamp: DateTime<Utc>,
    pub pages_selected: usize,
    pub pages_processed: usize,
    /// Leaves whose effects and cursor write both succeeded
    pub leaves_processed: usize,
    pub details_processed: usize,
    pub deletes_processed: usize,
    /// Cursor value when the pass ended
    pub cursor: Option<DateTime<Utc>>,
}

impl PassSummary {
    fn new(
        min: DateTime<Utc>,
        max: DateTime<Utc>,
        cursor: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            min_commit_timestamp: min,
            max_commit_timestamp: max,
            pages_selected: 0,
            pages_processed: 0,
            leaves_processed: 0,
            details_processed: 0,
            deletes_processed: 0,
            cursor,
        }
    }
}

/// How a pass ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassSummary),
    /// Shutdown was requested; the cursor holds its last committed value
    Cancelled(PassSummary),
}

impl PassOutcome {
    pub fn summary(&self) -> &PassSummary {
        match self {
            PassOutcome::Completed(summary) | PassOutcome::Cancelled(summary) => summary,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PassOutcome::Cancelled(_))
    }
}

/// Leaves dispatched but not yet covered by a cursor write. All of them share
/// `timestamp`.
#[derive(Debug, Default)]
struct Pending {
    timestamp: Option<DateTime<Utc>>,
    details: usize,
    deletes: usize,
}

/// Drives passes over the catalog for one cursor stream.
pub struct CatalogProcessor {
    client: Arc<dyn CatalogClient>,
    cursor: Arc<dyn CursorStore>,
    leaf_processor: Arc<dyn LeafProcessor>,
    settings: ProcessorConfig,
    shutdown: Option<watch::Receiver<bool>>,
    state: PassState,
}

impl CatalogProcessor {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        cursor: Arc<dyn CursorStore>,
        leaf_processor: Arc<dyn LeafProcessor>,
        settings: ProcessorConfig,
    ) -> Self {
        Self {
            client,
            cursor,
            leaf_processor,
            settings,
            shutdown: None,
            state: PassState::Idle,
        }
    }

    /// Stop cooperatively once the channel holds `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn settings(&self) -> &ProcessorConfig {
        &self.settings
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub(crate) fn shutdown_signal(&self) -> Option<watch::Receiver<bool>> {
        self.shutdown.clone()
    }

    fn transition(&mut self, next: PassState) {
        log::debug!("[{}] {} -> {}", self.settings.cursor_name, self.state, next);
        self.state = next;
    }

    /// Run a single pass.
    ///
    /// The first error aborts the pass and is returned as is; the cursor keeps
    /// the last value written before it. Nothing is retried here.
    pub async fn run_one_pass(&mut self) -> Result<PassOutcome> {
        self.state = PassState::Idle;
        match self.pass().await {
            Ok(outcome) => {
                let next = if outcome.is_cancelled() {
                    PassState::Cancelled
                } else {
                    PassState::Idle
                };
                self.transition(next);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(PassState::Failed);
                log::error!("[{}] Pass failed: {}", self.settings.cursor_name, e);
                Err(e)
            }
        }
    }

    async fn pass(&mut self) -> Result<PassOutcome> {
        let now = Utc::now();
        let stored = self.cursor.get().await?;
        let min = stored.unwrap_or_else(|| self.settings.initial_min_commit_timestamp(now));
        let max = self.settings.max_commit_timestamp.unwrap_or(now);
        let mut summary = PassSummary::new(min, max, stored);

        log::info!(
            "[{}] Processing commits in ({}, {}]",
            self.settings.cursor_name,
            min.to_rfc3339(),
            max.to_rfc3339()
        );

        if min >= max {
            log::info!("[{}] Window is empty", self.settings.cursor_name);
            return Ok(PassOutcome::Completed(summary));
        }
        if self.shutdown_requested() {
            return Ok(PassOutcome::Cancelled(summary));
        }

        self.transition(PassState::FetchingIndex);
        let index = self.client.get_index().await?;

        self.transition(PassState::SelectingPages);
        let pages = select_pages(&index, min, max);
        summary.pages_selected = pages.len();
        log::info!(
            "[{}] {} of {} pages selected",
            self.settings.cursor_name,
            pages.len(),
            index.items.len()
        );

        let mut pending = Pending::default();
        for page in &pages {
            if !self
                .process_page(page, min, max, &mut pending, &mut summary)
                .await?
            {
                return Ok(PassOutcome::Cancelled(summary));
            }
            summary.pages_processed += 1;
        }
        self.commit(&mut pending, &mut summary).await?;

        Ok(PassOutcome::Completed(summary))
    }

    /// Returns `false` when shutdown interrupted the page.
    async fn process_page(
        &mut self,
        page_ref: &PageRef,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
        pending: &mut Pending,
        summary: &mut PassSummary,
    ) -> Result<bool> {
        if self.shutdown_requested() {
            return Ok(false);
        }

        self.transition(PassState::FetchingPage);
        let page = self.client.get_page(&page_ref.url).await?;

        self.transition(PassState::SelectingLeaves);
        let leaves = select_leaves(&page, min, max, self.settings.exclude_redundant_leaves)?;
        log::info!(
            "[{}] Page {}: {} of {} leaves selected",
            self.settings.cursor_name,
            page_ref.url,
            leaves.len(),
            page.items.len()
        );

        for leaf in &leaves {
            if pending.timestamp != Some(leaf.commit_timestamp) {
                self.commit(pending, summary).await?;
            }
            if self.shutdown_requested() {
                return Ok(false);
            }

            let item = self.fetch_leaf(leaf).await?;

            self.transition(PassState::Dispatching);
            self.dispatch(leaf.kind, &item).await?;
            pending.timestamp = Some(leaf.commit_timestamp);
            match leaf.kind {
                LeafKind::PackageDetails => pending.details += 1,
                LeafKind::PackageDelete => pending.deletes += 1,
            }
        }

        Ok(true)
    }

    /// Write the cursor for the pending group, if any.
    async fn commit(&mut self, pending: &mut Pending, summary: &mut PassSummary) -> Result<()> {
        let Some(timestamp) = pending.timestamp else {
            return Ok(());
        };

        self.transition(PassState::Committing);
        self.cursor.set(timestamp).await?;
        summary.cursor = Some(timestamp);
        summary.details_processed += pending.details;
        summary.deletes_processed += pending.deletes;
        summary.leaves_processed += pending.details + pending.deletes;
        *pending = Pending::default();
        Ok(())
    }

    async fn fetch_leaf(&mut self, leaf: &LeafRef) -> Result<LeafItem> {
        let fetch = match leaf.kind {
            LeafKind::PackageDetails => self.settings.fetch_package_details,
            LeafKind::PackageDelete => self.settings.fetch_package_deletes,
        };
        if !fetch {
            return Ok(LeafItem::Summary(leaf.clone()));
        }

        self.transition(PassState::FetchingLeaf);
        let full = self.client.get_leaf(&leaf.url, leaf.kind).await?;
        Ok(full.into())
    }

    async fn dispatch(&self, kind: LeafKind, item: &LeafItem) -> Result<()> {
        log::debug!(
            "[{}] {} {} at {}",
            self.settings.cursor_name,
            kind,
            item.identity(),
            item.commit_timestamp().to_rfc3339()
        );
        let result = match kind {
            LeafKind::PackageDetails => self.leaf_processor.process_package_details(item).await,
            LeafKind::PackageDelete => self.leaf_processor.process_package_delete(item).await,
        };
        result.map_err(|e| match e {
            AppError::Processor { .. } => e,
            other => AppError::processor(item.identity(), other),
        })
    }
}
