//! Local package state store.
//!
//! A [`LeafProcessor`] that keeps one JSON record per package id and
//! normalized version. Details upsert the record, deletes turn it into a
//! tombstone. Events older than what is already stored are skipped, so
//! redelivering a leaf after a crash changes nothing.
//!
//! ```text
//! packages/
//! └── {id lowercase}/
//!     └── {normalized version lowercase}.json
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocalStorage;
use crate::error::{AppError, Result};
use crate::models::{CatalogItem, LeafItem, NuGetVersion};
use crate::services::LeafProcessor;

/// Stored state of one package version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub version: String,
    pub commit_timestamp: DateTime<Utc>,
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// File-backed package store.
#[derive(Debug, Clone)]
pub struct PackageStore {
    storage: LocalStorage,
}

impl PackageStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    fn key(leaf: &LeafItem) -> Result<String> {
        let version = leaf.parse_package_version()?;
        Ok(Self::key_for(leaf.package_id(), &version.to_normalized_string()))
    }

    fn key_for(id: &str, normalized_version: &str) -> String {
        format!(
            "packages/{}/{}.json",
            id.to_lowercase(),
            normalized_version.to_lowercase()
        )
    }

    /// Load the record for an id and version string.
    pub async fn get(&self, id: &str, version: &str) -> Result<Option<PackageRecord>> {
        let version = NuGetVersion::parse(version)?;
        self.storage
            .read_json(&Self::key_for(id, &version.to_normalized_string()))
            .await
    }

    async fn upsert(&self, leaf: &LeafItem, record: PackageRecord) -> Result<()> {
        let key = Self::key(leaf)?;
        if let Some(existing) = self.storage.read_json::<PackageRecord>(&key).await? {
            if existing.commit_timestamp > record.commit_timestamp {
                log::debug!(
                    "Skipping {}: stored record is newer ({})",
                    leaf.identity(),
                    existing.commit_timestamp.to_rfc3339()
                );
                return Ok(());
            }
        }
        self.storage
            .write_json(&key, &record)
            .await
            .map_err(|e| AppError::processor(leaf.identity(), e))
    }

    fn base_record(leaf: &LeafItem, deleted: bool) -> PackageRecord {
        PackageRecord {
            id: leaf.package_id().to_string(),
            version: leaf.package_version().to_string(),
            commit_timestamp: leaf.commit_timestamp(),
            deleted,
            listed: None,
            published: leaf.published(),
            title: None,
            authors: None,
            description: None,
            tags: Vec::new(),
        }
    }
}

#[async_trait]
impl LeafProcessor for PackageStore {
    async fn process_package_details(&self, leaf: &LeafItem) -> Result<()> {
        let mut record = Self::base_record(leaf, false);
        if let Some(details) = leaf.as_details() {
            record.listed = Some(details.is_listed());
            record.title = details.title.clone();
            record.authors = details.authors.clone();
            record.description = details.description.clone();
            record.tags = details.tags.clone();
        }
        self.upsert(leaf, record).await
    }

    async fn process_package_delete(&self, leaf: &LeafItem) -> Result<()> {
        self.upsert(leaf, Self::base_record(leaf, true)).await
    }
}
