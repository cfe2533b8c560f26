//! Catalog index and page documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::{self, LeafKind};

/// Root document of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogIndex {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "commitId", default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,

    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,

    pub count: u64,

    #[serde(default)]
    pub items: Vec<PageRef>,
}

/// Pointer from the index to one catalog page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    #[serde(rename = "@id")]
    pub url: String,

    #[serde(rename = "commitId", default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,

    /// Newest commit timestamp among the page's leaves
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,

    pub count: u64,
}

/// A page of leaf summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "commitId", default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,

    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,

    pub count: u64,

    #[serde(default)]
    pub items: Vec<LeafRef>,

    /// Back-reference to the index, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Leaf summary as listed on a catalog page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafRef {
    #[serde(rename = "@id")]
    pub url: String,

    #[serde(rename = "@type", with = "kind::page_level")]
    pub kind: LeafKind,

    #[serde(rename = "commitId", default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,

    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,

    #[serde(rename = "nuget:id")]
    pub package_id: String,

    /// Raw version string, parsed on demand
    #[serde(rename = "nuget:version")]
    pub package_version: String,
}
