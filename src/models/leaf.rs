//! Catalog leaf documents.
//!
//! A leaf shows up in two shapes: the summary listed on a page ([`LeafRef`])
//! and the full document behind its URL ([`PackageDetailsLeaf`] or
//! [`PackageDeleteLeaf`]). [`LeafItem`] carries either shape to a leaf
//! processor; [`CatalogItem`] exposes the fields they share.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::catalog::LeafRef;
use super::kind::{self, LeafKind};
use super::version::NuGetVersion;
use crate::error::{AppError, Result};

/// Year NuGet writes into `published` to mark a package unlisted.
pub const UNLISTED_PUBLISHED_YEAR: i32 = 1900;

/// Accessors shared by every leaf shape.
pub trait CatalogItem {
    fn url(&self) -> &str;
    fn kind(&self) -> LeafKind;
    fn commit_timestamp(&self) -> DateTime<Utc>;
    fn package_id(&self) -> &str;
    fn package_version(&self) -> &str;

    /// Parse the raw version string. Not cached; call at the point of use.
    fn parse_package_version(&self) -> Result<NuGetVersion> {
        NuGetVersion::parse(self.package_version()).map_err(|e| {
            AppError::parse(
                format!("{} {}", self.package_id(), self.package_version()),
                e,
            )
        })
    }

    /// `Id/Version` label for logs and errors.
    fn identity(&self) -> String {
        format!("{}/{}", self.package_id(), self.package_version())
    }
}

/// Fields present on every full leaf document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafCommon {
    #[serde(rename = "@id")]
    pub url: String,

    #[serde(rename = "@type", with = "kind::document_level")]
    pub kind: LeafKind,

    #[serde(
        rename = "catalog:commitId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_id: Option<String>,

    #[serde(rename = "catalog:commitTimeStamp")]
    pub commit_timestamp: DateTime<Utc>,

    #[serde(rename = "id")]
    pub package_id: String,

    #[serde(rename = "version")]
    pub package_version: String,

    pub published: DateTime<Utc>,
}

/// Full document for a package publish or edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetailsLeaf {
    #[serde(flatten)]
    pub common: LeafCommon,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_groups: Vec<DependencyGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default)]
    pub is_prerelease: bool,
    /// Absent on old leaves, see [`PackageDetailsLeaf::is_listed`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_client_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_license_acceptance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbatim_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<PackageDeprecation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<PackageVulnerability>,
}

impl PackageDetailsLeaf {
    /// Explicit `listed` wins; otherwise a 1900 `published` year means unlisted.
    pub fn is_listed(&self) -> bool {
        self.listed
            .unwrap_or(self.common.published.year() != UNLISTED_PUBLISHED_YEAR)
    }
}

/// Full document marking a package as deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDeleteLeaf {
    #[serde(flatten)]
    pub common: LeafCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDependency {
    pub id: String,
    /// Version range; array forms are joined with `,`
    #[serde(
        default,
        deserialize_with = "deserialize_range",
        skip_serializing_if = "Option::is_none"
    )]
    pub range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDeprecation {
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_package: Option<PackageDependency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVulnerability {
    pub advisory_url: String,
    pub severity: String,
}

fn deserialize_range<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Range {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Range>::deserialize(deserializer)?.map(|range| match range {
        Range::One(s) => s,
        Range::Many(parts) => parts.join(","),
    }))
}

/// A full leaf document of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLeaf {
    PackageDetails(Box<PackageDetailsLeaf>),
    PackageDelete(PackageDeleteLeaf),
}

impl CatalogLeaf {
    fn common(&self) -> &LeafCommon {
        match self {
            CatalogLeaf::PackageDetails(leaf) => &leaf.common,
            CatalogLeaf::PackageDelete(leaf) => &leaf.common,
        }
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.common().published
    }
}

/// What a leaf processor receives: a page summary or a full document.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafItem {
    Summary(LeafRef),
    Details(Box<PackageDetailsLeaf>),
    Delete(PackageDeleteLeaf),
}

impl LeafItem {
    /// The full details document, when it was fetched.
    pub fn as_details(&self) -> Option<&PackageDetailsLeaf> {
        match self {
            LeafItem::Details(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// The full delete document, when it was fetched.
    pub fn as_delete(&self) -> Option<&PackageDeleteLeaf> {
        match self {
            LeafItem::Delete(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Published time, when a full document is present.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        match self {
            LeafItem::Summary(_) => None,
            LeafItem::Details(leaf) => Some(leaf.common.published),
            LeafItem::Delete(leaf) => Some(leaf.common.published),
        }
    }
}

impl From<CatalogLeaf> for LeafItem {
    fn from(leaf: CatalogLeaf) -> Self {
        match leaf {
            CatalogLeaf::PackageDetails(leaf) => LeafItem::Details(leaf),
            CatalogLeaf::PackageDelete(leaf) => LeafItem::Delete(leaf),
        }
    }
}

macro_rules! impl_catalog_item_for_common {
    ($($ty:ty),*) => {
        $(impl CatalogItem for $ty {
            fn url(&self) -> &str {
                &self.common.url
            }
            fn kind(&self) -> LeafKind {
                self.common.kind
            }
            fn commit_timestamp(&self) -> DateTime<Utc> {
                self.common.commit_timestamp
            }
            fn package_id(&self) -> &str {
                &self.common.package_id
            }
            fn package_version(&self) -> &str {
                &self.common.package_version
            }
        })*
    };
}

impl_catalog_item_for_common!(PackageDetailsLeaf, PackageDeleteLeaf);

impl CatalogItem for LeafRef {
    fn url(&self) -> &str {
        &self.url
    }
    fn kind(&self) -> LeafKind {
        self.kind
    }
    fn commit_timestamp(&self) -> DateTime<Utc> {
        self.commit_timestamp
    }
    fn package_id(&self) -> &str {
        &self.package_id
    }
    fn package_version(&self) -> &str {
        &self.package_version
    }
}

impl CatalogItem for CatalogLeaf {
    fn url(&self) -> &str {
        &self.common().url
    }
    fn kind(&self) -> LeafKind {
        self.common().kind
    }
    fn commit_timestamp(&self) -> DateTime<Utc> {
        self.common().commit_timestamp
    }
    fn package_id(&self) -> &str {
        &self.common().package_id
    }
    fn package_version(&self) -> &str {
        &self.common().package_version
    }
}

impl CatalogItem for LeafItem {
    fn url(&self) -> &str {
        match self {
            LeafItem::Summary(leaf) => leaf.url(),
            LeafItem::Details(leaf) => leaf.url(),
            LeafItem::Delete(leaf) => leaf.url(),
        }
    }
    fn kind(&self) -> LeafKind {
        match self {
            LeafItem::Summary(leaf) => leaf.kind(),
            LeafItem::Details(leaf) => leaf.kind(),
            LeafItem::Delete(leaf) => leaf.kind(),
        }
    }
    fn commit_timestamp(&self) -> DateTime<Utc> {
        match self {
            LeafItem::Summary(leaf) => leaf.commit_timestamp(),
            LeafItem::Details(leaf) => leaf.commit_timestamp(),
            LeafItem::Delete(leaf) => leaf.commit_timestamp(),
        }
    }
    fn package_id(&self) -> &str {
        match self {
            LeafItem::Summary(leaf) => leaf.package_id(),
            LeafItem::Details(leaf) => leaf.package_id(),
            LeafItem::Delete(leaf) => leaf.package_id(),
        }
    }
    fn package_version(&self) -> &str {
        match self {
            LeafItem::Summary(leaf) => leaf.package_version(),
            LeafItem::Details(leaf) => leaf.package_version(),
            LeafItem::Delete(leaf) => leaf.package_version(),
        }
    }
}
