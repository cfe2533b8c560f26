// src/models/kind.rs

//! Leaf kind discriminators.
//!
//! Catalog pages tag their items with `nuget:PackageDetails` /
//! `nuget:PackageDelete`, while full leaf documents use the bare names,
//! sometimes inside an array next to unrelated types such as
//! `catalog:Permalink`. Both spellings resolve through one table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// The two kinds of catalog leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    PackageDetails,
    PackageDelete,
}

/// (kind, document-level name, page-level name)
type KindEntry = (LeafKind, &'static str, &'static str);

const KIND_NAMES: &[KindEntry] = &[
    (
        LeafKind::PackageDetails,
        "PackageDetails",
        "nuget:PackageDetails",
    ),
    (LeafKind::PackageDelete, "PackageDelete", "nuget:PackageDelete"),
];

impl LeafKind {
    /// Name used inside full leaf documents.
    pub fn document_name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|entry| entry.0 == self)
            .map(|entry| entry.1)
            .unwrap_or_default()
    }

    /// Name used on catalog page items.
    pub fn page_name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|entry| entry.0 == self)
            .map(|entry| entry.2)
            .unwrap_or_default()
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_name())
    }
}

/// Raw `@type` value: a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeToken {
    One(String),
    Many(Vec<String>),
}

impl TypeToken {
    /// Iterate the members in document order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let members: &[String] = match self {
            TypeToken::One(s) => std::slice::from_ref(s),
            TypeToken::Many(v) => v.as_slice(),
        };
        members.iter().map(String::as_str)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::One(s) => write!(f, "\"{s}\""),
            TypeToken::Many(v) => write!(f, "{v:?}"),
        }
    }
}

fn resolve(token: &TypeToken, pick: fn(&KindEntry) -> &'static str) -> Option<LeafKind> {
    token.iter().find_map(|member| {
        KIND_NAMES
            .iter()
            .find(|entry| pick(entry) == member)
            .map(|entry| entry.0)
    })
}

/// Resolve a page item's `@type`. The first recognized member wins.
pub fn parse_page_level_kind(token: &TypeToken) -> Result<LeafKind> {
    resolve(token, |entry| entry.2).ok_or_else(|| {
        AppError::parse("catalog page item @type", format!("unknown leaf type {token}"))
    })
}

/// Resolve a full leaf document's `@type`. The first recognized member wins.
pub fn parse_document_level_kind(token: &TypeToken) -> Result<LeafKind> {
    resolve(token, |entry| entry.1)
        .ok_or_else(|| AppError::parse("catalog leaf @type", format!("unknown leaf type {token}")))
}

/// Serde adapter for page-level `@type` fields.
pub mod page_level {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{LeafKind, TypeToken, parse_page_level_kind};

    pub fn serialize<S: Serializer>(kind: &LeafKind, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(kind.page_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LeafKind, D::Error> {
        let token = TypeToken::deserialize(deserializer)?;
        parse_page_level_kind(&token).map_err(D::Error::custom)
    }
}

/// Serde adapter for document-level `@type` fields.
pub mod document_level {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::{LeafKind, TypeToken, parse_document_level_kind};

    pub fn serialize<S: Serializer>(kind: &LeafKind, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(kind.document_name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LeafKind, D::Error> {
        let token = TypeToken::deserialize(deserializer)?;
        parse_document_level_kind(&token).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn many(items: &[&str]) -> TypeToken {
        TypeToken::Many(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_page_level_single_string() {
        let token = TypeToken::One("nuget:PackageDelete".into());
        assert_eq!(parse_page_level_kind(&token).unwrap(), LeafKind::PackageDelete);
    }

    #[test]
    fn test_document_level_position_independent() {
        for token in [
            many(&["PackageDetails", "catalog:Permalink"]),
            many(&["catalog:Permalink", "PackageDetails"]),
            TypeToken::One("PackageDetails".into()),
        ] {
            assert_eq!(
                parse_document_level_kind(&token).unwrap(),
                LeafKind::PackageDetails
            );
        }
    }

    #[test]
    fn test_first_recognized_member_wins() {
        let token = many(&["catalog:Permalink", "PackageDelete", "PackageDetails"]);
        assert_eq!(parse_document_level_kind(&token).unwrap(), LeafKind::PackageDelete);
    }

    #[test]
    fn test_unknown_discriminator_is_parse_error() {
        for token in [
            TypeToken::One("nuget:PackageRename".into()),
            many(&["catalog:Permalink"]),
            many(&[]),
        ] {
            assert!(parse_page_level_kind(&token).unwrap_err().is_parse());
            assert!(parse_document_level_kind(&token).unwrap_err().is_parse());
        }
    }

    #[test]
    fn test_spellings_do_not_cross() {
        let bare = TypeToken::One("PackageDetails".into());
        let prefixed = TypeToken::One("nuget:PackageDetails".into());
        assert!(parse_page_level_kind(&bare).is_err());
        assert!(parse_document_level_kind(&prefixed).is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for kind in [LeafKind::PackageDetails, LeafKind::PackageDelete] {
            let page = TypeToken::One(kind.page_name().into());
            let doc = TypeToken::One(kind.document_name().into());
            assert_eq!(parse_page_level_kind(&page).unwrap(), kind);
            assert_eq!(parse_document_level_kind(&doc).unwrap(), kind);
        }
    }
}
