// src/models/mod.rs

//! Domain models for the catalog crawler.
//!
//! This module contains the catalog documents, the leaf type model and
//! configuration, organized by their primary purpose.

mod catalog;
mod config;
pub mod kind;
mod leaf;
mod version;

// Re-export all public types
pub use catalog::{CatalogIndex, CatalogPage, LeafRef, PageRef};
pub use config::{
    CatalogConfig, Config, LoggingConfig, ProcessorConfig, RunnerConfig, validate_cursor_name,
};
pub use kind::{LeafKind, TypeToken, parse_document_level_kind, parse_page_level_kind};
pub use leaf::{
    CatalogItem, CatalogLeaf, DependencyGroup, LeafCommon, LeafItem, PackageDeleteLeaf,
    PackageDependency, PackageDeprecation, PackageDetailsLeaf, PackageVulnerability,
    UNLISTED_PUBLISHED_YEAR,
};
pub use version::NuGetVersion;
