//! Service layer for the catalog crawler.
//!
//! This module contains:
//! - Catalog document access (`CatalogClient`, `HttpCatalogClient`)
//! - Service index discovery (`ServiceIndex`)
//! - Leaf consumers (`LeafProcessor`, `LoggingLeafProcessor`)

mod catalog_client;
mod leaf_processor;
mod service_index;

pub use catalog_client::{CatalogClient, HttpCatalogClient};
pub use leaf_processor::{LeafProcessor, LoggingLeafProcessor};
pub use service_index::{
    CATALOG_RESOURCE_TYPE, ServiceIndex, ServiceIndexResource, discover_catalog_url,
};
