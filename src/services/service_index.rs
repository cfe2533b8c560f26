//! NuGet V3 service index discovery.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::utils::http::fetch_bytes;
use crate::utils::json::JsonSettings;
use crate::utils::resolve;

/// Resource type advertising the catalog index.
pub const CATALOG_RESOURCE_TYPE: &str = "Catalog/3.0.0";

/// The V3 service index document.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIndex {
    pub version: String,
    #[serde(default)]
    pub resources: Vec<ServiceIndexResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIndexResource {
    #[serde(rename = "@id")]
    pub url: String,
    #[serde(rename = "@type")]
    pub resource_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ServiceIndex {
    /// URL of the first resource with the given type.
    pub fn resource_url(&self, resource_type: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
            .map(|r| r.url.as_str())
    }

    pub fn catalog_url(&self) -> Option<&str> {
        self.resource_url(CATALOG_RESOURCE_TYPE)
    }
}

/// Fetch a service index and return the catalog index URL it advertises.
pub async fn discover_catalog_url(
    client: &reqwest::Client,
    service_index_url: &str,
) -> Result<String> {
    log::info!("Discovering catalog from {}", service_index_url);
    let bytes = fetch_bytes(client, service_index_url).await?;
    let index: ServiceIndex = JsonSettings::default().parse(service_index_url, &bytes)?;

    let catalog = index.catalog_url().ok_or_else(|| {
        AppError::parse(
            service_index_url,
            format!("no {CATALOG_RESOURCE_TYPE} resource in service index"),
        )
    })?;
    let catalog = resolve(service_index_url, catalog)?;
    log::info!("Catalog index at {}", catalog);
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_url_lookup() {
        let index: ServiceIndex = serde_json::from_str(
            r#"{
                "version": "3.0.0",
                "resources": [
                    {"@id": "https://azuresearch-usnc.nuget.org/query", "@type": "SearchQueryService"},
                    {"@id": "https://api.nuget.org/v3/catalog0/index.json", "@type": "Catalog/3.0.0", "comment": "Index of NuGet package events"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            index.catalog_url(),
            Some("https://api.nuget.org/v3/catalog0/index.json")
        );
        assert_eq!(index.resource_url("PackageBaseAddress/3.0.0"), None);
    }
}
