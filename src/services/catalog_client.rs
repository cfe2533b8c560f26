// src/services/catalog_client.rs

//! Catalog client.
//!
//! Fetches and parses the three catalog document kinds. Every failure is a
//! hard failure of the current pass: transport problems and non-2xx statuses
//! become `AppError::Fetch`, malformed documents become `AppError::Parse`.
//! Nothing is retried here.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    CatalogConfig, CatalogIndex, CatalogLeaf, CatalogPage, LeafKind, TypeToken,
    parse_document_level_kind,
};
use crate::services::service_index::discover_catalog_url;
use crate::utils::http::{create_async_client, fetch_bytes};
use crate::utils::json::JsonSettings;
use crate::utils::resolve_url;

/// Read access to a remote catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_index(&self) -> Result<CatalogIndex>;

    async fn get_page(&self, url: &str) -> Result<CatalogPage>;

    /// Fetch a full leaf. The document's own `@type` must agree with `kind`.
    async fn get_leaf(&self, url: &str, kind: LeafKind) -> Result<CatalogLeaf>;
}

/// Catalog client over HTTP.
pub struct HttpCatalogClient {
    client: Client,
    index_url: String,
    json: JsonSettings,
}

impl HttpCatalogClient {
    /// Create a client for a known catalog index URL.
    pub fn new(client: Client, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
            json: JsonSettings::default(),
        }
    }

    /// Build from configuration, discovering the index via the service index
    /// unless `index_url` is set.
    pub async fn from_config(config: &CatalogConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        let index_url = match &config.index_url {
            Some(url) => url.clone(),
            None => discover_catalog_url(&client, &config.service_index_url).await?,
        };
        Ok(Self::new(client, index_url))
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let bytes = fetch_bytes(&self.client, url).await?;
        self.json.parse(url, &bytes)
    }

    fn base(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| AppError::fetch(url, e))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_index(&self) -> Result<CatalogIndex> {
        log::debug!("Fetching catalog index {}", self.index_url);
        let mut index: CatalogIndex = self.fetch_json(&self.index_url).await?;

        let base = Self::base(&self.index_url)?;
        for page in &mut index.items {
            page.url = resolve_url(&base, &page.url);
        }
        Ok(index)
    }

    async fn get_page(&self, url: &str) -> Result<CatalogPage> {
        log::debug!("Fetching catalog page {}", url);
        let mut page: CatalogPage = self.fetch_json(url).await?;

        let base = Self::base(url)?;
        for leaf in &mut page.items {
            leaf.url = resolve_url(&base, &leaf.url);
        }
        Ok(page)
    }

    async fn get_leaf(&self, url: &str, kind: LeafKind) -> Result<CatalogLeaf> {
        log::debug!("Fetching {} leaf {}", kind, url);
        let document: Value = self.fetch_json(url).await?;

        let token: TypeToken = document
            .get("@type")
            .cloned()
            .ok_or_else(|| AppError::parse(url, "leaf has no @type"))
            .and_then(|t| serde_json::from_value(t).map_err(|e| AppError::parse(url, e)))?;
        let actual = parse_document_level_kind(&token)?;
        if actual != kind {
            return Err(AppError::parse(
                url,
                format!("expected {kind} leaf, document is {actual}"),
            ));
        }

        let leaf = match kind {
            LeafKind::PackageDetails => CatalogLeaf::PackageDetails(Box::new(
                serde_json::from_value(document).map_err(|e| AppError::parse(url, e))?,
            )),
            LeafKind::PackageDelete => CatalogLeaf::PackageDelete(
                serde_json::from_value(document).map_err(|e| AppError::parse(url, e))?,
            ),
        };
        Ok(leaf)
    }
}
