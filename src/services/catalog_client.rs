//! Client for the external marketplace catalog API.
//!
//! The trait is the seam the sync engine depends on; `HttpCatalogClient` is
//! the production implementation. Signed PA-API-style request auth is out of
//! scope, the API is reached with a key header and a partner tag.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CatalogSettings;

/// Current marketplace state of one listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalListing {
    pub price: Decimal,
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

/// One marketplace-promoted deal from the deals feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DealCandidate {
    pub external_id: String,
    pub title: String,
    pub price: Decimal,
    pub discount_percent: Option<i32>,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the current listing for one external id. `Ok(None)` means the
    /// marketplace has no listing for the id, which callers treat as a skip
    /// rather than a failure.
    async fn fetch_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalListing>, Box<dyn std::error::Error + Send + Sync>>;

    /// Fetch the marketplace-promoted deals feed, optionally per category.
    async fn fetch_deals_feed(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<DealCandidate>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
    partner_tag: String,
    feed_cache: Arc<Cache<String, Arc<Vec<DealCandidate>>>>,
}

impl HttpCatalogClient {
    pub fn new(settings: &CatalogSettings) -> Self {
        let feed_cache = Cache::builder()
            .max_capacity(50)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Self {
            client: Client::new(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            partner_tag: settings.partner_tag.clone(),
            feed_cache: Arc::new(feed_cache),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalListing>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/items/{}", self.base_url, external_id);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&[("partner_tag", self.partner_tag.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Marketplace API error {}: {}", status, error_text).into());
        }

        let listing: ExternalListing = response.json().await?;
        Ok(Some(listing))
    }

    async fn fetch_deals_feed(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<DealCandidate>, Box<dyn std::error::Error + Send + Sync>> {
        let cache_key = category.unwrap_or("all").to_string();

        if let Some(cached) = self.feed_cache.get(&cache_key).await {
            tracing::debug!("Using cached deals feed for category {}", cache_key);
            return Ok(cached.as_ref().clone());
        }

        let url = format!("{}/deals", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&[("partner_tag", self.partner_tag.as_str())]);

        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Marketplace deals feed error {}: {}", status, error_text).into());
        }

        #[derive(Deserialize)]
        struct DealsFeedResponse {
            deals: Vec<DealCandidate>,
        }

        let feed: DealsFeedResponse = response.json().await?;
        self.feed_cache
            .insert(cache_key, Arc::new(feed.deals.clone()))
            .await;

        Ok(feed.deals)
    }
}
