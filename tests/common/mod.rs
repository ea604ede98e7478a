//! In-memory test doubles for the sync engine's seams, so the integration
//! suite runs without Postgres or a live marketplace.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use dealradar_backend::config::SyncSettings;
use dealradar_backend::jobs::catalog_sync::CatalogSyncEngine;
use dealradar_backend::services::catalog_client::{CatalogClient, DealCandidate, ExternalListing};
use dealradar_backend::services::deal_store::{DealStore, DealUpsert};
use dealradar_backend::services::product_store::{ProductSnapshot, ProductStore, ProductSyncUpdate};
use dealradar_backend::services::rate_limiter::FixedDelayLimiter;
use dealradar_backend::services::sync_log_store::{RunOutcome, SyncLogStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Products

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i32,
    pub external_id: String,
    pub title: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub review_count: i32,
    pub in_stock: bool,
    pub is_active: bool,
    pub is_deal: bool,
    pub discount_percent: Option<i32>,
    pub deal_expiry: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    pub fn active(id: i32, external_id: &str, price: Decimal) -> Self {
        Self {
            id,
            external_id: external_id.to_string(),
            title: format!("Product {}", external_id),
            price,
            old_price: None,
            rating: None,
            review_count: 0,
            in_stock: true,
            is_active: true,
            is_deal: false,
            discount_percent: None,
            deal_expiry: None,
            last_synced_at: None,
        }
    }
}

#[derive(Default)]
pub struct InMemoryProductStore {
    pub rows: Mutex<Vec<ProductRow>>,
    pub fail_snapshot: AtomicBool,
    next_id: AtomicI32,
}

impl InMemoryProductStore {
    pub fn with_rows(rows: Vec<ProductRow>) -> Arc<Self> {
        let max_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
        Arc::new(Self {
            rows: Mutex::new(rows),
            fail_snapshot: AtomicBool::new(false),
            next_id: AtomicI32::new(max_id + 1),
        })
    }

    pub fn row(&self, id: i32) -> ProductRow {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .expect("product row missing")
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn active_snapshot(&self) -> Result<Vec<ProductSnapshot>, BoxError> {
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err("snapshot query failed".into());
        }

        let mut snapshot: Vec<ProductSnapshot> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active)
            .map(|r| ProductSnapshot {
                id: r.id,
                external_id: r.external_id.clone(),
                price: r.price,
            })
            .collect();
        snapshot.sort_by_key(|s| s.id);
        Ok(snapshot)
    }

    async fn apply_sync_update(
        &self,
        product_id: i32,
        update: ProductSyncUpdate,
    ) -> Result<(), BoxError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == product_id)
            .ok_or("product not found")?;

        row.price = update.price;
        if let Some(previous) = update.old_price {
            row.old_price = Some(previous);
        }
        row.rating = update.rating;
        row.review_count = update.review_count;
        row.in_stock = update.in_stock;
        row.last_synced_at = Some(update.synced_at);
        Ok(())
    }

    async fn mark_deal(
        &self,
        product_id: i32,
        discount_percent: i32,
        deal_expiry: DateTime<Utc>,
    ) -> Result<(), BoxError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == product_id)
            .ok_or("product not found")?;

        row.is_deal = true;
        row.discount_percent = Some(discount_percent);
        row.deal_expiry = Some(deal_expiry);
        Ok(())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<i32>, BoxError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.external_id == external_id)
            .map(|r| r.id))
    }

    async fn create_from_candidate(&self, candidate: &DealCandidate) -> Result<i32, BoxError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut row = ProductRow::active(id, &candidate.external_id, candidate.price);
        row.title = candidate.title.clone();
        self.rows.lock().unwrap().push(row);
        Ok(id)
    }

    async fn clear_expired_deals(&self, now: DateTime<Utc>) -> Result<u64, BoxError> {
        let mut cleared = 0;
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.is_deal && row.deal_expiry.is_some_and(|expiry| expiry < now) {
                row.is_deal = false;
                row.discount_percent = None;
                row.deal_expiry = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

// ---------------------------------------------------------------------------
// Deals

#[derive(Debug, Clone)]
pub struct DealRow {
    pub id: i32,
    pub product_id: i32,
    pub title: String,
    pub discount_percent: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Default)]
pub struct InMemoryDealStore {
    pub rows: Mutex<Vec<DealRow>>,
    next_id: AtomicI32,
}

impl InMemoryDealStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
        })
    }

    pub fn for_product(&self, product_id: i32) -> Option<DealRow> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.product_id == product_id)
            .cloned()
    }
}

#[async_trait]
impl DealStore for InMemoryDealStore {
    async fn upsert_for_product(&self, upsert: DealUpsert) -> Result<(), BoxError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|d| d.product_id == upsert.product_id) {
            Some(existing) => {
                // Same semantics as the SeaORM store: a refresh touches only
                // the discount and the active flag
                existing.discount_percent = upsert.discount_percent;
                existing.is_active = true;
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                rows.push(DealRow {
                    id,
                    product_id: upsert.product_id,
                    title: upsert.title,
                    discount_percent: upsert.discount_percent,
                    start_date: upsert.start_date,
                    end_date: upsert.end_date,
                    is_active: true,
                });
            }
        }
        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64, BoxError> {
        let mut deactivated = 0;
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.is_active && row.end_date < now {
                row.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }
}

// ---------------------------------------------------------------------------
// Sync logs

#[derive(Debug, Clone)]
pub struct LogRow {
    pub id: i32,
    pub job_type: String,
    pub status: String,
    pub products_updated: i32,
    pub products_created: i32,
    pub products_failed: i32,
    pub duration_ms: Option<i64>,
    pub message: Option<String>,
}

#[derive(Default)]
pub struct InMemorySyncLogStore {
    pub rows: Mutex<Vec<LogRow>>,
    next_id: AtomicI32,
}

impl InMemorySyncLogStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
        })
    }

    pub fn single_row(&self) -> LogRow {
        let rows = self.rows.lock().unwrap();
        assert_eq!(rows.len(), 1, "expected exactly one sync log row");
        rows[0].clone()
    }
}

#[async_trait]
impl SyncLogStore for InMemorySyncLogStore {
    async fn start_run(&self, job_type: &str) -> Result<i32, BoxError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(LogRow {
            id,
            job_type: job_type.to_string(),
            status: "RUNNING".to_string(),
            products_updated: 0,
            products_created: 0,
            products_failed: 0,
            duration_ms: None,
            message: None,
        });
        Ok(id)
    }

    async fn finish_run(&self, log_id: i32, outcome: RunOutcome) -> Result<(), BoxError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == log_id)
            .ok_or("log row not found")?;

        if row.status != "RUNNING" {
            return Ok(());
        }

        match outcome {
            RunOutcome::Success {
                counters,
                duration_ms,
                message,
            } => {
                row.status = "SUCCESS".to_string();
                row.products_updated = counters.updated;
                row.products_created = counters.created;
                row.products_failed = counters.failed;
                row.duration_ms = Some(duration_ms);
                row.message = Some(message);
            }
            RunOutcome::Failed {
                message,
                duration_ms,
            } => {
                row.status = "FAILED".to_string();
                row.duration_ms = Some(duration_ms);
                row.message = Some(message);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog client

pub enum ListingScript {
    Listing(ExternalListing),
    Missing,
    Error(&'static str),
    /// Never resolves; exercises the per-item fetch timeout
    Hang,
}

#[derive(Default)]
pub struct ScriptedCatalog {
    scripts: Mutex<HashMap<String, ListingScript>>,
    pub feed: Mutex<Vec<DealCandidate>>,
    pub fail_feed: AtomicBool,
    pub fetch_count: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, external_id: &str, script: ListingScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(external_id.to_string(), script);
    }

    pub fn script_price(&self, external_id: &str, price: Decimal) {
        self.script(external_id, ListingScript::Listing(listing(price)));
    }
}

pub fn listing(price: Decimal) -> ExternalListing {
    ExternalListing {
        price,
        rating: None,
        review_count: 10,
        in_stock: true,
    }
}

#[async_trait]
impl CatalogClient for ScriptedCatalog {
    async fn fetch_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalListing>, BoxError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        {
            let scripts = self.scripts.lock().unwrap();
            match scripts.get(external_id) {
                Some(ListingScript::Listing(listing)) => return Ok(Some(listing.clone())),
                Some(ListingScript::Missing) | None => return Ok(None),
                Some(ListingScript::Error(message)) => return Err((*message).into()),
                Some(ListingScript::Hang) => {}
            }
        }

        std::future::pending().await
    }

    async fn fetch_deals_feed(
        &self,
        _category: Option<&str>,
    ) -> Result<Vec<DealCandidate>, BoxError> {
        if self.fail_feed.load(Ordering::SeqCst) {
            return Err("deals feed unavailable".into());
        }
        Ok(self.feed.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Engine wiring

pub fn test_settings() -> SyncSettings {
    SyncSettings {
        rate_limit_ms: 0,
        fetch_timeout_secs: 5,
        concurrency: 2,
        ..SyncSettings::default()
    }
}

pub fn build_engine(
    products: &Arc<InMemoryProductStore>,
    deals: &Arc<InMemoryDealStore>,
    sync_logs: &Arc<InMemorySyncLogStore>,
    catalog: &Arc<ScriptedCatalog>,
    settings: &SyncSettings,
) -> CatalogSyncEngine {
    CatalogSyncEngine::new(
        products.clone(),
        deals.clone(),
        sync_logs.clone(),
        catalog.clone(),
        Arc::new(FixedDelayLimiter::from_millis(settings.rate_limit_ms)),
        settings,
    )
}
