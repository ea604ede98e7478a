//! Catalog synchronization run: reconcile stored products against the
//! marketplace, promote qualifying price drops into deals, and record one
//! audit row per run.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

use crate::config::SyncSettings;
use crate::services::catalog_client::{CatalogClient, ExternalListing};
use crate::services::deal_store::DealStore;
use crate::services::deals::DealEngine;
use crate::services::product_store::{ProductSnapshot, ProductStore, ProductSyncUpdate};
use crate::services::rate_limiter::RateLimiter;
use crate::services::scheduler::Scheduler;
use crate::services::sync_log_store::{RunCounters, RunOutcome, SyncLogStore, job_types};

pub fn start_catalog_sync_job(
    scheduler: &mut Scheduler,
    engine: Arc<CatalogSyncEngine>,
    period: Duration,
) {
    scheduler.every("catalog_sync", period, move || {
        let engine = engine.clone();
        async move {
            engine.run_sync().await;
        }
    });
}

/// Per-item result of the sync worker. A skip moves no counter.
enum ItemOutcome {
    Updated,
    Skipped,
    Failed,
}

pub struct CatalogSyncEngine {
    products: Arc<dyn ProductStore>,
    sync_logs: Arc<dyn SyncLogStore>,
    catalog: Arc<dyn CatalogClient>,
    limiter: Arc<dyn RateLimiter>,
    deal_engine: DealEngine,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl CatalogSyncEngine {
    pub fn new(
        products: Arc<dyn ProductStore>,
        deals: Arc<dyn DealStore>,
        sync_logs: Arc<dyn SyncLogStore>,
        catalog: Arc<dyn CatalogClient>,
        limiter: Arc<dyn RateLimiter>,
        settings: &SyncSettings,
    ) -> Self {
        let deal_engine = DealEngine::new(
            products.clone(),
            deals,
            settings.deal_threshold_percent,
            settings.deal_window_days,
        );

        Self {
            products,
            sync_logs,
            catalog,
            limiter,
            deal_engine,
            concurrency: settings.concurrency.max(1),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
        }
    }

    /// One full orchestration run. Never raises: every failure ends in the
    /// sync log or a per-item counter.
    pub async fn run_sync(&self) {
        tracing::info!("Starting catalog sync run");
        let run_started = std::time::Instant::now();

        let log_id = match self.sync_logs.start_run(job_types::PRODUCTS).await {
            Ok(id) => id,
            Err(e) => {
                // Nothing to record the run into; skip this cycle
                tracing::error!("Could not create sync log row, skipping run: {}", e);
                return;
            }
        };

        let outcome = match self.sync_all().await {
            Ok(counters) => {
                tracing::info!(
                    "Catalog sync completed: {} updated, {} created, {} failed",
                    counters.updated,
                    counters.created,
                    counters.failed
                );
                RunOutcome::Success {
                    counters,
                    duration_ms: run_started.elapsed().as_millis() as i64,
                    message: format!(
                        "Synced {} products ({} created, {} failed)",
                        counters.updated, counters.created, counters.failed
                    ),
                }
            }
            Err(e) => {
                tracing::error!("Catalog sync run failed: {}", e);
                RunOutcome::Failed {
                    message: e.to_string(),
                    duration_ms: run_started.elapsed().as_millis() as i64,
                }
            }
        };

        if let Err(e) = self.sync_logs.finish_run(log_id, outcome).await {
            tracing::error!("Failed to finalize sync log {}: {}", log_id, e);
        }
    }

    /// Snapshot the active products once, then run the item loop through a
    /// bounded worker pool sharing one rate limiter. Items start in snapshot
    /// order; a failing item never stops the rest.
    async fn sync_all(&self) -> Result<RunCounters, Box<dyn std::error::Error + Send + Sync>> {
        let snapshot = self.products.active_snapshot().await?;
        tracing::info!("Found {} products to sync", snapshot.len());

        let mut counters = stream::iter(snapshot)
            .map(|product| self.sync_one(product))
            .buffered(self.concurrency)
            .fold(RunCounters::default(), |mut counters, outcome| async move {
                match outcome {
                    ItemOutcome::Updated => counters.updated += 1,
                    ItemOutcome::Skipped => {}
                    ItemOutcome::Failed => counters.failed += 1,
                }
                counters
            })
            .await;

        counters.created = self.ingest_deals_feed().await;

        Ok(counters)
    }

    /// Sync one product. All fetch/persist/deal errors are absorbed here and
    /// reported through the outcome, never to the orchestrator loop.
    async fn sync_one(&self, product: ProductSnapshot) -> ItemOutcome {
        self.limiter.acquire().await;

        let fetched = timeout(
            self.fetch_timeout,
            self.catalog.fetch_by_external_id(&product.external_id),
        )
        .await;

        let listing = match fetched {
            Err(_) => {
                tracing::warn!(
                    "Fetch for {} timed out after {}s",
                    product.external_id,
                    self.fetch_timeout.as_secs()
                );
                return ItemOutcome::Failed;
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to fetch {}: {}", product.external_id, e);
                return ItemOutcome::Failed;
            }
            Ok(Ok(None)) => {
                tracing::debug!("No marketplace listing for {}, skipping", product.external_id);
                return ItemOutcome::Skipped;
            }
            Ok(Ok(Some(listing))) => listing,
        };

        match self.apply_listing(&product, &listing).await {
            Ok(()) => ItemOutcome::Updated,
            Err(e) => {
                tracing::warn!(
                    "Failed to sync product {} ({}): {}",
                    product.id,
                    product.external_id,
                    e
                );
                ItemOutcome::Failed
            }
        }
    }

    async fn apply_listing(
        &self,
        product: &ProductSnapshot,
        listing: &ExternalListing,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let price_changed = listing.price != product.price;

        self.products
            .apply_sync_update(
                product.id,
                ProductSyncUpdate {
                    price: listing.price,
                    old_price: price_changed.then_some(product.price),
                    rating: listing.rating,
                    review_count: listing.review_count,
                    in_stock: listing.in_stock,
                    synced_at: Utc::now(),
                },
            )
            .await?;

        if listing.price < product.price {
            self.deal_engine
                .apply_price_drop(product.id, product.price, listing.price)
                .await?;
        }

        Ok(())
    }

    /// Create products for marketplace-promoted deals we do not carry yet.
    /// Feed errors are logged and leave the run intact.
    async fn ingest_deals_feed(&self) -> i32 {
        let candidates = match self.catalog.fetch_deals_feed(None).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Failed to fetch deals feed: {}", e);
                return 0;
            }
        };

        let mut created = 0;
        for candidate in &candidates {
            match self.products.find_by_external_id(&candidate.external_id).await {
                Ok(Some(_)) => {}
                Ok(None) => match self.products.create_from_candidate(candidate).await {
                    Ok(id) => {
                        tracing::info!(
                            "Created product {} from deals feed ({})",
                            id,
                            candidate.external_id
                        );
                        created += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to create product for feed candidate {}: {}",
                            candidate.external_id,
                            e
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "Lookup failed for feed candidate {}: {}",
                        candidate.external_id,
                        e
                    );
                }
            }
        }

        created
    }
}
