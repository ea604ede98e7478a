//! Time-driven retirement of expired deals, independent of the sync cadence.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::Duration;

use crate::services::deal_store::DealStore;
use crate::services::product_store::ProductStore;
use crate::services::scheduler::Scheduler;

pub fn start_deal_cleanup_job(
    scheduler: &mut Scheduler,
    reaper: Arc<DealExpiryReaper>,
    period: Duration,
) {
    scheduler.every("deal_cleanup", period, move || {
        let reaper = reaper.clone();
        async move {
            if let Err(e) = reaper.sweep().await {
                tracing::error!("Deal cleanup sweep failed: {}", e);
            }
        }
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub products_cleared: u64,
    pub deals_deactivated: u64,
}

pub struct DealExpiryReaper {
    products: Arc<dyn ProductStore>,
    deals: Arc<dyn DealStore>,
}

impl DealExpiryReaper {
    pub fn new(products: Arc<dyn ProductStore>, deals: Arc<dyn DealStore>) -> Self {
        Self { products, deals }
    }

    /// Two set-based bulk updates: clear deal flags on products whose window
    /// passed, then deactivate the corresponding deal rows.
    pub async fn sweep(&self) -> Result<SweepSummary, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();

        let products_cleared = self.products.clear_expired_deals(now).await?;
        let deals_deactivated = self.deals.deactivate_expired(now).await?;

        tracing::info!(
            "Expiry sweep cleared {} products, deactivated {} deals",
            products_cleared,
            deals_deactivated
        );

        Ok(SweepSummary {
            products_cleared,
            deals_deactivated,
        })
    }
}
