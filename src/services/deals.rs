//! Deal computation: decides whether a price drop qualifies as a promotable
//! deal and performs the per-product upsert plus the product-row mirror.

use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

use crate::services::deal_store::{DealStore, DealUpsert};
use crate::services::product_store::ProductStore;

pub struct DealEngine {
    products: Arc<dyn ProductStore>,
    deals: Arc<dyn DealStore>,
    threshold_percent: i32,
    window: Duration,
}

impl DealEngine {
    pub fn new(
        products: Arc<dyn ProductStore>,
        deals: Arc<dyn DealStore>,
        threshold_percent: i32,
        window_days: i64,
    ) -> Self {
        Self {
            products,
            deals,
            threshold_percent,
            window: Duration::days(window_days),
        }
    }

    /// Promote a price drop into a deal when the rounded discount meets the
    /// threshold. Idempotent per (product_id, old_price, new_price): the
    /// upsert key is product_id, so re-applying refreshes the same row.
    pub async fn apply_price_drop(
        &self,
        product_id: i32,
        old_price: Decimal,
        new_price: Decimal,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if old_price <= Decimal::ZERO {
            return Ok(());
        }

        let discount = discount_percent(old_price, new_price);
        if discount < self.threshold_percent {
            tracing::debug!(
                "Product {} dropped {}% (below {}% threshold), no deal",
                product_id,
                discount,
                self.threshold_percent
            );
            return Ok(());
        }

        let now = Utc::now();
        let expiry = now + self.window;

        self.deals
            .upsert_for_product(DealUpsert {
                product_id,
                title: format!("{}% OFF", discount),
                discount_percent: discount,
                start_date: now,
                end_date: expiry,
            })
            .await?;

        self.products.mark_deal(product_id, discount, expiry).await?;

        tracing::info!(
            "Product {} promoted to deal: {}% off until {}",
            product_id,
            discount,
            expiry
        );
        Ok(())
    }
}

/// Rounded percentage drop from old_price to new_price, half away from zero.
pub fn discount_percent(old_price: Decimal, new_price: Decimal) -> i32 {
    ((old_price - new_price) / old_price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0)
}
