//! Product persistence seam used by the sync engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{prelude::*, products};
use crate::services::catalog_client::DealCandidate;

/// The fields of a product the sync run reads up front. Taken once at run
/// start; later writes to the same rows are not re-read mid-run.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ProductSnapshot {
    pub id: i32,
    pub external_id: String,
    pub price: Decimal,
}

/// Column set written back after a successful marketplace fetch
#[derive(Debug, Clone)]
pub struct ProductSyncUpdate {
    pub price: Decimal,
    /// Previous stored price; `None` leaves the old_price column untouched
    pub old_price: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub review_count: i32,
    pub in_stock: bool,
    pub synced_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Active products in snapshot order (ascending id).
    async fn active_snapshot(
        &self,
    ) -> Result<Vec<ProductSnapshot>, Box<dyn std::error::Error + Send + Sync>>;

    async fn apply_sync_update(
        &self,
        product_id: i32,
        update: ProductSyncUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Mirror a qualifying deal onto the product row.
    async fn mark_deal(
        &self,
        product_id: i32,
        discount_percent: i32,
        deal_expiry: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>>;

    /// Insert a product discovered through the deals feed.
    async fn create_from_candidate(
        &self,
        candidate: &DealCandidate,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;

    /// Set-based reset of `is_deal`, `discount_percent` and `deal_expiry` on
    /// every product whose deal window has passed. Returns rows affected.
    async fn clear_expired_deals(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct SeaOrmProductStore {
    db: DatabaseConnection,
}

impl SeaOrmProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for SeaOrmProductStore {
    async fn active_snapshot(
        &self,
    ) -> Result<Vec<ProductSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
        let snapshot = Products::find()
            .select_only()
            .column(products::Column::Id)
            .column(products::Column::ExternalId)
            .column(products::Column::Price)
            .filter(products::Column::IsActive.eq(true))
            .order_by_asc(products::Column::Id)
            .into_model::<ProductSnapshot>()
            .all(&self.db)
            .await?;

        Ok(snapshot)
    }

    async fn apply_sync_update(
        &self,
        product_id: i32,
        update: ProductSyncUpdate,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let active_model = products::ActiveModel {
            id: Set(product_id),
            price: Set(update.price),
            old_price: match update.old_price {
                Some(previous) => Set(Some(previous)),
                None => NotSet,
            },
            rating: Set(update.rating),
            review_count: Set(update.review_count),
            in_stock: Set(update.in_stock),
            last_synced_at: Set(Some(update.synced_at.into())),
            ..Default::default()
        };

        active_model.update(&self.db).await?;
        Ok(())
    }

    async fn mark_deal(
        &self,
        product_id: i32,
        discount_percent: i32,
        deal_expiry: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let active_model = products::ActiveModel {
            id: Set(product_id),
            is_deal: Set(true),
            discount_percent: Set(Some(discount_percent)),
            deal_expiry: Set(Some(deal_expiry.into())),
            ..Default::default()
        };

        active_model.update(&self.db).await?;
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<i32>, Box<dyn std::error::Error + Send + Sync>> {
        let product = Products::find()
            .filter(products::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?;

        Ok(product.map(|p| p.id))
    }

    async fn create_from_candidate(
        &self,
        candidate: &DealCandidate,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let new_product = products::ActiveModel {
            external_id: Set(candidate.external_id.clone()),
            title: Set(candidate.title.clone()),
            price: Set(candidate.price),
            review_count: Set(0),
            in_stock: Set(true),
            is_active: Set(true),
            is_deal: Set(false),
            ..Default::default()
        };

        let inserted = new_product.insert(&self.db).await?;
        Ok(inserted.id)
    }

    async fn clear_expired_deals(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let result = Products::update_many()
            .col_expr(products::Column::IsDeal, Expr::value(false))
            .col_expr(products::Column::DiscountPercent, Expr::value(None::<i32>))
            .col_expr(
                products::Column::DealExpiry,
                Expr::value(None::<DateTimeWithTimeZone>),
            )
            .filter(products::Column::IsDeal.eq(true))
            .filter(products::Column::DealExpiry.lt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
