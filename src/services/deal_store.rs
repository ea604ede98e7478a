//! Deal persistence seam.
//!
//! The sync path keys deals by product_id (unique index), so the upsert is
//! idempotent per product. Rows are never deleted here, only deactivated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{deals, prelude::*};

#[derive(Debug, Clone)]
pub struct DealUpsert {
    pub product_id: i32,
    pub title: String,
    pub discount_percent: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[async_trait]
pub trait DealStore: Send + Sync {
    /// Create or refresh the deal for one product. An existing row keeps its
    /// title and window; only `discount_percent` and `is_active` are updated.
    async fn upsert_for_product(
        &self,
        upsert: DealUpsert,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Set-based deactivation of every deal whose window has passed.
    /// Returns rows affected.
    async fn deactivate_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct SeaOrmDealStore {
    db: DatabaseConnection,
}

impl SeaOrmDealStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DealStore for SeaOrmDealStore {
    async fn upsert_for_product(
        &self,
        upsert: DealUpsert,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let existing = Deals::find()
            .filter(deals::Column::ProductId.eq(upsert.product_id))
            .one(&self.db)
            .await?;

        match existing {
            Some(deal) => {
                let mut active_model: deals::ActiveModel = deal.into();
                active_model.discount_percent = Set(upsert.discount_percent);
                active_model.is_active = Set(true);
                active_model.update(&self.db).await?;
            }
            None => {
                let new_deal = deals::ActiveModel {
                    product_id: Set(upsert.product_id),
                    title: Set(upsert.title),
                    discount_percent: Set(upsert.discount_percent),
                    start_date: Set(upsert.start_date.into()),
                    end_date: Set(upsert.end_date.into()),
                    is_active: Set(true),
                    ..Default::default()
                };
                new_deal.insert(&self.db).await?;
            }
        }

        Ok(())
    }

    async fn deactivate_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let result = Deals::update_many()
            .col_expr(deals::Column::IsActive, Expr::value(false))
            .filter(deals::Column::IsActive.eq(true))
            .filter(deals::Column::EndDate.lt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
