//! SeaORM Entity for catalog products
//!
//! Rows are created by the catalog CRUD; the sync engine only mutates the
//! pricing, rating and deal columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Marketplace catalog key (ASIN-style identifier)
    #[sea_orm(unique)]
    pub external_id: String,
    pub title: String,
    pub price: Decimal,
    /// Previous price, set only when a sync observes a price change
    pub old_price: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub review_count: i32,
    pub in_stock: bool,
    pub is_active: bool,
    /// True while an active deal row exists for this product
    pub is_deal: bool,
    pub discount_percent: Option<i32>,
    pub deal_expiry: Option<DateTimeWithTimeZone>,
    pub last_synced_at: Option<DateTimeWithTimeZone>,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::deals::Entity")]
    Deals,
}

impl Related<super::deals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
