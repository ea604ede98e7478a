pub use super::deals::Entity as Deals;
pub use super::products::Entity as Products;
pub use super::sync_logs::Entity as SyncLogs;
