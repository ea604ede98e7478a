pub mod catalog_sync;
pub mod deal_cleanup;
