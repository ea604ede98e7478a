//! Process configuration, read once from the environment at startup.

use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub catalog: CatalogSettings,
    pub sync: SyncSettings,
}

/// Marketplace API connection settings
#[derive(Clone, Debug)]
pub struct CatalogSettings {
    pub base_url: String,
    pub api_key: String,
    pub partner_tag: String,
}

/// Sync and deal-lifecycle tuning knobs
#[derive(Clone, Debug)]
pub struct SyncSettings {
    /// Seconds between catalog sync runs
    pub sync_interval_secs: u64,
    /// Seconds between expired-deal cleanup sweeps
    pub cleanup_interval_secs: u64,
    /// Minimum gap between marketplace calls within a run
    pub rate_limit_ms: u64,
    /// Per-item timeout around one marketplace fetch
    pub fetch_timeout_secs: u64,
    /// Worker pool width for the per-product loop
    pub concurrency: usize,
    /// Minimum rounded discount for a price drop to become a deal
    pub deal_threshold_percent: i32,
    /// Deal window length, start_date to end_date
    pub deal_window_days: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_interval_secs: 21_600, // every 6 hours
            cleanup_interval_secs: 86_400, // daily
            rate_limit_ms: 1_000,
            fetch_timeout_secs: 30,
            concurrency: 4,
            deal_threshold_percent: 10,
            deal_window_days: 7,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

        let catalog = CatalogSettings {
            base_url: env::var("MARKETPLACE_BASE_URL")
                .unwrap_or_else(|_| "https://api.marketplace.example.com/v1".to_string()),
            api_key: env::var("MARKETPLACE_API_KEY")
                .map_err(|_| "MARKETPLACE_API_KEY must be set")?,
            partner_tag: env::var("MARKETPLACE_PARTNER_TAG").unwrap_or_default(),
        };

        let defaults = SyncSettings::default();
        let sync = SyncSettings {
            sync_interval_secs: env_or("SYNC_INTERVAL_SECS", defaults.sync_interval_secs),
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval_secs),
            rate_limit_ms: env_or("SYNC_RATE_LIMIT_MS", defaults.rate_limit_ms),
            fetch_timeout_secs: env_or("SYNC_FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs),
            concurrency: env_or("SYNC_CONCURRENCY", defaults.concurrency).max(1),
            deal_threshold_percent: env_or(
                "DEAL_THRESHOLD_PERCENT",
                defaults.deal_threshold_percent,
            ),
            deal_window_days: env_or("DEAL_WINDOW_DAYS", defaults.deal_window_days),
        };

        Ok(Self {
            database_url,
            port: env_or("PORT", 3000),
            catalog,
            sync,
        })
    }
}

/// Parse an env var, falling back to the default when unset or malformed.
fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring malformed {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
