//! Audit-trail recorder: one sync_logs row per orchestration run.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::sync_logs::{self, RunStatus};

/// Job type values recorded in sync_logs
pub mod job_types {
    pub const PRODUCTS: &str = "PRODUCTS";
}

/// Counters aggregated over one run's item loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub updated: i32,
    pub created: i32,
    pub failed: i32,
}

/// Terminal state of a run, written exactly once
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Success {
        counters: RunCounters,
        duration_ms: i64,
        message: String,
    },
    Failed {
        message: String,
        duration_ms: i64,
    },
}

#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Create the RUNNING row for a new run and return its id.
    async fn start_run(
        &self,
        job_type: &str,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;

    /// Transition a RUNNING row to its terminal state. Called once per run;
    /// a row already in a terminal state must be left untouched.
    async fn finish_run(
        &self,
        log_id: i32,
        outcome: RunOutcome,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct SeaOrmSyncLogStore {
    db: DatabaseConnection,
}

impl SeaOrmSyncLogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncLogStore for SeaOrmSyncLogStore {
    async fn start_run(
        &self,
        job_type: &str,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let new_log = sync_logs::ActiveModel {
            job_type: Set(job_type.to_string()),
            status: Set(RunStatus::Running),
            started_at: Set(Utc::now().into()),
            products_updated: Set(0),
            products_created: Set(0),
            products_failed: Set(0),
            ..Default::default()
        };

        let inserted = new_log.insert(&self.db).await?;
        Ok(inserted.id)
    }

    async fn finish_run(
        &self,
        log_id: i32,
        outcome: RunOutcome,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(log) = sync_logs::Entity::find_by_id(log_id).one(&self.db).await? else {
            return Err(format!("sync_logs row {} not found", log_id).into());
        };

        if log.status != RunStatus::Running {
            tracing::warn!(
                "sync_logs row {} already finalized as {:?}, ignoring",
                log_id,
                log.status
            );
            return Ok(());
        }

        let mut active_model: sync_logs::ActiveModel = log.into();
        active_model.completed_at = Set(Some(Utc::now().into()));

        match outcome {
            RunOutcome::Success {
                counters,
                duration_ms,
                message,
            } => {
                active_model.status = Set(RunStatus::Success);
                active_model.products_updated = Set(counters.updated);
                active_model.products_created = Set(counters.created);
                active_model.products_failed = Set(counters.failed);
                active_model.duration_ms = Set(Some(duration_ms));
                active_model.message = Set(Some(message));
            }
            RunOutcome::Failed {
                message,
                duration_ms,
            } => {
                active_model.status = Set(RunStatus::Failed);
                active_model.duration_ms = Set(Some(duration_ms));
                active_model.message = Set(Some(message));
            }
        }

        active_model.update(&self.db).await?;
        Ok(())
    }
}
