//! Process-wide timer driving the background jobs.
//!
//! Wraps the spawn-an-interval-loop pattern behind one place, so jobs stay
//! zero-argument async tasks and tests can call them directly or drive the
//! loop under a paused clock.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` every `period`, starting one full period after startup.
    /// The task owns its own failure handling; nothing it does can tear the
    /// loop down.
    pub fn every<F, Fut>(&mut self, name: &'static str, period: Duration, task: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of tokio's interval completes immediately;
            // consume it so the schedule matches the configured cadence.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                tracing::info!("Scheduled task '{}' triggered", name);
                task().await;
            }
        });

        tracing::info!(
            "Scheduled task '{}' every {}s",
            name,
            period.as_secs()
        );
        self.tasks.push((name, handle));
    }

    /// Abort all scheduled loops. In-flight task bodies are cancelled at the
    /// next await point.
    pub fn shutdown(self) {
        for (name, handle) in self.tasks {
            tracing::info!("Stopping scheduled task '{}'", name);
            handle.abort();
        }
    }
}
