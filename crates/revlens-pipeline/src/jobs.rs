//! In-process registry for triggered pipeline runs.
//!
//! Callers submit a future and get a job id back immediately; the work
//! runs on a spawned task and the registry records its lifecycle. State
//! lives in a concurrent map, so `get` and `list` never contend with a
//! running job.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use revlens_core::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// One tracked pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    pub state: JobState,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<String, Job>,
}

impl JobRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register and spawn a run, returning its id without waiting.
    pub fn submit<F>(self: &Arc<Self>, work: F) -> String
    where
        F: Future<Output = revlens_core::Result<()>> + Send + 'static,
    {
        let id = Uuid::new_v4().to_string();
        self.jobs.insert(
            id.clone(),
            Job {
                id: id.clone(),
                state: JobState::Queued,
                created_at: now_millis(),
                started_at: None,
                finished_at: None,
                error: None,
            },
        );

        let registry = Arc::clone(self);
        let job_id = id.clone();
        tokio::spawn(async move {
            registry.mark_running(&job_id);
            match work.await {
                Ok(()) => {
                    info!("Job {} succeeded", job_id);
                    registry.mark_finished(&job_id, None);
                }
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    registry.mark_finished(&job_id, Some(e.to_string()));
                }
            }
        });

        id
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every tracked job, newest submission first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|entry| entry.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    fn mark_running(&self, id: &str) {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            entry.state = JobState::Running;
            entry.started_at = Some(now_millis());
        }
    }

    fn mark_finished(&self, id: &str, error: Option<String>) {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            entry.state = if error.is_some() {
                JobState::Failed
            } else {
                JobState::Succeeded
            };
            entry.finished_at = Some(now_millis());
            entry.error = error;
        }
    }
}
