use northfall_core::config::ExecutorConfig;
use northfall_core::job::{BackendCommand, JobPayload};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Number of job records kept in memory.
pub const JOB_RETENTION: usize = 50;

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,
    pub contract_id: String,
    pub command: BackendCommand,
    pub status: JobStatus,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl JobRecord {
    pub fn started(payload: &JobPayload) -> Self {
        Self {
            job_id: payload.job_id.clone(),
            contract_id: payload.contract_id.clone(),
            command: payload.command,
            status: JobStatus::Running,
            started_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            exit_code: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SseMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseMessage {
    JobStarted {
        job_id: String,
        command: BackendCommand,
    },
    JobFinished {
        job_id: String,
        status: JobStatus,
    },
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Working directory jobs run in.
    pub root: PathBuf,
    pub executor: Arc<ExecutorConfig>,
    /// Newest first, capped at [`JOB_RETENTION`].
    pub job_history: Arc<Mutex<Vec<JobRecord>>>,
    /// Contract ids with a job in flight.
    pub active_contracts: Arc<Mutex<HashSet<String>>>,
    pub event_tx: broadcast::Sender<SseMessage>,
}

impl AppState {
    pub fn new(root: PathBuf, executor: ExecutorConfig) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            root,
            executor: Arc::new(executor),
            job_history: Arc::new(Mutex::new(Vec::new())),
            active_contracts: Arc::new(Mutex::new(HashSet::new())),
            event_tx: tx,
        }
    }

    /// Reserve `contract_id` for a new job. Returns `false` if one is
    /// already running for it.
    pub async fn claim_contract(&self, contract_id: &str) -> bool {
        self.active_contracts
            .lock()
            .await
            .insert(contract_id.to_string())
    }

    pub async fn release_contract(&self, contract_id: &str) {
        self.active_contracts.lock().await.remove(contract_id);
    }

    pub async fn record_started(&self, record: JobRecord) {
        let _ = self.event_tx.send(SseMessage::JobStarted {
            job_id: record.job_id.clone(),
            command: record.command,
        });
        let mut history = self.job_history.lock().await;
        history.insert(0, record);
        history.truncate(JOB_RETENTION);
    }

    pub async fn record_finished(&self, job_id: &str, status: JobStatus, exit_code: Option<i32>) {
        {
            let mut history = self.job_history.lock().await;
            if let Some(rec) = history.iter_mut().find(|r| r.job_id == job_id) {
                rec.status = status.clone();
                rec.completed_at = Some(chrono::Utc::now().to_rfc3339());
                rec.exit_code = exit_code;
            }
        }
        let _ = self.event_tx.send(SseMessage::JobFinished {
            job_id: job_id.to_string(),
            status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use northfall_core::job::JobContext;

    fn state() -> AppState {
        AppState::new(PathBuf::from("/tmp/test"), ExecutorConfig::default())
    }

    #[test]
    fn new_state_stores_root() {
        assert_eq!(state().root, PathBuf::from("/tmp/test"));
    }

    #[tokio::test]
    async fn contract_claim_is_exclusive_until_released() {
        let app = state();
        assert!(app.claim_contract("c-1").await);
        assert!(!app.claim_contract("c-1").await);
        assert!(app.claim_contract("c-2").await);
        app.release_contract("c-1").await;
        assert!(app.claim_contract("c-1").await);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let app = state();
        let ctx = JobContext::new("u", "c", "escrow");
        let mut last_id = String::new();
        for _ in 0..(JOB_RETENTION + 5) {
            let payload = ctx.payload(BackendCommand::Build);
            last_id = payload.job_id.clone();
            app.record_started(JobRecord::started(&payload)).await;
        }
        let history = app.job_history.lock().await;
        assert_eq!(history.len(), JOB_RETENTION);
        assert_eq!(history[0].job_id, last_id);
    }

    #[tokio::test]
    async fn record_finished_updates_status_and_emits_event() {
        let app = state();
        let mut rx = app.event_tx.subscribe();
        let payload = JobContext::new("u", "c", "escrow").payload(BackendCommand::Test);
        app.record_started(JobRecord::started(&payload)).await;
        app.record_finished(&payload.job_id, JobStatus::Failed, Some(2))
            .await;

        let history = app.job_history.lock().await;
        assert_eq!(history[0].status, JobStatus::Failed);
        assert_eq!(history[0].exit_code, Some(2));
        assert!(history[0].completed_at.is_some());

        assert!(matches!(rx.recv().await.unwrap(), SseMessage::JobStarted { .. }));
        assert!(matches!(
            rx.recv().await.unwrap(),
            SseMessage::JobFinished {
                status: JobStatus::Failed,
                ..
            }
        ));
    }
}
