use crate::error::{NorthfallError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// BackendCommand
// ---------------------------------------------------------------------------

/// Job identifiers understood by the backend build system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackendCommand {
    #[serde(rename = "NORTHFALL_BUILD")]
    Build,
    #[serde(rename = "NORTHFALL_TEST")]
    Test,
    #[serde(rename = "NORTHFALL_DEPLOY_DEVNET")]
    DeployDevnet,
    #[serde(rename = "NORTHFALL_DEPLOY_MAINNET")]
    DeployMainnet,
    #[serde(rename = "NORTHFALL_VERIFY")]
    Verify,
}

impl BackendCommand {
    pub fn all() -> &'static [BackendCommand] {
        &[
            BackendCommand::Build,
            BackendCommand::Test,
            BackendCommand::DeployDevnet,
            BackendCommand::DeployMainnet,
            BackendCommand::Verify,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendCommand::Build => "NORTHFALL_BUILD",
            BackendCommand::Test => "NORTHFALL_TEST",
            BackendCommand::DeployDevnet => "NORTHFALL_DEPLOY_DEVNET",
            BackendCommand::DeployMainnet => "NORTHFALL_DEPLOY_MAINNET",
            BackendCommand::Verify => "NORTHFALL_VERIFY",
        }
    }

    /// Whether the job server accepts this command over the socket.
    /// `Verify` is part of the vocabulary but has no submission path yet.
    pub fn is_submittable(self) -> bool {
        !matches!(self, BackendCommand::Verify)
    }
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendCommand {
    type Err = NorthfallError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BackendCommand::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| NorthfallError::UnknownBackendCommand(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SocketDataKind
// ---------------------------------------------------------------------------

/// Framing of a completion payload, so the terminal can render each kind
/// distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketDataKind {
    Stdout,
    Stderr,
    Status,
    Success,
    Failure,
}

impl SocketDataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SocketDataKind::Stdout => "stdout",
            SocketDataKind::Stderr => "stderr",
            SocketDataKind::Status => "status",
            SocketDataKind::Success => "success",
            SocketDataKind::Failure => "failure",
        }
    }

    /// `true` for the last frame the server sends for a job.
    pub fn is_terminal(self) -> bool {
        matches!(self, SocketDataKind::Success | SocketDataKind::Failure)
    }
}

impl fmt::Display for SocketDataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SocketDataKind {
    type Err = NorthfallError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(SocketDataKind::Stdout),
            "stderr" => Ok(SocketDataKind::Stderr),
            "status" => Ok(SocketDataKind::Status),
            "success" => Ok(SocketDataKind::Success),
            "failure" => Ok(SocketDataKind::Failure),
            _ => Err(NorthfallError::UnknownSocketDataKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// JobContext
// ---------------------------------------------------------------------------

/// Who is submitting, and against which contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobContext {
    pub user_id: String,
    pub contract_id: String,
    pub contract_name: String,
}

impl JobContext {
    pub fn new(
        user_id: impl Into<String>,
        contract_id: impl Into<String>,
        contract_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            contract_id: contract_id.into(),
            contract_name: contract_name.into(),
        }
    }

    /// Stamp a fresh submission with a new job id and the current time.
    pub fn payload(&self, command: BackendCommand) -> JobPayload {
        JobPayload {
            user_id: self.user_id.clone(),
            contract_id: self.contract_id.clone(),
            contract_name: self.contract_name.clone(),
            timestamp: now_millis(),
            job_id: new_job_id(),
            retry_count: None,
            command,
        }
    }
}

pub fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// JobPayload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub user_id: String,
    pub contract_id: String,
    pub contract_name: String,
    pub timestamp: i64,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    pub command: BackendCommand,
}

impl JobPayload {
    /// Server-side admission check for an incoming submission.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(NorthfallError::InvalidPayload("userId is empty".into()));
        }
        if self.contract_id.trim().is_empty() {
            return Err(NorthfallError::InvalidPayload("contractId is empty".into()));
        }
        if self.job_id.trim().is_empty() {
            return Err(NorthfallError::InvalidPayload("jobId is empty".into()));
        }
        if !self.command.is_submittable() {
            return Err(NorthfallError::InvalidPayload(format!(
                "command {} is not accepted",
                self.command
            )));
        }
        Ok(())
    }

    /// Build a completion frame carrying this job's identity fields.
    pub fn completion(&self, kind: SocketDataKind, lines: impl Into<String>) -> JobCompletionPayload {
        JobCompletionPayload {
            user_id: self.user_id.clone(),
            contract_id: self.contract_id.clone(),
            contract_name: self.contract_name.clone(),
            timestamp: now_millis(),
            job_id: self.job_id.clone(),
            retry_count: self.retry_count,
            lines: lines.into(),
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// JobCompletionPayload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCompletionPayload {
    pub user_id: String,
    pub contract_id: String,
    pub contract_name: String,
    pub timestamp: i64,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    pub lines: String,
    #[serde(rename = "type")]
    pub kind: SocketDataKind,
}
