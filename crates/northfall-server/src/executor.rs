//! Runs one backend job as a subprocess and streams its output as
//! completion frames.
//!
//! Every job produces, in order: one `status` frame, any number of
//! `stdout`/`stderr` frames, and exactly one terminal `success` or
//! `failure` frame. The terminal frame is returned rather than sent, so the
//! caller can release the job's contract before the client sees it.

use northfall_core::job::{JobCompletionPayload, JobPayload, SocketDataKind};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no program configured for {0}")]
    NotConfigured(String),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture {0}")]
    Capture(&'static str),

    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobExit {
    Succeeded,
    /// Non-zero exit, or `None` when the process never produced a status.
    Failed(Option<i32>),
}

impl JobExit {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobExit::Succeeded => Some(0),
            JobExit::Failed(code) => *code,
        }
    }
}

/// Run `payload` to completion, re-running failed attempts while
/// `retryCount` is below `max_retries`.
///
/// Non-terminal frames go to `tx`; a closed receiver does not stop the job.
/// Returns how the job ended and its terminal frame.
pub async fn run_job(
    mut payload: JobPayload,
    argv: Option<Vec<String>>,
    cwd: &Path,
    max_retries: u32,
    tx: mpsc::Sender<JobCompletionPayload>,
) -> (JobExit, JobCompletionPayload) {
    let _ = tx
        .send(payload.completion(
            SocketDataKind::Status,
            format!("{} started", payload.command),
        ))
        .await;

    let Some(argv) = argv.filter(|a| !a.is_empty()) else {
        let err = ExecError::NotConfigured(payload.command.to_string());
        warn!(job_id = %payload.job_id, error = %err, "job rejected");
        return (
            JobExit::Failed(None),
            payload.completion(SocketDataKind::Failure, err.to_string()),
        );
    };

    loop {
        let start = Instant::now();
        let attempt = run_once(&payload, &argv, cwd, &tx).await;
        let elapsed = start.elapsed().as_secs_f64();

        let (exit, message) = match attempt {
            Ok(0) => {
                info!(job_id = %payload.job_id, elapsed, "job succeeded");
                return (
                    JobExit::Succeeded,
                    payload.completion(SocketDataKind::Success, "exit code 0"),
                );
            }
            Ok(code) => (JobExit::Failed(Some(code)), format!("exit code {code}")),
            Err(e) => (JobExit::Failed(None), e.to_string()),
        };

        let retries = payload.retry_count.unwrap_or(0);
        if retries < max_retries {
            warn!(job_id = %payload.job_id, retries, reason = %message, "job failed; retrying");
            payload.retry_count = Some(retries + 1);
            let _ = tx
                .send(payload.completion(
                    SocketDataKind::Status,
                    format!("{message}; retrying (attempt {})", retries + 2),
                ))
                .await;
            continue;
        }

        warn!(job_id = %payload.job_id, elapsed, reason = %message, "job failed");
        return (exit, payload.completion(SocketDataKind::Failure, message));
    }
}

/// One subprocess attempt. Returns the exit code, `-1` if killed by a
/// signal.
async fn run_once(
    payload: &JobPayload,
    argv: &[String],
    cwd: &Path,
    tx: &mpsc::Sender<JobCompletionPayload>,
) -> Result<i32, ExecError> {
    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(cwd)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: argv[0].clone(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or(ExecError::Capture("stdout"))?;
    let stderr = child.stderr.take().ok_or(ExecError::Capture("stderr"))?;

    let stdout_task = tokio::spawn(forward_lines(
        stdout,
        SocketDataKind::Stdout,
        payload.clone(),
        tx.clone(),
    ));
    let stderr_task = tokio::spawn(forward_lines(
        stderr,
        SocketDataKind::Stderr,
        payload.clone(),
        tx.clone(),
    ));

    let _ = tokio::join!(stdout_task, stderr_task);

    let status = child.wait().await.map_err(ExecError::Wait)?;
    Ok(status.code().unwrap_or(-1))
}

/// Send each line of `reader` as a `kind` frame until EOF. Bytes that are
/// not UTF-8 are replaced, so one bad line never hides the rest.
async fn forward_lines<R>(
    reader: R,
    kind: SocketDataKind,
    job: JobPayload,
    tx: mpsc::Sender<JobCompletionPayload>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.strip_suffix('\n').unwrap_or(&text);
                let line = line.strip_suffix('\r').unwrap_or(line);
                let _ = tx.send(job.completion(kind, line.to_string())).await;
            }
            Err(e) => {
                warn!(job_id = %job.job_id, stream = %kind, error = %e, "output read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use northfall_core::job::{BackendCommand, JobContext};

    fn payload() -> JobPayload {
        JobContext::new("u", "c", "escrow").payload(BackendCommand::Build)
    }

    async fn collect(
        payload: JobPayload,
        argv: Option<Vec<String>>,
        max_retries: u32,
    ) -> (JobExit, Vec<JobCompletionPayload>) {
        let (tx, mut rx) = mpsc::channel(64);
        let (exit, terminal) = run_job(payload, argv, Path::new("/tmp"), max_retries, tx).await;
        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            assert!(!frame.kind.is_terminal(), "terminal frame must be returned, not sent");
            frames.push(frame);
        }
        frames.push(terminal);
        (exit, frames)
    }

    fn sh(script: &str) -> Option<Vec<String>> {
        Some(vec!["sh".into(), "-c".into(), script.into()])
    }

    #[tokio::test]
    async fn successful_job_streams_stdout_then_success() {
        let (exit, frames) = collect(payload(), Some(vec!["echo".into(), "built".into()]), 0).await;
        assert_eq!(exit, JobExit::Succeeded);

        let kinds: Vec<_> = frames.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            [
                SocketDataKind::Status,
                SocketDataKind::Stdout,
                SocketDataKind::Success
            ]
        );
        assert_eq!(frames[0].lines, "NORTHFALL_BUILD started");
        assert_eq!(frames[1].lines, "built");
    }

    #[tokio::test]
    async fn stderr_lines_are_tagged() {
        let (_, frames) = collect(payload(), sh("echo warn >&2"), 0).await;
        assert!(frames
            .iter()
            .any(|f| f.kind == SocketDataKind::Stderr && f.lines == "warn"));
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_cut_off_output() {
        let (exit, frames) = collect(payload(), sh("printf 'a\\n\\377\\nafter\\r\\n'"), 0).await;
        assert_eq!(exit, JobExit::Succeeded);

        let stdout: Vec<_> = frames
            .iter()
            .filter(|f| f.kind == SocketDataKind::Stdout)
            .map(|f| f.lines.as_str())
            .collect();
        assert_eq!(stdout, ["a", "\u{FFFD}", "after"]);
    }

    #[tokio::test]
    async fn non_zero_exit_fails_with_code() {
        let (exit, frames) = collect(payload(), sh("exit 3"), 0).await;
        assert_eq!(exit, JobExit::Failed(Some(3)));
        let last = frames.last().unwrap();
        assert_eq!(last.kind, SocketDataKind::Failure);
        assert_eq!(last.lines, "exit code 3");
    }

    #[tokio::test]
    async fn missing_program_fails_without_spawning() {
        let (exit, frames) = collect(payload(), None, 3).await;
        assert_eq!(exit, JobExit::Failed(None));
        assert_eq!(frames.len(), 2);
        assert!(frames[1].lines.contains("no program configured for NORTHFALL_BUILD"));
    }

    #[tokio::test]
    async fn spawn_error_names_program() {
        let (exit, frames) =
            collect(payload(), Some(vec!["__nonexistent_command_xyz__".into()]), 0).await;
        assert_eq!(exit, JobExit::Failed(None));
        assert!(frames.last().unwrap().lines.contains("__nonexistent_command_xyz__"));
    }

    #[tokio::test]
    async fn failed_job_is_retried_up_to_limit() {
        let (exit, frames) = collect(payload(), sh("exit 1"), 2).await;
        assert_eq!(exit, JobExit::Failed(Some(1)));

        let retries = frames
            .iter()
            .filter(|f| f.kind == SocketDataKind::Status && f.lines.contains("retrying"))
            .count();
        assert_eq!(retries, 2);
        let last = frames.last().unwrap();
        assert_eq!(last.kind, SocketDataKind::Failure);
        assert_eq!(last.retry_count, Some(2));
        assert_eq!(
            frames.iter().filter(|f| f.kind.is_terminal()).count(),
            1
        );
    }
}
