use crate::output::{print_json, print_lines};
use crate::transport;
use anyhow::Context;
use northfall_core::config::Config;
use northfall_core::dispatch::{completion_stream, job_queue, CompletionStream, NullDispatcher};
use northfall_core::interpreter::{Interpreter, Outcome};
use northfall_core::job::SocketDataKind;
use northfall_core::session::TerminalSession;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Run `lines` in order through one fresh session and print the resulting log.
///
/// Without `wait`, action commands are answered locally but not submitted.
/// With it, each job must finish before the next line runs, since the server
/// takes one job per contract at a time. `timeout` bounds the whole run.
pub fn run(root: &Path, lines: &[String], wait: bool, timeout: u64, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let context = config.job_context();

    if !wait {
        let interpreter = Interpreter::new(NullDispatcher, context);
        let mut session = TerminalSession::new();
        for line in lines {
            session.submit(line, &interpreter);
        }
        return report(&session, json);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (dispatcher, queue) = job_queue();
        let (sender, mut completions) = completion_stream();
        let link = transport::spawn(config.server.url.clone(), queue, sender);
        let interpreter = Interpreter::new(dispatcher, context);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout);

        let mut session = TerminalSession::new();
        let mut failed = 0usize;
        let mut stopped = None;
        for line in lines {
            let Outcome::Dispatched { job_id, .. } = session.submit(line, &interpreter) else {
                continue;
            };
            let finished = tokio::time::timeout_at(
                deadline,
                wait_for_job(&job_id, &mut completions, &mut session),
            )
            .await;
            match finished {
                Ok(Some(SocketDataKind::Failure)) => failed += 1,
                Ok(Some(_)) => {}
                Ok(None) => {
                    stopped = Some(format!("job link closed before job {job_id} finished"));
                    break;
                }
                Err(_) => {
                    stopped = Some(format!("timed out after {timeout}s waiting for job {job_id}"));
                    break;
                }
            }
        }
        link.abort();

        report(&session, json)?;
        if let Some(reason) = stopped {
            anyhow::bail!(reason);
        }
        if failed > 0 {
            anyhow::bail!("{failed} job(s) failed");
        }
        Ok(())
    })
}

/// Apply completion frames for `job_id` until its terminal frame and return
/// that frame's kind. `None` if the stream ends first.
async fn wait_for_job(
    job_id: &str,
    completions: &mut CompletionStream,
    session: &mut TerminalSession,
) -> Option<SocketDataKind> {
    while let Some(frame) = completions.recv().await {
        if frame.job_id != job_id {
            debug!(job_id = %frame.job_id, "completion for another job ignored");
            continue;
        }
        session.apply_completion(&frame);
        if frame.kind.is_terminal() {
            return Some(frame.kind);
        }
    }
    None
}

fn report(session: &TerminalSession, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&session.log().all())
    } else {
        print_lines(session.log().all());
        Ok(())
    }
}
