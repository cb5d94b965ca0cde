//! WebSocket link between the terminal's job queue and the job server.
//!
//! Queued payloads go out as JSON text frames; completion frames coming back
//! are pushed onto the completion stream. Payloads queued while the link is
//! down wait in the queue until it reconnects.

use futures_util::{SinkExt, StreamExt};
use northfall_core::dispatch::{CompletionSender, JobQueue};
use northfall_core::job::JobCompletionPayload;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection stopped being pumped.
#[derive(Debug, PartialEq, Eq)]
enum LinkEnd {
    /// The terminal dropped its dispatcher or its completion listener.
    Shutdown,
    /// The server went away; reconnect.
    Lost,
}

/// Drive the link on a background task until the terminal shuts down.
pub fn spawn(url: String, queue: JobQueue, completions: CompletionSender) -> JoinHandle<()> {
    tokio::spawn(run(url, queue, completions))
}

async fn run(url: String, mut queue: JobQueue, completions: CompletionSender) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                info!(url = %url, "connected to job server");
                backoff = INITIAL_BACKOFF;
                if pump(socket, &mut queue, &completions).await == LinkEnd::Shutdown {
                    debug!("job link shut down");
                    return;
                }
                warn!(url = %url, "job server connection lost");
            }
            Err(e) => {
                warn!(url = %url, error = %e, retry_in = ?backoff, "job server unreachable");
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

async fn pump(socket: Socket, queue: &mut JobQueue, completions: &CompletionSender) -> LinkEnd {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            job = queue.recv() => {
                let Some(payload) = job else {
                    let _ = sink.close().await;
                    return LinkEnd::Shutdown;
                };
                let json = match serde_json::to_string(&payload) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(job_id = %payload.job_id, error = %e, "failed to encode job");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!(job_id = %payload.job_id, error = %e, "job submission lost");
                    return LinkEnd::Lost;
                }
                debug!(job_id = %payload.job_id, command = %payload.command, "job submitted");
            }
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<JobCompletionPayload>(text.as_str()) {
                        Ok(frame) => {
                            if !completions.deliver(frame) {
                                return LinkEnd::Shutdown;
                            }
                        }
                        Err(e) => warn!(error = %e, "malformed completion frame skipped"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => return LinkEnd::Lost,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "job socket error");
                    return LinkEnd::Lost;
                }
            }
        }
    }
}
