use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use northfall_core::job::{JobCompletionPayload, JobPayload, SocketDataKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    executor::{self, JobExit},
    state::{AppState, JobRecord, JobStatus},
};

/// Outbound frames buffered per socket before job output applies
/// backpressure.
const OUTBOUND_BUFFER: usize = 256;

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// GET /api/jobs/ws: submit `JobPayload` frames, receive
/// `JobCompletionPayload` frames.
pub async fn job_socket(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<JobCompletionPayload>(OUTBOUND_BUFFER);

    // Single writer: job tasks only ever talk to the channel.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(s) => s,
                Err(e) => {
                    warn!(job_id = %frame.job_id, error = %e, "failed to encode completion");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                debug!("job socket closed by client");
                break;
            }
        }
    });

    info!("job socket connected");
    while let Some(msg) = stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let payload: JobPayload = match serde_json::from_str(text.as_str()) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "malformed job frame skipped");
                continue;
            }
        };
        submit(&app, payload, tx.clone()).await;
    }
    info!("job socket disconnected");
}

/// Admit one submission and run it in the background.
async fn submit(app: &AppState, payload: JobPayload, tx: mpsc::Sender<JobCompletionPayload>) {
    if let Err(e) = payload.validate() {
        warn!(job_id = %payload.job_id, error = %e, "job rejected");
        let _ = tx
            .send(payload.completion(SocketDataKind::Failure, e.to_string()))
            .await;
        return;
    }

    if !app.claim_contract(&payload.contract_id).await {
        warn!(
            job_id = %payload.job_id,
            contract_id = %payload.contract_id,
            "job rejected: contract busy"
        );
        let reason = format!(
            "a job is already running for contract '{}'",
            payload.contract_id
        );
        let _ = tx
            .send(payload.completion(SocketDataKind::Failure, reason))
            .await;
        return;
    }

    info!(job_id = %payload.job_id, command = %payload.command, "job accepted");
    app.record_started(JobRecord::started(&payload)).await;

    let app = app.clone();
    tokio::spawn(async move {
        let argv = app
            .executor
            .argv_for(payload.command)
            .map(<[String]>::to_vec);
        let job_id = payload.job_id.clone();
        let contract_id = payload.contract_id.clone();

        let (exit, terminal) = executor::run_job(
            payload,
            argv,
            &app.root,
            app.executor.max_retries,
            tx.clone(),
        )
        .await;

        let status = match exit {
            JobExit::Succeeded => JobStatus::Completed,
            JobExit::Failed(_) => JobStatus::Failed,
        };
        app.record_finished(&job_id, status, exit.exit_code()).await;
        // Free the contract before the client can see the job is over.
        app.release_contract(&contract_id).await;
        let _ = tx.send(terminal).await;
        info!(job_id = %job_id, "job cleanup");
    });
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// GET /api/jobs: recent jobs, newest first.
pub async fn list_jobs(State(app): State<AppState>) -> Json<Vec<JobRecord>> {
    Json(app.job_history.lock().await.clone())
}

/// GET /api/jobs/{job_id}
pub async fn get_job(
    Path(job_id): Path<String>,
    State(app): State<AppState>,
) -> Result<Json<JobRecord>, AppError> {
    let history = app.job_history.lock().await;
    history
        .iter()
        .find(|r| r.job_id == job_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("job not found: {job_id}")))
}
