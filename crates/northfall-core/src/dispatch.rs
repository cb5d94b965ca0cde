//! The send-only job queue and the receive-only completion stream.
//!
//! Submitting a job and observing its outcome are two independent channels.
//! The only link between a submission and its completions is the `jobId` /
//! `contractId` pair carried on both payloads.

use crate::job::{JobCompletionPayload, JobPayload};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Accepts job submissions. `send` must not block and returns nothing:
/// delivery, retry, and backpressure belong to whatever drains the channel.
pub trait JobDispatcher {
    fn send(&self, payload: JobPayload);
}

impl<D: JobDispatcher + ?Sized> JobDispatcher for &D {
    fn send(&self, payload: JobPayload) {
        (**self).send(payload)
    }
}

impl<D: JobDispatcher + ?Sized> JobDispatcher for Box<D> {
    fn send(&self, payload: JobPayload) {
        (**self).send(payload)
    }
}

// ---------------------------------------------------------------------------
// Queue-backed dispatcher
// ---------------------------------------------------------------------------

/// Sending half of the job queue.
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<JobPayload>,
}

/// Receiving half of the job queue, drained by a transport.
#[derive(Debug)]
pub struct JobQueue {
    rx: mpsc::UnboundedReceiver<JobPayload>,
}

pub fn job_queue() -> (QueueDispatcher, JobQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueDispatcher { tx }, JobQueue { rx })
}

impl JobDispatcher for QueueDispatcher {
    fn send(&self, payload: JobPayload) {
        let job_id = payload.job_id.clone();
        match self.tx.send(payload) {
            Ok(()) => debug!(job_id = %job_id, "job queued"),
            Err(_) => warn!(job_id = %job_id, "job queue closed; submission dropped"),
        }
    }
}

impl JobQueue {
    pub async fn recv(&mut self) -> Option<JobPayload> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<JobPayload> {
        self.rx.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Completion stream
// ---------------------------------------------------------------------------

/// Producer side of the completion stream, held by a transport.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<JobCompletionPayload>,
}

/// Consumer side of the completion stream, held by the socket listener.
#[derive(Debug)]
pub struct CompletionStream {
    rx: mpsc::UnboundedReceiver<JobCompletionPayload>,
}

pub fn completion_stream() -> (CompletionSender, CompletionStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CompletionSender { tx }, CompletionStream { rx })
}

impl CompletionSender {
    /// Returns `false` once the listener has gone away.
    pub fn deliver(&self, payload: JobCompletionPayload) -> bool {
        self.tx.send(payload).is_ok()
    }
}

impl CompletionStream {
    pub async fn recv(&mut self) -> Option<JobCompletionPayload> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<JobCompletionPayload> {
        self.rx.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// Offline and recording dispatchers
// ---------------------------------------------------------------------------

/// Drops every submission. Used when no job server is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatcher;

impl JobDispatcher for NullDispatcher {
    fn send(&self, payload: JobPayload) {
        warn!(
            job_id = %payload.job_id,
            command = %payload.command,
            "offline: job not submitted"
        );
    }
}

/// Keeps every submission in memory. Clones share the same record, so a
/// test can hand one clone to the interpreter and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    sent: Rc<RefCell<Vec<JobPayload>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<JobPayload> {
        self.sent.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl JobDispatcher for RecordingDispatcher {
    fn send(&self, payload: JobPayload) {
        self.sent.borrow_mut().push(payload);
    }
}
