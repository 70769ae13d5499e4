//! Verification job queue
//!
//! The interactions endpoint only acknowledges; the actual verification runs
//! here. Each queued job is handled by its own task so a slow RPC node never
//! holds up other users, and each task ends by delivering exactly one response.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::handler::{VerificationHandler, VerificationRequest};
use crate::platform::{InteractionToken, ResponseSink};

/// One deferred `verify` invocation
#[derive(Debug, Clone)]
pub struct VerificationJob {
    pub token: InteractionToken,
    pub request: VerificationRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("verification queue is full")]
    QueueFull,

    #[error("verification queue is closed")]
    Closed,
}

/// Sending half of the job queue
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<VerificationJob>,
}

impl Dispatcher {
    pub fn new(tx: mpsc::Sender<VerificationJob>) -> Self {
        Self { tx }
    }

    /// Enqueue without waiting; the caller has a hard acknowledgement deadline
    pub fn submit(&self, job: VerificationJob) -> Result<(), DispatchError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::QueueFull,
            TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

/// Start the worker that drains the queue
///
/// The worker returns once every `Dispatcher` clone is dropped and all
/// in-flight jobs have delivered their responses.
pub fn spawn_dispatcher(
    handler: Arc<VerificationHandler>,
    sink: Arc<dyn ResponseSink>,
    capacity: usize,
) -> (Dispatcher, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let worker = tokio::spawn(run(rx, handler, sink));
    (Dispatcher::new(tx), worker)
}

async fn run(
    mut rx: mpsc::Receiver<VerificationJob>,
    handler: Arc<VerificationHandler>,
    sink: Arc<dyn ResponseSink>,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    let handler = handler.clone();
                    let sink = sink.clone();
                    in_flight.spawn(async move {
                        process(job, &handler, sink.as_ref()).await;
                    });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "verification task panicked");
                }
            }
        }
    }

    info!(remaining = in_flight.len(), "verification queue closed, draining");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "verification task panicked");
        }
    }
}

/// Run one job to completion and deliver its response
pub async fn process(job: VerificationJob, handler: &VerificationHandler, sink: &dyn ResponseSink) {
    let user = job.request.invoking_user_id;
    let response = handler.handle(job.request).await;
    debug!(%user, ?response, success = response.is_success(), "verification finished");

    if let Err(e) = sink.deliver(&job.token, response).await {
        error!(%user, ?response, error = %e, "failed to deliver verification response");
    }
}
