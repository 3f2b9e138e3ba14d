//! Single-flight subscription to a job's status stream.

use std::sync::Arc;

use clipflow_core::JobId;
use clipflow_logging::{clear_active_job, clip_debug, clip_info, clip_warn, set_active_job};
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::backend::ConversionBackend;
use crate::{ClientError, EngineEvent};

/// An open push-channel subscription. Dropping it cancels the reader.
#[derive(Debug)]
pub struct Subscription {
    job_id: JobId,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Holds at most one subscription. Opening a new one first releases the old.
#[derive(Debug, Default)]
pub struct ProgressMonitor {
    current: Option<Subscription>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_job(&self) -> Option<&JobId> {
        self.current.as_ref().map(Subscription::job_id)
    }

    /// Opens the status stream for `job_id` and forwards its snapshots to `events`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn open(
        &mut self,
        job_id: JobId,
        backend: Arc<dyn ConversionBackend>,
        events: UnboundedSender<EngineEvent>,
    ) {
        if let Some(previous) = self.current.take() {
            clip_info!("releasing subscription for job {} before opening {}", previous.job_id, job_id);
            drop(previous);
        }

        set_active_job(job_id.as_str());
        clip_info!("opening status stream");
        let cancel = CancellationToken::new();
        tokio::spawn(forward_snapshots(
            job_id.clone(),
            backend,
            events,
            cancel.clone(),
        ));
        self.current = Some(Subscription {
            job_id,
            cancel,
        });
    }

    /// Releases the subscription if it belongs to `job_id`. Returns whether one was closed.
    pub fn close(&mut self, job_id: &JobId) -> bool {
        if self.active_job() != Some(job_id) {
            clip_debug!("no open subscription for job {}", job_id);
            return false;
        }
        self.current = None;
        clip_info!("status stream closed");
        clear_active_job();
        true
    }

    /// Releases whatever subscription is open.
    pub fn close_all(&mut self) {
        if self.current.take().is_some() {
            clear_active_job();
        }
    }
}

async fn forward_snapshots(
    job_id: JobId,
    backend: Arc<dyn ConversionBackend>,
    events: UnboundedSender<EngineEvent>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = backend.open_status_stream(&job_id) => opened,
    };
    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) => {
            clip_warn!("could not open status stream for {}: {}", job_id, error);
            let _ = events.send(EngineEvent::StreamFailed { job_id, error });
            return;
        }
    };

    let mut received = 0usize;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                clip_debug!("reader for {} cancelled after {} snapshots", job_id, received);
                return;
            }
            next = stream.next() => next,
        };
        match next {
            Some(Ok(event)) => {
                received += 1;
                let terminal = event.status.is_terminal();
                let snapshot = EngineEvent::Snapshot {
                    job_id: job_id.clone(),
                    event,
                };
                if events.send(snapshot).is_err() || terminal {
                    return;
                }
            }
            Some(Err(error)) => {
                clip_warn!("status stream for {} failed: {}", job_id, error);
                let _ = events.send(EngineEvent::StreamFailed { job_id, error });
                return;
            }
            None => {
                let error =
                    ClientError::Transport("status stream closed before the job finished".into());
                let _ = events.send(EngineEvent::StreamFailed { job_id, error });
                return;
            }
        }
    }
}
