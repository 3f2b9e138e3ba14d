use std::sync::Arc;
use std::time::Duration;

use clipflow_core::{JobId, JobRequest, JobResult, RequestTicket};
use clipflow_logging::clip_debug;
use tokio::sync::mpsc;

use crate::backend::ConversionBackend;
use crate::monitor::ProgressMonitor;
use crate::EngineEvent;

/// Runs backend calls as tasks on the current tokio runtime and reports their
/// outcomes as [`EngineEvent`]s in completion order.
///
/// Every method that starts work must be called from inside a runtime. A
/// current-thread runtime keeps all work on one thread.
pub struct EngineHandle {
    backend: Arc<dyn ConversionBackend>,
    monitor: ProgressMonitor,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    event_rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn ConversionBackend>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            monitor: ProgressMonitor::new(),
            event_tx,
            event_rx,
        }
    }

    pub fn backend(&self) -> Arc<dyn ConversionBackend> {
        self.backend.clone()
    }

    /// The outcome comes back as `MediaInfoLoaded` tagged with `ticket`.
    pub fn fetch_media_info(&self, ticket: RequestTicket, url: String) {
        let backend = self.backend.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_media_info(&url).await;
            let _ = event_tx.send(EngineEvent::MediaInfoLoaded { ticket, result });
        });
    }

    /// The outcome comes back as `JobSubmitted` tagged with `ticket`.
    pub fn submit_job(&self, ticket: RequestTicket, request: JobRequest) {
        let backend = self.backend.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = backend.submit_job(&request).await;
            let _ = event_tx.send(EngineEvent::JobSubmitted { ticket, result });
        });
    }

    /// Subscribes to `job_id`, closing any other subscription first.
    pub fn open_subscription(&mut self, job_id: JobId) {
        self.monitor
            .open(job_id, self.backend.clone(), self.event_tx.clone());
    }

    pub fn close_subscription(&mut self, job_id: &JobId) {
        self.monitor.close(job_id);
    }

    pub fn subscribed_job(&self) -> Option<&JobId> {
        self.monitor.active_job()
    }

    /// Emits `FinalizeDue` once `delay` has passed.
    pub fn schedule_finalize(&self, job_id: JobId, result: JobResult, delay: Duration) {
        let event_tx = self.event_tx.clone();
        clip_debug!("finalizing {} in {:?}", job_id, delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(EngineEvent::FinalizeDue { job_id, result });
        });
    }

    /// Waits for the next event.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Releases any open subscription.
    pub fn shutdown(&mut self) {
        self.monitor.close_all();
    }
}
