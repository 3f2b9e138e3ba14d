use clipflow_core::{Effect, Msg, RequestTicket};
use clipflow_engine::{EngineEvent, EngineHandle, SlotStore};
use clipflow_logging::{clip_info, clip_warn};

use super::persistence;

/// Carries out core effects on the engine and the slot store, and turns
/// engine events back into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    store: SlotStore,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: SlotStore) -> Self {
        Self { engine, store }
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchMediaInfo { ticket, url } => {
                    clip_info!("{}", describe_fetch(ticket, &url));
                    self.engine.fetch_media_info(ticket, url);
                }
                Effect::StoreCredential { credential } => {
                    persistence::save_credential(&self.store, &credential);
                }
                Effect::SubmitJob { ticket, request } => {
                    clip_info!("SubmitJob {} {:?}", ticket, request);
                    self.engine.submit_job(ticket, request);
                }
                Effect::OpenSubscription { job_id } => {
                    self.engine.open_subscription(job_id);
                }
                Effect::CloseSubscription { job_id } => {
                    self.engine.close_subscription(&job_id);
                }
                Effect::ScheduleFinalize {
                    job_id,
                    result,
                    delay,
                } => {
                    self.engine.schedule_finalize(job_id, result, delay);
                }
                Effect::PersistHistory { entries } => {
                    persistence::save_history(&self.store, &entries);
                }
            }
        }
    }

    /// Waits for the next engine event. `None` once the engine is gone.
    pub async fn next_msg(&mut self) -> Option<Msg> {
        self.engine.next_event().await.map(map_event)
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}

/// Source URLs are logged by length only.
fn describe_fetch(ticket: RequestTicket, url: &str) -> String {
    format!("FetchMediaInfo {ticket} url_len={}", url.len())
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::MediaInfoLoaded { ticket, result } => Msg::MediaInfoLoaded {
            ticket,
            result: result.map_err(|err| err.to_notice()),
        },
        EngineEvent::JobSubmitted { ticket, result } => Msg::JobSubmitted {
            ticket,
            result: result.map_err(|err| err.to_notice()),
        },
        EngineEvent::Snapshot { job_id, event } => Msg::SnapshotReceived { job_id, event },
        EngineEvent::StreamFailed { job_id, error } => {
            clip_warn!("Status stream for {} failed: {}", job_id, error);
            Msg::StreamFailed {
                job_id,
                notice: error.to_notice(),
            }
        }
        EngineEvent::FinalizeDue { job_id, result } => Msg::FinalizeDue { job_id, result },
    }
}
