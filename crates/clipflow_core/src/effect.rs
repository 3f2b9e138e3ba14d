use std::time::Duration;

use crate::history::HistoryEntry;
use crate::model::{JobId, JobResult, RequestTicket};
use crate::request::JobRequest;

/// Pause between a `completed` snapshot and showing the result, so the last
/// progress transition can finish on screen.
pub const FINALIZE_DELAY: Duration = Duration::from_millis(500);

/// Work the orchestrator asks the outside world to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Answered by `Msg::MediaInfoLoaded` carrying the same ticket.
    FetchMediaInfo { ticket: RequestTicket, url: String },
    /// Overwrite the persisted credential slot.
    StoreCredential { credential: String },
    /// Answered by `Msg::JobSubmitted` carrying the same ticket.
    SubmitJob {
        ticket: RequestTicket,
        request: JobRequest,
    },
    /// Open the push channel for `job_id`, releasing any other subscription first.
    OpenSubscription { job_id: JobId },
    CloseSubscription { job_id: JobId },
    /// Deliver `Msg::FinalizeDue` after `delay`.
    ScheduleFinalize {
        job_id: JobId,
        result: JobResult,
        delay: Duration,
    },
    /// Rewrite the persisted history with `entries`, most recent first.
    PersistHistory { entries: Vec<HistoryEntry> },
}
