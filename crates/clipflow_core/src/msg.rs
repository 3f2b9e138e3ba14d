use crate::history::HistoryEntry;
use crate::model::{JobId, JobResult, JobStatusEvent, MediaInfo, RequestTicket};
use crate::state::Notice;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the source URL.
    UrlChanged(String),
    /// User asked to look up formats for the current URL.
    FetchInfoClicked,
    /// Format discovery finished.
    MediaInfoLoaded {
        ticket: RequestTicket,
        result: Result<MediaInfo, Notice>,
    },
    VideoQualitySelected(String),
    AudioQualitySelected(String),
    CredentialChanged(String),
    SubtitlesToggled(bool),
    TranslateToggled(bool),
    /// User submitted the configured job.
    StartClicked,
    /// Job submission finished.
    JobSubmitted {
        ticket: RequestTicket,
        result: Result<JobId, Notice>,
    },
    /// A status snapshot arrived on the push channel.
    SnapshotReceived {
        job_id: JobId,
        event: JobStatusEvent,
    },
    /// The push channel failed or ended before a terminal snapshot.
    StreamFailed { job_id: JobId, notice: Notice },
    /// The post-completion delay elapsed.
    FinalizeDue { job_id: JobId, result: JobResult },
    /// Restore history from the persistent slot.
    HistoryRestored(Vec<HistoryEntry>),
    /// Restore the credential from the persistent slot.
    CredentialRestored(String),
    NoticeDismissed,
    /// Back to URL entry, abandoning any job in flight.
    ResetClicked,
    NoOp,
}
