//! Clipflow core: job data model, task state machine and orchestrator, with no IO.
mod effect;
mod finalize;
mod history;
mod model;
mod msg;
mod request;
mod state;
mod tasks;
mod update;
mod view_model;

pub use effect::{Effect, FINALIZE_DELAY};
pub use finalize::{finalize, format_duration, DownloadRef, ResultView, DOWNLOAD_PREFIX};
pub use history::{display_title, HistoryCache, HistoryEntry, HISTORY_CAPACITY};
pub use model::{
    FormatOption, JobId, JobResult, JobState, JobStatusEvent, MediaInfo, RequestTicket, TaskId,
    TaskState, TaskStatus, UnknownTaskId,
};
pub use msg::Msg;
pub use request::{
    build_job_request, subtitles_allowed, validate_url, JobFields, JobRequest, ValidationError,
    AUDIO_ONLY, SUBTITLE_DURATION_LIMIT_SECS,
};
pub use state::{AppState, Notice, NoticeKind, Phase};
pub use tasks::{TaskBoard, TaskView, SKIPPED_DETAIL};
pub use update::update;
pub use view_model::{AppViewModel, FormView, HistoryRowView, MediaSummary};
