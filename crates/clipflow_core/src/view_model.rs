use crate::finalize::{DownloadRef, ResultView};
use crate::history::{display_title, HistoryEntry};
use crate::model::{FormatOption, JobId};
use crate::state::{Notice, Phase};
use crate::tasks::TaskView;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub url: String,
    pub notice: Option<Notice>,
    pub media: Option<MediaSummary>,
    /// Starts with the audio-only sentinel, then discovered video formats.
    pub video_options: Vec<FormatOption>,
    pub audio_options: Vec<FormatOption>,
    pub form: FormView,
    pub job_id: Option<JobId>,
    /// Empty unless a job is being monitored.
    pub tasks: Vec<TaskView>,
    pub result: Option<ResultView>,
    pub history: Vec<HistoryRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSummary {
    pub title: String,
    pub duration: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormView {
    pub video_quality: String,
    pub audio_quality: String,
    pub has_credential: bool,
    pub gen_subtitles: bool,
    pub subtitles_enabled: bool,
    /// Shown when subtitles are disabled because the media is too long.
    pub duration_warning: bool,
    pub credential_visible: bool,
    pub translate_subs: bool,
    pub translate_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub title: String,
    pub media: DownloadRef,
    pub subtitles: Option<DownloadRef>,
}

impl HistoryRowView {
    pub(crate) fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            title: display_title(&entry.title),
            media: DownloadRef::new(&entry.filename),
            subtitles: entry.subtitle_filename.as_deref().map(DownloadRef::new),
        }
    }
}
