use std::fmt;

use crate::finalize::{finalize, ResultView};
use crate::history::{HistoryCache, HistoryEntry};
use crate::model::{JobId, JobResult, JobStatusEvent, MediaInfo, RequestTicket};
use crate::request::{subtitles_allowed, JobFields, ValidationError, AUDIO_ONLY};
use crate::tasks::TaskBoard;
use crate::view_model::{AppViewModel, FormView, HistoryRowView, MediaSummary};

/// Where the user is in the convert flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Input,
    Discovering,
    Configure,
    Submitting,
    Monitoring,
    /// Completed snapshot seen, waiting out the finalize delay.
    Finishing,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Backend,
    Transport,
    Job,
}

/// A blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for Notice {
    fn from(err: ValidationError) -> Self {
        Notice::new(NoticeKind::Validation, err.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            NoticeKind::Validation => "Invalid input",
            NoticeKind::Backend => "Server error",
            NoticeKind::Transport => "Connection error",
            NoticeKind::Job => "Job failed",
        };
        write!(f, "{prefix}: {}", self.message)
    }
}

#[derive(Clone, PartialEq, Eq, Default)]
pub(crate) struct ConfigForm {
    pub(crate) video_quality: String,
    pub(crate) audio_quality: String,
    pub(crate) credential: String,
    pub(crate) gen_subtitles: bool,
    pub(crate) translate_subs: bool,
    /// Set when the media is too long for subtitles.
    pub(crate) subtitles_locked: bool,
}

impl fmt::Debug for ConfigForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigForm")
            .field("video_quality", &self.video_quality)
            .field("audio_quality", &self.audio_quality)
            .field("has_credential", &!self.credential.is_empty())
            .field("gen_subtitles", &self.gen_subtitles)
            .field("translate_subs", &self.translate_subs)
            .field("subtitles_locked", &self.subtitles_locked)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveJob {
    pub(crate) id: JobId,
    pub(crate) board: TaskBoard,
}

/// Session-scoped context owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: Phase,
    url: String,
    media: Option<MediaInfo>,
    form: ConfigForm,
    job: Option<ActiveJob>,
    result: Option<ResultView>,
    history: HistoryCache,
    notice: Option<Notice>,
    /// Ticket of the discovery or submission request awaiting its reply.
    pending: Option<RequestTicket>,
    issued: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(|job| &job.id)
    }

    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        let media = self.media.as_ref().map(|info| MediaSummary {
            title: info.title.clone(),
            duration: crate::finalize::format_duration(info.duration),
            thumbnail: info.thumbnail.clone(),
        });

        let mut video_options = vec![crate::model::FormatOption {
            id: AUDIO_ONLY.to_string(),
            label: "No Video (Audio Only)".to_string(),
        }];
        let mut audio_options = Vec::new();
        if let Some(info) = &self.media {
            video_options.extend(info.video_formats.iter().cloned());
            audio_options.extend(info.audio_formats.iter().cloned());
        }

        AppViewModel {
            phase: self.phase,
            url: self.url.clone(),
            notice: self.notice.clone(),
            media,
            video_options,
            audio_options,
            form: FormView {
                video_quality: self.form.video_quality.clone(),
                audio_quality: self.form.audio_quality.clone(),
                has_credential: !self.form.credential.is_empty(),
                gen_subtitles: self.form.gen_subtitles,
                subtitles_enabled: !self.form.subtitles_locked,
                duration_warning: self.form.subtitles_locked,
                credential_visible: self.form.gen_subtitles,
                translate_subs: self.form.translate_subs,
                translate_enabled: self.form.gen_subtitles,
            },
            job_id: self.active_job_id().cloned(),
            tasks: self
                .job
                .as_ref()
                .map(|job| job.board.view())
                .unwrap_or_default(),
            result: self.result.clone(),
            history: self.history.list().map(HistoryRowView::from_entry).collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = url;
        self.mark_dirty();
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Starts a new outbound request, superseding any still awaiting a reply.
    pub(crate) fn issue_request(&mut self) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket::new(self.issued);
        self.pending = Some(ticket);
        ticket
    }

    /// Accepts the reply for `ticket` if it is the one outstanding.
    pub(crate) fn settle_request(&mut self, ticket: RequestTicket) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Installs freshly fetched media and resets the form to its defaults for it.
    pub(crate) fn load_media(&mut self, info: MediaInfo) {
        let credential = std::mem::take(&mut self.form.credential);
        self.form = ConfigForm {
            video_quality: AUDIO_ONLY.to_string(),
            audio_quality: info
                .audio_formats
                .first()
                .map(|f| f.id.clone())
                .unwrap_or_default(),
            credential,
            gen_subtitles: false,
            translate_subs: false,
            subtitles_locked: !subtitles_allowed(info.duration),
        };
        self.media = Some(info);
        self.mark_dirty();
    }

    pub(crate) fn select_video(&mut self, id: String) -> bool {
        let known = id == AUDIO_ONLY
            || self
                .media
                .as_ref()
                .is_some_and(|m| m.video_formats.iter().any(|f| f.id == id));
        if known {
            self.form.video_quality = id;
            self.mark_dirty();
        }
        known
    }

    pub(crate) fn select_audio(&mut self, id: String) -> bool {
        let known = self
            .media
            .as_ref()
            .is_some_and(|m| m.audio_formats.iter().any(|f| f.id == id));
        if known {
            self.form.audio_quality = id;
            self.mark_dirty();
        }
        known
    }

    pub(crate) fn set_credential(&mut self, credential: String) {
        self.form.credential = credential;
        self.mark_dirty();
    }

    pub(crate) fn has_credential(&self) -> bool {
        !self.form.credential.is_empty()
    }

    pub(crate) fn set_subtitles(&mut self, on: bool) {
        let on = on && !self.form.subtitles_locked;
        self.form.gen_subtitles = on;
        if !on {
            self.form.translate_subs = false;
        }
        self.mark_dirty();
    }

    pub(crate) fn set_translate(&mut self, on: bool) {
        self.form.translate_subs = on && self.form.gen_subtitles;
        self.mark_dirty();
    }

    pub(crate) fn job_fields(&self) -> JobFields {
        JobFields {
            url: self.url.clone(),
            video_quality: self.form.video_quality.clone(),
            audio_quality: self.form.audio_quality.clone(),
            credential: self.form.credential.clone(),
            gen_subtitles: self.form.gen_subtitles,
            translate_subs: self.form.translate_subs,
        }
    }

    pub(crate) fn start_job(&mut self, id: JobId) {
        self.job = Some(ActiveJob {
            id,
            board: TaskBoard::new(),
        });
        self.mark_dirty();
    }

    /// Drops the active job and its partial progress. Returns its id.
    pub(crate) fn discard_job(&mut self) -> Option<JobId> {
        let job = self.job.take()?;
        self.mark_dirty();
        Some(job.id)
    }

    pub(crate) fn clear_result(&mut self) {
        if self.result.take().is_some() {
            self.mark_dirty();
        }
    }

    /// True when `job_id` is the job currently being tracked.
    pub(crate) fn is_active_job(&self, job_id: &JobId) -> bool {
        self.active_job_id() == Some(job_id)
    }

    pub(crate) fn apply_snapshot(&mut self, event: &JobStatusEvent) {
        if let Some(job) = self.job.as_mut() {
            job.board.apply(event);
            self.dirty = true;
        }
    }

    /// Runs the result finalizer against the media fetched for this job.
    pub(crate) fn finalize_result(&mut self, result: &JobResult) -> Option<Vec<HistoryEntry>> {
        let media = self.media.as_ref()?;
        let view = finalize(result, media, &mut self.history);
        self.result = Some(view);
        self.mark_dirty();
        Some(self.history.to_vec())
    }

    pub(crate) fn restore_history(&mut self, entries: Vec<HistoryEntry>) {
        self.history = HistoryCache::from_entries(entries);
        self.mark_dirty();
    }

    /// Back to an empty URL form. History and credential survive.
    pub(crate) fn reset_to_input(&mut self) {
        self.url.clear();
        self.media = None;
        self.form.video_quality.clear();
        self.form.audio_quality.clear();
        self.form.gen_subtitles = false;
        self.form.translate_subs = false;
        self.form.subtitles_locked = false;
        self.job = None;
        self.result = None;
        self.notice = None;
        self.pending = None;
        self.phase = Phase::Input;
        self.mark_dirty();
    }
}
