use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pairs an outbound request with its reply. Only the reply carrying the
/// outstanding ticket is accepted; anything else answers an abandoned request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed set of pipeline stages a job reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    AudioDl,
    VideoDl,
    Conversion,
    Transcription,
    Finalization,
}

impl TaskId {
    /// Pipeline order, used for rendering.
    pub const ALL: [TaskId; 5] = [
        TaskId::AudioDl,
        TaskId::VideoDl,
        TaskId::Conversion,
        TaskId::Transcription,
        TaskId::Finalization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::AudioDl => "audio_dl",
            TaskId::VideoDl => "video_dl",
            TaskId::Conversion => "conversion",
            TaskId::Transcription => "transcription",
            TaskId::Finalization => "finalization",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskId::AudioDl => "Download audio",
            TaskId::VideoDl => "Download video",
            TaskId::Conversion => "Prepare audio for transcription",
            TaskId::Transcription => "Generate subtitles",
            TaskId::Finalization => "Merge and finalize",
        }
    }

    /// Only the download stages report a percentage.
    pub fn has_progress_bar(self) -> bool {
        matches!(self, TaskId::AudioDl | TaskId::VideoDl)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            TaskId::AudioDl => 0,
            TaskId::VideoDl => 1,
            TaskId::Conversion => 2,
            TaskId::Transcription => 3,
            TaskId::Finalization => 4,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTaskId(pub String);

impl FromStr for TaskId {
    type Err = UnknownTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownTaskId(s.to_string()))
    }
}

/// Lifecycle of a single task. `Waiting` is initial; `Done`, `Skipped` and
/// `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    #[serde(alias = "pending")]
    Waiting,
    Running,
    Done,
    Skipped,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Skipped | TaskState::Error)
    }
}

/// One task's entry in a status snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub status: TaskState,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: Option<f32>,
}

/// Overall job status. Moves from `Running` to a terminal value exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    #[serde(alias = "queued")]
    Running,
    Completed,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Running)
    }
}

/// A complete status report for a job. Each snapshot supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobStatusEvent {
    /// Keyed by raw task id so unknown stages don't reject the whole snapshot.
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskStatus>,
    #[serde(default)]
    pub status: JobState,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    pub size: String,
    pub filename: String,
    #[serde(default)]
    pub srt_filename: Option<String>,
}

/// One selectable encoding, as offered by format discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// `null` reads as an empty title.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    /// Whole seconds; fractional durations are truncated and `null` reads as 0.
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: u64,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub video_formats: Vec<FormatOption>,
    #[serde(default)]
    pub audio_formats: Vec<FormatOption>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            RawNumber::Number(n) => *n,
            RawNumber::Text(text) => text.trim().trim_end_matches('%').trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Accepts `45`, `45.3`, `"45.3"`, `"45.3%"` or `null`; clamps to [0, 100].
fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(RawNumber::to_f64)
        .map(|value| value.clamp(0.0, 100.0) as f32))
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(RawNumber::to_f64)
        .filter(|value| *value > 0.0)
        .map(|value| value as u64)
        .unwrap_or(0))
}
