use crate::history::{HistoryCache, HistoryEntry};
use crate::model::{JobResult, MediaInfo};

/// Server path prefix under which finished artifacts are served.
pub const DOWNLOAD_PREFIX: &str = "/download/";

/// A reference to a finished artifact on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRef {
    pub filename: String,
}

impl DownloadRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// Server-relative path, e.g. `/download/1234.mp4`.
    pub fn path(&self) -> String {
        format!("{DOWNLOAD_PREFIX}{}", self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub title: String,
    pub size: String,
    pub duration: String,
    pub thumbnail: Option<String>,
    pub media: DownloadRef,
    pub subtitles: Option<DownloadRef>,
}

/// Builds the result view and records the job in `history`.
///
/// Duration and thumbnail come from the media info fetched before submission,
/// not from the result payload.
pub fn finalize(result: &JobResult, media: &MediaInfo, history: &mut HistoryCache) -> ResultView {
    history.push(HistoryEntry {
        title: result.title.clone(),
        filename: result.filename.clone(),
        subtitle_filename: result.srt_filename.clone(),
    });

    ResultView {
        title: result.title.clone(),
        size: result.size.clone(),
        duration: format_duration(media.duration),
        thumbnail: media.thumbnail.clone(),
        media: DownloadRef::new(&result.filename),
        subtitles: result.srt_filename.as_deref().map(DownloadRef::new),
    }
}

/// `m:ss` below an hour, `h:mm:ss` from an hour on.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
