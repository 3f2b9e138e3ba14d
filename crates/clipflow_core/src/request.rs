use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Sentinel video quality meaning "audio only".
pub const AUDIO_ONLY: &str = "none";

/// Subtitles are not offered for media longer than this.
pub const SUBTITLE_DURATION_LIMIT_SECS: u64 = 2 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a URL")]
    EmptyUrl,
    #[error("missing credential: an API key is required to generate subtitles")]
    MissingCredential,
    #[error("no audio quality selected")]
    MissingAudioQuality,
}

/// Whether subtitle generation may be enabled for media of this length.
pub fn subtitles_allowed(duration_secs: u64) -> bool {
    duration_secs <= SUBTITLE_DURATION_LIMIT_SECS
}

/// Trims the url and rejects it when nothing is left.
pub fn validate_url(url: &str) -> Result<&str, ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    Ok(trimmed)
}

/// Raw form input for a submission, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobFields {
    pub url: String,
    pub video_quality: String,
    pub audio_quality: String,
    pub credential: String,
    pub gen_subtitles: bool,
    pub translate_subs: bool,
}

/// A validated conversion request. Only constructible through [`build_job_request`],
/// so `gen_subtitles` always comes with a non-empty credential.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    url: String,
    video_quality: String,
    audio_quality: String,
    #[serde(rename = "groq_api_key")]
    credential: String,
    gen_subtitles: bool,
    translate_subs: bool,
}

impl JobRequest {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn video_quality(&self) -> &str {
        &self.video_quality
    }

    pub fn audio_quality(&self) -> &str {
        &self.audio_quality
    }

    pub fn credential(&self) -> Option<&str> {
        (!self.credential.is_empty()).then_some(self.credential.as_str())
    }

    pub fn gen_subtitles(&self) -> bool {
        self.gen_subtitles
    }

    pub fn translate_subs(&self) -> bool {
        self.translate_subs
    }

    pub fn is_audio_only(&self) -> bool {
        self.video_quality == AUDIO_ONLY
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for JobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRequest")
            .field("url", &self.url)
            .field("video_quality", &self.video_quality)
            .field("audio_quality", &self.audio_quality)
            .field(
                "credential",
                &if self.credential.is_empty() { "<none>" } else { "<redacted>" },
            )
            .field("gen_subtitles", &self.gen_subtitles)
            .field("translate_subs", &self.translate_subs)
            .finish()
    }
}

/// Validates form input locally. Nothing here touches the network.
pub fn build_job_request(fields: JobFields) -> Result<JobRequest, ValidationError> {
    let url = validate_url(&fields.url)?.to_string();
    let credential = fields.credential.trim().to_string();
    if fields.gen_subtitles && credential.is_empty() {
        return Err(ValidationError::MissingCredential);
    }
    if fields.audio_quality.trim().is_empty() {
        return Err(ValidationError::MissingAudioQuality);
    }
    let video_quality = if fields.video_quality.trim().is_empty() {
        AUDIO_ONLY.to_string()
    } else {
        fields.video_quality
    };

    Ok(JobRequest {
        url,
        video_quality,
        audio_quality: fields.audio_quality,
        credential,
        gen_subtitles: fields.gen_subtitles,
        // Translation only applies to generated subtitles.
        translate_subs: fields.gen_subtitles && fields.translate_subs,
    })
}
