use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use clipflow_core::{validate_url, DownloadRef, JobId, JobRequest, JobStatusEvent, MediaInfo};
use clipflow_logging::{clip_debug, clip_info};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::persist::{is_plain_file_name, AtomicFileWriter};
use crate::settings::ClientSettings;
use crate::sse::SseDecoder;
use crate::ClientError;

/// Decoded push channel for one job, in server emission order.
pub type StatusStream = BoxStream<'static, Result<JobStatusEvent, ClientError>>;

/// The remote conversion service.
#[async_trait::async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Resolves a source url into selectable formats. Rejects an empty url
    /// before sending anything.
    async fn fetch_media_info(&self, url: &str) -> Result<MediaInfo, ClientError>;

    async fn submit_job(&self, request: &JobRequest) -> Result<JobId, ClientError>;

    /// Opens the server-to-client status stream for `job_id`.
    async fn open_status_stream(&self, job_id: &JobId) -> Result<StatusStream, ClientError>;

    /// Saves a finished artifact as `dest_dir/{filename}` and returns its path.
    async fn download_artifact(
        &self,
        artifact: &DownloadRef,
        dest_dir: &Path,
    ) -> Result<PathBuf, ClientError>;
}

#[derive(Serialize)]
struct InfoRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: JobId,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
    /// No total timeout: status streams and downloads may run indefinitely.
    streaming_client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        let streaming_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self {
            settings,
            client,
            streaming_client,
        })
    }
}

#[async_trait::async_trait]
impl ConversionBackend for ReqwestBackend {
    async fn fetch_media_info(&self, url: &str) -> Result<MediaInfo, ClientError> {
        let url = validate_url(url)?;
        let endpoint = self.settings.endpoint(&["api", "info"])?;
        clip_info!("requesting media info (url_len={})", url.len());

        let response = self
            .client
            .post(endpoint)
            .json(&InfoRequest { url })
            .send()
            .await?;
        let info: MediaInfo = read_payload(response).await?;
        clip_info!(
            "media info: {:?}, {}s, {} video / {} audio formats",
            info.title,
            info.duration,
            info.video_formats.len(),
            info.audio_formats.len()
        );
        Ok(info)
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<JobId, ClientError> {
        let endpoint = self.settings.endpoint(&["api", "convert"])?;
        clip_info!("submitting {:?}", request);

        let response = self.client.post(endpoint).json(request).send().await?;
        let submitted: SubmitResponse = read_payload(response).await?;
        Ok(submitted.job_id)
    }

    async fn open_status_stream(&self, job_id: &JobId) -> Result<StatusStream, ClientError> {
        let endpoint = self.settings.endpoint(&["api", "status", job_id.as_str()])?;
        clip_debug!("GET {}", endpoint);

        let response = self
            .streaming_client
            .get(endpoint)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "status stream refused: http status {status}"
            )));
        }

        let bytes = response.bytes_stream().map_err(ClientError::from).boxed();
        Ok(decode_status_stream(bytes))
    }

    async fn download_artifact(
        &self,
        artifact: &DownloadRef,
        dest_dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        if !is_plain_file_name(&artifact.filename) {
            return Err(ClientError::Decode(format!(
                "refusing artifact name {:?}",
                artifact.filename
            )));
        }
        let endpoint = self
            .settings
            .endpoint(&["download", artifact.filename.as_str()])?;
        clip_info!("downloading {}", artifact.path());

        let mut response = self.streaming_client.get(endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "download of {} failed: http status {status}",
                artifact.filename
            )));
        }

        let writer = AtomicFileWriter::new(dest_dir.to_path_buf());
        let mut tmp = writer
            .begin()
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            tmp.write_all(&chunk)
                .map_err(|err| ClientError::Storage(err.to_string()))?;
            written += chunk.len() as u64;
        }
        let path = writer
            .commit(tmp, &artifact.filename)
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        clip_info!("saved {} bytes to {:?}", written, path);
        Ok(path)
    }
}

/// Reads a JSON body, treating an `{error}` payload as a backend error whatever
/// the HTTP status.
async fn read_payload<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    parse_payload(status, &body)
}

fn parse_payload<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) if status.is_success() => return Err(ClientError::Decode(err.to_string())),
        Err(_) => return Err(ClientError::Transport(format!("http status {status}"))),
    };
    if let Some(message) = value.get("error").filter(|e| !e.is_null()) {
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(ClientError::Backend(message));
    }
    if !status.is_success() {
        return Err(ClientError::Transport(format!("http status {status}")));
    }
    serde_json::from_value(value).map_err(|err| ClientError::Decode(err.to_string()))
}

/// Turns a raw event-stream body into decoded snapshots.
///
/// A malformed snapshot is yielded as an error; the caller decides whether to
/// keep reading.
pub fn decode_status_stream(bytes: BoxStream<'static, Result<Bytes, ClientError>>) -> StatusStream {
    struct State {
        bytes: BoxStream<'static, Result<Bytes, ClientError>>,
        decoder: SseDecoder,
        pending: VecDeque<String>,
        finished: bool,
    }

    let state = State {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                let item = serde_json::from_str::<JobStatusEvent>(&data)
                    .map_err(|err| ClientError::Decode(format!("bad status snapshot: {err}")));
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_wins_over_status() {
        let err = parse_payload::<MediaInfo>(StatusCode::BAD_REQUEST, br#"{"error":"Unsupported URL"}"#)
            .unwrap_err();
        assert_eq!(err, ClientError::Backend("Unsupported URL".to_string()));

        let err = parse_payload::<MediaInfo>(StatusCode::OK, br#"{"error":"late failure"}"#)
            .unwrap_err();
        assert_eq!(err, ClientError::Backend("late failure".to_string()));
    }

    #[test]
    fn non_json_error_status_is_transport() {
        let err = parse_payload::<MediaInfo>(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>")
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = parse_payload::<SubmitResponse>(StatusCode::OK, br#"{"id":"x"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
