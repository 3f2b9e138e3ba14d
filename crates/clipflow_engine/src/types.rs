use clipflow_core::{
    JobId, JobResult, JobStatusEvent, MediaInfo, Notice, NoticeKind, RequestTicket,
    ValidationError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Bad input, caught before any request is sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server answered with an explicit error payload.
    #[error("{0}")]
    Backend(String),
    /// The request could not complete: connect failure, bad status, broken stream.
    #[error("{0}")]
    Transport(String),
    /// The server answered but the body was not what the protocol promises.
    #[error("unexpected response: {0}")]
    Decode(String),
    /// A downloaded artifact could not be written locally.
    #[error("could not save artifact: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn to_notice(&self) -> Notice {
        let kind = match self {
            ClientError::Validation(_) => NoticeKind::Validation,
            ClientError::Backend(_) => NoticeKind::Backend,
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::Storage(_) => {
                NoticeKind::Transport
            }
        };
        Notice::new(kind, self.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        ClientError::Transport(err.to_string())
    }
}

/// Events the engine feeds back to the orchestrator, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MediaInfoLoaded {
        ticket: RequestTicket,
        result: Result<MediaInfo, ClientError>,
    },
    JobSubmitted {
        ticket: RequestTicket,
        result: Result<JobId, ClientError>,
    },
    Snapshot {
        job_id: JobId,
        event: JobStatusEvent,
    },
    /// The push channel failed, or closed before a terminal snapshot.
    StreamFailed {
        job_id: JobId,
        error: ClientError,
    },
    FinalizeDue {
        job_id: JobId,
        result: JobResult,
    },
}
