//! Clipflow engine: HTTP client for the conversion service, status stream
//! monitoring and persistent slots.
mod backend;
mod engine;
mod monitor;
mod persist;
mod settings;
mod sse;
mod types;

pub use backend::{decode_status_stream, ConversionBackend, ReqwestBackend, StatusStream};
pub use engine::EngineHandle;
pub use monitor::{ProgressMonitor, Subscription};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError, SlotStore};
pub use settings::{ClientSettings, DEFAULT_SERVER_URL};
pub use sse::SseDecoder;
pub use types::{ClientError, EngineEvent};
