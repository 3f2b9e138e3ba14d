use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clipflow_engine::{ClientSettings, DEFAULT_SERVER_URL};
use clipflow_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_FILENAME: &str = "clipflow.ron";
pub(crate) const ENV_SERVER: &str = "CLIPFLOW_SERVER";
pub(crate) const ENV_STATE_DIR: &str = "CLIPFLOW_STATE_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub(crate) enum LogTarget {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub server_url: String,
    pub state_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_destination: LogTarget,
    /// Any `log::LevelFilter` name, e.g. `"info"` or `"debug"`.
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            state_dir: PathBuf::from(".clipflow"),
            output_dir: PathBuf::from("downloads"),
            log_destination: LogTarget::default(),
            log_level: "warn".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `./clipflow.ron` when it exists, or falls back to defaults.
    ///
    /// An explicitly named file must exist and parse.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Applies environment overrides; `lookup` is usually `std::env::var`.
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server) = lookup(ENV_SERVER).filter(|v| !v.trim().is_empty()) {
            self.server_url = server;
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
    }

    pub(crate) fn level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }

    pub(crate) fn log_file(&self) -> PathBuf {
        self.state_dir.join("clipflow.log")
    }

    pub(crate) fn client_settings(&self) -> Result<ClientSettings> {
        let mut settings = ClientSettings::new(&self.server_url)?;
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(settings)
    }
}
