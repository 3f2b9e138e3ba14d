use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clipflow")]
#[command(author, version, about = "Convert online media on a clipflow server and follow its progress")]
pub struct Cli {
    /// Path to a RON config file (default: ./clipflow.ron if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the conversion server
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Directory holding the saved credential and history
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show title, duration and available formats for a URL
    Info {
        /// Source media URL
        url: String,
    },

    /// Convert a URL and follow the job until it finishes
    Convert {
        /// Source media URL
        url: String,

        /// Video format id, or "none" for audio only
        #[arg(long)]
        video: Option<String>,

        /// Audio format id (default: first offered)
        #[arg(long)]
        audio: Option<String>,

        /// Generate subtitles (needs an API key; media up to two hours)
        #[arg(long)]
        subtitles: bool,

        /// Translate generated subtitles to English
        #[arg(long, requires = "subtitles")]
        translate: bool,

        /// Transcription API key; saved for later runs
        #[arg(long)]
        api_key: Option<String>,

        /// Download the finished files
        #[arg(long)]
        download: bool,

        /// Where downloads are written
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List recently completed conversions
    History,
}
