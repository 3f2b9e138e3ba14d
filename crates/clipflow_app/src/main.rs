mod cli;
mod platform;

use anyhow::Result;
use clap::Parser;
use clipflow_engine::ensure_dir;

use cli::Cli;
use platform::config::{AppConfig, LogTarget};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    if config.log_destination != LogTarget::Terminal {
        ensure_dir(&config.state_dir)?;
    }
    clipflow_logging::initialize(
        config.log_destination.into(),
        config.level(),
        &config.log_file(),
    );

    // Engine work, timers and the status stream share this one thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(platform::run(config, cli.command))
}
