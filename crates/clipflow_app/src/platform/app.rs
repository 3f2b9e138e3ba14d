use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clipflow_core::{update, AppState, FormatOption, Msg, Phase, ResultView};
use clipflow_engine::{EngineHandle, ReqwestBackend, SlotStore};
use clipflow_logging::{clip_info, clip_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::persistence;
use super::ui;
use crate::cli::Commands;

/// Choices applied to the configuration form once formats are known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub video: Option<String>,
    pub audio: Option<String>,
    pub subtitles: bool,
    pub translate: bool,
    pub api_key: Option<String>,
}

pub async fn run(config: AppConfig, command: Commands) -> Result<()> {
    let store = SlotStore::new(&config.state_dir);

    if command == Commands::History {
        let (state, _) = update(
            AppState::new(),
            Msg::HistoryRestored(persistence::load_history(&store)),
        );
        for line in ui::render::render_history(&state.view().history) {
            println!("{line}");
        }
        return Ok(());
    }

    let backend = ReqwestBackend::new(config.client_settings()?)?;
    let runner = EffectRunner::new(EngineHandle::new(Arc::new(backend)), store);
    let mut session = Session::new(runner, io::stdout());
    session.restore();

    let outcome = match command {
        Commands::Info { url } => session.discover(&url).await,
        Commands::Convert {
            url,
            video,
            audio,
            subtitles,
            translate,
            api_key,
            download,
            output_dir,
        } => {
            let selections = Selections {
                video,
                audio,
                subtitles,
                translate,
                api_key,
            };
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            convert(&mut session, &url, &selections, download.then_some(output_dir.as_path()))
                .await
        }
        Commands::History => Ok(()),
    };

    session.shutdown();
    outcome
}

async fn convert<W: Write>(
    session: &mut Session<W>,
    url: &str,
    selections: &Selections,
    download_to: Option<&Path>,
) -> Result<()> {
    session.discover(url).await?;
    let result = session.convert(selections).await?;
    if let Some(dir) = download_to {
        session.download(&result, dir).await?;
    }
    Ok(())
}

/// One orchestrator state driven by engine events, painted to `out`.
pub struct Session<W: Write> {
    state: AppState,
    runner: EffectRunner,
    printed: Vec<String>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            printed: Vec::new(),
            out,
        }
    }

    /// Restores persisted history and credential into the form.
    pub fn restore(&mut self) {
        let entries = persistence::load_history(self.runner.store());
        self.dispatch(Msg::HistoryRestored(entries));
        if let Some(credential) = persistence::load_credential(self.runner.store()) {
            self.dispatch(Msg::CredentialRestored(credential));
        }
    }

    /// Looks up `url` and leaves the session in `Configure`.
    pub async fn discover(&mut self, url: &str) -> Result<()> {
        self.dispatch(Msg::UrlChanged(url.to_string()));
        self.dispatch(Msg::FetchInfoClicked);
        self.pump_until(|state| state.phase() != Phase::Discovering)
            .await?;
        self.fail_on_notice()
    }

    /// Applies `selections`, submits, and follows the job to its result.
    pub async fn convert(&mut self, selections: &Selections) -> Result<ResultView> {
        let view = self.state.view();
        if let Some(video) = &selections.video {
            ensure_offered("video", video, &view.video_options)?;
            self.dispatch(Msg::VideoQualitySelected(video.clone()));
        }
        if let Some(audio) = &selections.audio {
            ensure_offered("audio", audio, &view.audio_options)?;
            self.dispatch(Msg::AudioQualitySelected(audio.clone()));
        }
        if let Some(api_key) = &selections.api_key {
            self.dispatch(Msg::CredentialChanged(api_key.clone()));
        }
        if selections.subtitles {
            if !view.form.subtitles_enabled {
                bail!("{}", ui::constants::DURATION_WARNING);
            }
            self.dispatch(Msg::SubtitlesToggled(true));
            self.dispatch(Msg::TranslateToggled(selections.translate));
        }

        self.dispatch(Msg::StartClicked);
        self.pump_until(|state| {
            matches!(state.phase(), Phase::Result | Phase::Configure | Phase::Input)
        })
        .await?;
        self.fail_on_notice()?;

        self.state
            .view()
            .result
            .ok_or_else(|| anyhow!("job ended without a result"))
    }

    /// Fetches the finished media and subtitles into `dir`.
    pub async fn download(&mut self, result: &ResultView, dir: &Path) -> Result<()> {
        let backend = self.runner.engine().backend();
        for artifact in std::iter::once(&result.media).chain(result.subtitles.as_ref()) {
            let saved = backend
                .download_artifact(artifact, dir)
                .await
                .map_err(|err| anyhow!("{}", err.to_notice()))?;
            clip_info!("Downloaded {} to {:?}", artifact.path(), saved);
            let _ = writeln!(self.out, "Saved {}", saved.display());
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.runner.shutdown();
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty {
            self.paint();
        }
    }

    /// Prints the lines of the current frame that were not on the last one.
    fn paint(&mut self) {
        let lines = ui::render::render(&self.state.view());
        for line in lines.iter().filter(|line| !self.printed.contains(line)) {
            let _ = writeln!(self.out, "{line}");
        }
        self.printed = lines;
    }

    async fn pump_until(&mut self, done: impl Fn(&AppState) -> bool) -> Result<()> {
        while !done(&self.state) {
            tokio::select! {
                msg = self.runner.next_msg() => {
                    let msg = msg.ok_or_else(|| anyhow!("engine stopped"))?;
                    self.dispatch(msg);
                }
                _ = tokio::signal::ctrl_c() => {
                    clip_warn!("Interrupted; abandoning the current job");
                    self.dispatch(Msg::ResetClicked);
                    bail!("interrupted");
                }
            }
        }
        Ok(())
    }

    fn fail_on_notice(&self) -> Result<()> {
        match self.state.notice() {
            Some(notice) => bail!("{notice}"),
            None => Ok(()),
        }
    }
}

fn ensure_offered(kind: &str, id: &str, options: &[FormatOption]) -> Result<()> {
    if options.iter().any(|option| option.id == id) {
        return Ok(());
    }
    let offered: Vec<&str> = options.iter().map(|option| option.id.as_str()).collect();
    bail!(
        "{kind} format {id:?} is not offered; choose one of: {}",
        offered.join(", ")
    )
}
