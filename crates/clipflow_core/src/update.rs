use clipflow_logging::{clip_debug, clip_info, clip_warn};

use crate::effect::FINALIZE_DELAY;
use crate::model::JobState;
use crate::request::{build_job_request, validate_url};
use crate::{AppState, Effect, Msg, Notice, NoticeKind, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(url) => {
            if state.phase() == Phase::Input {
                state.set_url(url);
            }
            Vec::new()
        }
        Msg::FetchInfoClicked => {
            if !matches!(state.phase(), Phase::Input | Phase::Configure) {
                return (state, Vec::new());
            }
            match validate_url(state.url()).map(str::to_string) {
                Ok(url) => {
                    state.clear_notice();
                    state.set_phase(Phase::Discovering);
                    let ticket = state.issue_request();
                    vec![Effect::FetchMediaInfo { ticket, url }]
                }
                Err(err) => {
                    state.set_notice(err.into());
                    Vec::new()
                }
            }
        }
        Msg::MediaInfoLoaded { ticket, result } => {
            if state.phase() != Phase::Discovering || !state.settle_request(ticket) {
                clip_debug!("dropping media info for abandoned request {}", ticket);
                return (state, Vec::new());
            }
            match result {
                Ok(info) => {
                    state.load_media(info);
                    state.set_phase(Phase::Configure);
                }
                Err(notice) => {
                    state.set_notice(notice);
                    state.set_phase(Phase::Input);
                }
            }
            Vec::new()
        }
        Msg::VideoQualitySelected(id) => {
            if state.phase() == Phase::Configure && !state.select_video(id.clone()) {
                clip_warn!("ignoring unknown video quality {:?}", id);
            }
            Vec::new()
        }
        Msg::AudioQualitySelected(id) => {
            if state.phase() == Phase::Configure && !state.select_audio(id.clone()) {
                clip_warn!("ignoring unknown audio quality {:?}", id);
            }
            Vec::new()
        }
        Msg::CredentialChanged(credential) => {
            state.set_credential(credential);
            Vec::new()
        }
        Msg::SubtitlesToggled(on) => {
            if state.phase() == Phase::Configure {
                state.set_subtitles(on);
            }
            Vec::new()
        }
        Msg::TranslateToggled(on) => {
            if state.phase() == Phase::Configure {
                state.set_translate(on);
            }
            Vec::new()
        }
        Msg::StartClicked => {
            if state.phase() != Phase::Configure {
                return (state, Vec::new());
            }
            match build_job_request(state.job_fields()) {
                Ok(request) => {
                    state.clear_notice();
                    state.clear_result();
                    let mut effects = Vec::with_capacity(3);
                    if let Some(previous) = state.discard_job() {
                        effects.push(Effect::CloseSubscription { job_id: previous });
                    }
                    if let Some(credential) = request.credential() {
                        effects.push(Effect::StoreCredential {
                            credential: credential.to_string(),
                        });
                    }
                    let ticket = state.issue_request();
                    effects.push(Effect::SubmitJob { ticket, request });
                    state.set_phase(Phase::Submitting);
                    effects
                }
                Err(err) => {
                    state.set_notice(err.into());
                    Vec::new()
                }
            }
        }
        Msg::JobSubmitted { ticket, result } => {
            if state.phase() != Phase::Submitting || !state.settle_request(ticket) {
                // The server may still run an abandoned job; nothing here cancels it.
                clip_debug!("dropping submission reply for abandoned request {}", ticket);
                return (state, Vec::new());
            }
            match result {
                Ok(job_id) => {
                    clip_info!("job {} accepted", job_id);
                    state.start_job(job_id.clone());
                    state.set_phase(Phase::Monitoring);
                    vec![Effect::OpenSubscription { job_id }]
                }
                Err(notice) => {
                    state.set_notice(notice);
                    state.set_phase(Phase::Configure);
                    Vec::new()
                }
            }
        }
        Msg::SnapshotReceived { job_id, event } => {
            if state.phase() != Phase::Monitoring || !state.is_active_job(&job_id) {
                clip_debug!("dropping snapshot for inactive job {}", job_id);
                return (state, Vec::new());
            }
            state.apply_snapshot(&event);
            match (event.status, event.result) {
                (JobState::Running, _) => Vec::new(),
                (JobState::Completed, Some(result)) => {
                    clip_info!("job {} completed: {}", job_id, result.filename);
                    state.set_phase(Phase::Finishing);
                    vec![
                        Effect::CloseSubscription {
                            job_id: job_id.clone(),
                        },
                        Effect::ScheduleFinalize {
                            job_id,
                            result,
                            delay: FINALIZE_DELAY,
                        },
                    ]
                }
                (JobState::Completed, None) => fail_job(
                    &mut state,
                    job_id,
                    Notice::new(NoticeKind::Job, "job completed without a result"),
                ),
                (JobState::Error, _) => {
                    let message = event
                        .error
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| "unknown error".to_string());
                    fail_job(&mut state, job_id, Notice::new(NoticeKind::Job, message))
                }
            }
        }
        Msg::StreamFailed { job_id, notice } => {
            if state.phase() != Phase::Monitoring || !state.is_active_job(&job_id) {
                return (state, Vec::new());
            }
            fail_job(&mut state, job_id, notice)
        }
        Msg::FinalizeDue { job_id, result } => {
            if state.phase() != Phase::Finishing || !state.is_active_job(&job_id) {
                return (state, Vec::new());
            }
            match state.finalize_result(&result) {
                Some(entries) => {
                    state.discard_job();
                    state.set_phase(Phase::Result);
                    vec![Effect::PersistHistory { entries }]
                }
                None => fail_job(
                    &mut state,
                    job_id,
                    Notice::new(NoticeKind::Job, "media info missing for finished job"),
                ),
            }
        }
        Msg::HistoryRestored(entries) => {
            state.restore_history(entries);
            Vec::new()
        }
        Msg::CredentialRestored(credential) => {
            if !state.has_credential() {
                state.set_credential(credential);
            }
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.clear_notice();
            Vec::new()
        }
        Msg::ResetClicked => {
            // Abandoning a job only releases the local subscription.
            let abandoned = state.discard_job();
            state.reset_to_input();
            abandoned
                .map(|job_id| vec![Effect::CloseSubscription { job_id }])
                .unwrap_or_default()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Closes the subscription, discards partial progress and returns to configuration.
fn fail_job(state: &mut AppState, job_id: crate::JobId, notice: Notice) -> Vec<Effect> {
    clip_warn!("job {} ended without a result: {}", job_id, notice);
    state.discard_job();
    state.set_notice(notice);
    state.set_phase(Phase::Configure);
    vec![Effect::CloseSubscription { job_id }]
}
