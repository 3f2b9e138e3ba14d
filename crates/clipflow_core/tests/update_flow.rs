use std::sync::Once;

use clipflow_core::{
    update, AppState, Effect, FormatOption, HistoryEntry, JobId, JobResult, JobState,
    JobStatusEvent, MediaInfo, Msg, NoticeKind, Phase, RequestTicket, TaskState, TaskStatus,
    FINALIZE_DELAY,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(clipflow_logging::initialize_for_tests);
}

fn media(duration: u64) -> MediaInfo {
    MediaInfo {
        title: "Conference talk".to_string(),
        duration,
        thumbnail: Some("https://img.example/t.jpg".to_string()),
        video_formats: vec![FormatOption {
            id: "137".to_string(),
            label: "1920x1080 (mp4)".to_string(),
        }],
        audio_formats: vec![
            FormatOption {
                id: "251".to_string(),
                label: "160kbps (webm)".to_string(),
            },
            FormatOption {
                id: "140".to_string(),
                label: "129kbps (m4a)".to_string(),
            },
        ],
    }
}

/// Ticket of the discovery or submission request among `effects`.
fn ticket_of(effects: &[Effect]) -> RequestTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchMediaInfo { ticket, .. } | Effect::SubmitJob { ticket, .. } => {
                Some(*ticket)
            }
            _ => None,
        })
        .expect("a request effect")
}

fn fetched(state: AppState, url: &str) -> (AppState, RequestTicket) {
    let (state, _) = update(state, Msg::UrlChanged(url.to_string()));
    let (state, effects) = update(state, Msg::FetchInfoClicked);
    let ticket = ticket_of(&effects);
    assert_eq!(
        effects,
        vec![Effect::FetchMediaInfo {
            ticket,
            url: url.to_string()
        }]
    );
    assert_eq!(state.phase(), Phase::Discovering);
    (state, ticket)
}

fn configured(duration: u64) -> AppState {
    let (state, ticket) = fetched(AppState::new(), "https://youtu.be/talk");
    let (state, effects) = update(
        state,
        Msg::MediaInfoLoaded {
            ticket,
            result: Ok(media(duration)),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Configure);
    state
}

fn submitted(state: AppState, job: &str) -> AppState {
    let (state, effects) = update(state, Msg::StartClicked);
    assert!(matches!(effects.last(), Some(Effect::SubmitJob { .. })));
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket: ticket_of(&effects),
            result: Ok(JobId::new(job)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenSubscription {
            job_id: JobId::new(job)
        }]
    );
    assert_eq!(state.phase(), Phase::Monitoring);
    state
}

fn result() -> JobResult {
    JobResult {
        title: "Conference talk".to_string(),
        size: "48.20 MB".to_string(),
        filename: "f00d.mp4".to_string(),
        srt_filename: Some("f00d.srt".to_string()),
    }
}

fn task(status: TaskState, detail: &str, progress: Option<f32>) -> TaskStatus {
    TaskStatus {
        status,
        detail: Some(detail.to_string()),
        progress,
    }
}

#[test]
fn empty_url_is_rejected_before_any_request() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::UrlChanged("   ".to_string()));
    let (state, effects) = update(state, Msg::FetchInfoClicked);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Input);
    assert_eq!(state.notice().unwrap().kind, NoticeKind::Validation);
}

#[test]
fn short_media_allows_subtitles() {
    init_logging();
    let state = configured(5400);
    let view = state.view();
    assert!(view.form.subtitles_enabled);
    assert!(!view.form.duration_warning);
    assert!(!view.form.gen_subtitles);
    assert_eq!(view.media.unwrap().duration, "1:30:00");
    assert_eq!(view.form.video_quality, "none");
    assert_eq!(view.form.audio_quality, "251");

    let (state, _) = update(state, Msg::SubtitlesToggled(true));
    assert!(state.view().form.gen_subtitles);
    assert!(state.view().form.translate_enabled);
    let (state, _) = update(state, Msg::SubtitlesToggled(false));
    assert!(!state.view().form.gen_subtitles);
}

#[test]
fn long_media_locks_subtitles_off_with_warning() {
    init_logging();
    let state = configured(10_000);
    let (state, _) = update(state, Msg::SubtitlesToggled(true));
    let (state, _) = update(state, Msg::TranslateToggled(true));
    let view = state.view();

    assert!(!view.form.subtitles_enabled);
    assert!(view.form.duration_warning);
    assert!(!view.form.gen_subtitles);
    assert!(!view.form.translate_subs);
}

#[test]
fn unchecking_subtitles_clears_translation() {
    init_logging();
    let state = configured(600);
    let (state, _) = update(state, Msg::SubtitlesToggled(true));
    let (state, _) = update(state, Msg::TranslateToggled(true));
    assert!(state.view().form.translate_subs);
    let (state, _) = update(state, Msg::SubtitlesToggled(false));
    assert!(!state.view().form.translate_subs);
    assert!(!state.view().form.translate_enabled);
}

#[test]
fn subtitles_without_credential_never_reach_the_network() {
    init_logging();
    let state = configured(600);
    let (state, _) = update(state, Msg::SubtitlesToggled(true));
    let (state, effects) = update(state, Msg::StartClicked);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Configure);
    let notice = state.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Validation);
    assert!(notice.message.contains("missing credential"));
}

#[test]
fn start_stores_credential_then_submits() {
    init_logging();
    let state = configured(600);
    let (state, _) = update(state, Msg::CredentialChanged("gsk_abc".to_string()));
    let (state, _) = update(state, Msg::SubtitlesToggled(true));
    let (state, _) = update(state, Msg::VideoQualitySelected("137".to_string()));
    let (state, effects) = update(state, Msg::StartClicked);

    assert_eq!(state.phase(), Phase::Submitting);
    assert_eq!(effects.len(), 2);
    assert_eq!(
        effects[0],
        Effect::StoreCredential {
            credential: "gsk_abc".to_string()
        }
    );
    match &effects[1] {
        Effect::SubmitJob { request, .. } => {
            assert_eq!(request.url(), "https://youtu.be/talk");
            assert_eq!(request.video_quality(), "137");
            assert_eq!(request.audio_quality(), "251");
            assert!(request.gen_subtitles());
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn unknown_quality_selection_is_ignored() {
    init_logging();
    let state = configured(600);
    let (state, _) = update(state, Msg::AudioQualitySelected("999".to_string()));
    assert_eq!(state.view().form.audio_quality, "251");
    let (state, _) = update(state, Msg::AudioQualitySelected("140".to_string()));
    assert_eq!(state.view().form.audio_quality, "140");
}

#[test]
fn submission_failure_returns_to_configuration() {
    init_logging();
    let state = configured(600);
    let (state, effects) = update(state, Msg::StartClicked);
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket: ticket_of(&effects),
            result: Err(clipflow_core::Notice::new(
                NoticeKind::Transport,
                "connection refused",
            )),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Configure);
    assert_eq!(state.notice().unwrap().kind, NoticeKind::Transport);
}

#[test]
fn snapshots_replace_task_view() {
    init_logging();
    let state = submitted(configured(600), "job-1");
    let mut event = JobStatusEvent::default();
    event.tasks.insert(
        "audio_dl".to_string(),
        task(TaskState::Running, "42.0% @ 1.2MiB/s", Some(42.0)),
    );
    event.tasks.insert(
        "video_dl".to_string(),
        task(TaskState::Skipped, "whatever", None),
    );
    let (state, effects) = update(
        state,
        Msg::SnapshotReceived {
            job_id: JobId::new("job-1"),
            event,
        },
    );
    assert!(effects.is_empty());

    let rows = state.view().tasks;
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].state, TaskState::Running);
    assert_eq!(rows[0].detail, "42.0% @ 1.2MiB/s");
    assert_eq!(rows[0].indicator, Some(42.0));
    assert_eq!(rows[1].detail, "Skipped");
    assert_eq!(rows[2].state, TaskState::Waiting);
}

#[test]
fn completion_waits_then_records_exactly_one_history_entry() {
    init_logging();
    let state = submitted(configured(3661), "job-7");
    let event = JobStatusEvent {
        status: JobState::Completed,
        result: Some(result()),
        ..JobStatusEvent::default()
    };
    let (state, effects) = update(
        state,
        Msg::SnapshotReceived {
            job_id: JobId::new("job-7"),
            event,
        },
    );
    assert_eq!(state.phase(), Phase::Finishing);
    assert_eq!(
        effects,
        vec![
            Effect::CloseSubscription {
                job_id: JobId::new("job-7")
            },
            Effect::ScheduleFinalize {
                job_id: JobId::new("job-7"),
                result: result(),
                delay: FINALIZE_DELAY,
            },
        ]
    );
    assert_eq!(FINALIZE_DELAY.as_millis(), 500);
    assert!(state.history().is_empty());

    let (state, effects) = update(
        state,
        Msg::FinalizeDue {
            job_id: JobId::new("job-7"),
            result: result(),
        },
    );
    assert_eq!(state.phase(), Phase::Result);
    assert_eq!(state.history().len(), 1);
    let expected_entry = HistoryEntry {
        title: "Conference talk".to_string(),
        filename: "f00d.mp4".to_string(),
        subtitle_filename: Some("f00d.srt".to_string()),
    };
    assert_eq!(
        effects,
        vec![Effect::PersistHistory {
            entries: vec![expected_entry]
        }]
    );

    let view = state.view().result.unwrap();
    assert_eq!(view.media.filename, "f00d.mp4");
    assert_eq!(view.media.path(), "/download/f00d.mp4");
    assert_eq!(view.subtitles.unwrap().path(), "/download/f00d.srt");
    assert_eq!(view.duration, "1:01:01");
    assert_eq!(view.thumbnail.as_deref(), Some("https://img.example/t.jpg"));

    // A late duplicate of the timer must not add a second entry.
    let (state, effects) = update(
        state,
        Msg::FinalizeDue {
            job_id: JobId::new("job-7"),
            result: result(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.history().len(), 1);
}

#[test]
fn job_error_discards_progress_and_returns_to_configuration() {
    init_logging();
    let state = submitted(configured(600), "job-9");
    let mut running = JobStatusEvent::default();
    running.tasks.insert(
        "audio_dl".to_string(),
        task(TaskState::Done, "Download complete", Some(100.0)),
    );
    let (state, _) = update(
        state,
        Msg::SnapshotReceived {
            job_id: JobId::new("job-9"),
            event: running,
        },
    );

    let failed = JobStatusEvent {
        status: JobState::Error,
        error: Some("Unsupported URL".to_string()),
        ..JobStatusEvent::default()
    };
    let (state, effects) = update(
        state,
        Msg::SnapshotReceived {
            job_id: JobId::new("job-9"),
            event: failed,
        },
    );

    assert_eq!(
        effects,
        vec![Effect::CloseSubscription {
            job_id: JobId::new("job-9")
        }]
    );
    assert_eq!(state.phase(), Phase::Configure);
    let notice = state.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Job);
    assert_eq!(notice.message, "Unsupported URL");
    assert!(state.view().tasks.is_empty());
    assert!(state.history().is_empty());
}

#[test]
fn stale_snapshots_from_a_released_job_are_ignored() {
    init_logging();
    let state = submitted(configured(600), "old");
    let (state, _) = update(
        state,
        Msg::StreamFailed {
            job_id: JobId::new("old"),
            notice: clipflow_core::Notice::new(NoticeKind::Transport, "reset by peer"),
        },
    );
    let state = submitted(state, "new");

    let event = JobStatusEvent {
        status: JobState::Completed,
        result: Some(result()),
        ..JobStatusEvent::default()
    };
    let (state, effects) = update(
        state,
        Msg::SnapshotReceived {
            job_id: JobId::new("old"),
            event,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Monitoring);
    assert_eq!(state.active_job_id(), Some(&JobId::new("new")));
}

#[test]
fn reset_during_monitoring_releases_subscription() {
    init_logging();
    let state = submitted(configured(600), "job-3");
    let (state, effects) = update(state, Msg::ResetClicked);
    assert_eq!(
        effects,
        vec![Effect::CloseSubscription {
            job_id: JobId::new("job-3")
        }]
    );
    assert_eq!(state.phase(), Phase::Input);
    assert!(state.view().url.is_empty());
}

#[test]
fn submission_reply_from_before_reset_is_dropped() {
    init_logging();
    let state = configured(600);
    let (state, effects) = update(state, Msg::StartClicked);
    let first = ticket_of(&effects);
    let (state, effects) = update(state, Msg::ResetClicked);
    assert!(effects.is_empty());

    let (state, ticket) = fetched(state, "https://youtu.be/talk");
    let (state, _) = update(
        state,
        Msg::MediaInfoLoaded {
            ticket,
            result: Ok(media(600)),
        },
    );
    let (state, effects) = update(state, Msg::StartClicked);
    let second = ticket_of(&effects);
    assert_ne!(first, second);

    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket: first,
            result: Ok(JobId::new("A")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Submitting);
    assert_eq!(state.active_job_id(), None);

    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            ticket: second,
            result: Ok(JobId::new("B")),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenSubscription {
            job_id: JobId::new("B")
        }]
    );
    assert_eq!(state.phase(), Phase::Monitoring);
    assert_eq!(state.active_job_id(), Some(&JobId::new("B")));
}

#[test]
fn media_info_from_before_reset_is_dropped() {
    init_logging();
    let (state, short) = fetched(AppState::new(), "https://youtu.be/short");
    let (state, _) = update(state, Msg::ResetClicked);
    let (state, long) = fetched(state, "https://youtu.be/three-hours");

    let (state, effects) = update(
        state,
        Msg::MediaInfoLoaded {
            ticket: short,
            result: Ok(media(60)),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Discovering);
    assert!(state.view().media.is_none());

    let (state, effects) = update(
        state,
        Msg::MediaInfoLoaded {
            ticket: long,
            result: Ok(media(3 * 60 * 60)),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Configure);
    let view = state.view();
    assert_eq!(view.media.unwrap().duration, "3:00:00");
    assert!(!view.form.subtitles_enabled);
    assert!(view.form.duration_warning);

    // A duplicate of an already settled reply changes nothing.
    let (state, effects) = update(
        state,
        Msg::MediaInfoLoaded {
            ticket: long,
            result: Ok(media(60)),
        },
    );
    assert!(effects.is_empty());
    assert!(state.view().form.duration_warning);
}

#[test]
fn restored_history_and_credential_survive_reset() {
    init_logging();
    let entries: Vec<_> = (0..8)
        .map(|n| HistoryEntry {
            title: format!("A rather long video title number {n}"),
            filename: format!("{n}.opus"),
            subtitle_filename: None,
        })
        .collect();
    let (state, _) = update(AppState::new(), Msg::HistoryRestored(entries));
    let (state, _) = update(state, Msg::CredentialRestored("gsk_saved".to_string()));
    let (state, _) = update(state, Msg::ResetClicked);

    let view = state.view();
    assert_eq!(view.history.len(), 5);
    assert_eq!(view.history[0].media.filename, "0.opus");
    assert!(view.history[0].title.ends_with("..."));
    assert!(view.form.has_credential);
}

#[test]
fn dirty_flag_is_consumed() {
    init_logging();
    let (mut state, _) = update(AppState::new(), Msg::UrlChanged("x".to_string()));
    assert!(state.view().dirty);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}
