use clipflow_core::{AppViewModel, HistoryRowView, Phase, TaskState, TaskView};

use super::constants::*;

/// Projects the view model onto terminal lines. Pure; the caller decides
/// which lines are new enough to print.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(notice) = &view.notice {
        lines.push(format!("! {notice}"));
    }

    match view.phase {
        Phase::Input => {}
        Phase::Discovering => lines.push(format!("Looking up {} ...", view.url)),
        Phase::Configure => render_configure(view, &mut lines),
        Phase::Submitting => lines.push("Submitting job ...".to_string()),
        Phase::Monitoring | Phase::Finishing => {
            if let Some(job_id) = &view.job_id {
                lines.push(format!("Job {job_id}"));
            }
            lines.extend(view.tasks.iter().map(format_task_row));
        }
        Phase::Result => {
            if let Some(result) = &view.result {
                lines.push(format!("Finished: {}", result.title));
                lines.push(format!("  Size:      {}", result.size));
                lines.push(format!("  Duration:  {}", result.duration));
                if let Some(thumbnail) = &result.thumbnail {
                    lines.push(format!("  Thumbnail: {thumbnail}"));
                }
                lines.push(format!("  Media:     {}", result.media.path()));
                if let Some(subtitles) = &result.subtitles {
                    lines.push(format!("  Subtitles: {}", subtitles.path()));
                }
            }
        }
    }

    lines
}

/// Recent conversions, newest first.
pub fn render_history(rows: &[HistoryRowView]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["No conversions yet.".to_string()];
    }
    let mut lines = vec!["Recent conversions:".to_string()];
    for (index, row) in rows.iter().enumerate() {
        let mut line = format!(
            "{:>2}. {:<width$}  {}",
            index + 1,
            row.title,
            row.media.path(),
            width = TITLE_COLUMN
        );
        if let Some(subtitles) = &row.subtitles {
            line.push_str("  ");
            line.push_str(&subtitles.path());
        }
        lines.push(line);
    }
    lines
}

fn render_configure(view: &AppViewModel, lines: &mut Vec<String>) {
    if let Some(media) = &view.media {
        lines.push(format!("{} ({})", media.title, media.duration));
    }

    lines.push("Video:".to_string());
    for option in &view.video_options {
        lines.push(format_option(&option.id, &option.label, &view.form.video_quality));
    }
    lines.push("Audio:".to_string());
    for option in &view.audio_options {
        lines.push(format_option(&option.id, &option.label, &view.form.audio_quality));
    }

    let form = &view.form;
    let subtitles = if form.subtitles_enabled {
        format!("{} Generate subtitles", checkbox(form.gen_subtitles))
    } else {
        "[-] Generate subtitles".to_string()
    };
    lines.push(subtitles);
    if form.duration_warning {
        lines.push(format!("    {DURATION_WARNING}"));
    }
    if form.credential_visible {
        let key = if form.has_credential { "saved" } else { "missing" };
        lines.push(format!("    API key: {key}"));
    }
    if form.translate_enabled {
        lines.push(format!(
            "{} Translate subtitles to English",
            checkbox(form.translate_subs)
        ));
    }
}

fn format_option(id: &str, label: &str, selected: &str) -> String {
    let marker = if id == selected { '>' } else { ' ' };
    format!("  {marker} {id:<8} {label}")
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn format_task_row(task: &TaskView) -> String {
    let icon = match task.state {
        TaskState::Waiting => ICON_WAITING,
        TaskState::Running => ICON_RUNNING,
        TaskState::Done => ICON_DONE,
        TaskState::Skipped => ICON_SKIPPED,
        TaskState::Error => ICON_ERROR,
    };
    match task.indicator {
        Some(percent) => format!(
            "  {icon} {:<width$} {} {}",
            task.label,
            progress_bar(percent),
            task.detail,
            width = LABEL_COLUMN
        ),
        None => format!(
            "  {icon} {:<width$} {}",
            task.label,
            task.detail,
            width = LABEL_COLUMN
        ),
    }
}

fn progress_bar(percent: f32) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f32).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipflow_core::{
        update, AppState, Effect, FormatOption, JobId, JobResult, JobState, JobStatusEvent,
        MediaInfo, Msg,
    };

    fn configured(duration: u64) -> AppState {
        let (state, _) = update(AppState::new(), Msg::UrlChanged("https://youtu.be/x".into()));
        let (state, effects) = update(state, Msg::FetchInfoClicked);
        let Some(Effect::FetchMediaInfo { ticket, .. }) = effects.first() else {
            panic!("expected a fetch, got {effects:?}");
        };
        let (state, _) = update(
            state,
            Msg::MediaInfoLoaded {
                ticket: *ticket,
                result: Ok(MediaInfo {
                    title: "Lecture 1".to_string(),
                    duration,
                    thumbnail: None,
                    video_formats: vec![FormatOption {
                        id: "137".to_string(),
                        label: "1920x1080 (mp4)".to_string(),
                    }],
                    audio_formats: vec![FormatOption {
                        id: "251".to_string(),
                        label: "160kbps (webm)".to_string(),
                    }],
                }),
            },
        );
        state
    }

    fn started(state: AppState, job: &str) -> AppState {
        let (state, effects) = update(state, Msg::StartClicked);
        let Some(Effect::SubmitJob { ticket, .. }) = effects.last() else {
            panic!("expected a submission, got {effects:?}");
        };
        let (state, _) = update(
            state,
            Msg::JobSubmitted {
                ticket: *ticket,
                result: Ok(JobId::new(job)),
            },
        );
        state
    }

    #[test]
    fn configure_marks_defaults_and_locks_long_media() {
        let lines = render(&configured(10_000).view());
        assert_eq!(lines[0], "Lecture 1 (2:46:40)");
        assert!(lines.contains(&"  > none     No Video (Audio Only)".to_string()));
        assert!(lines.contains(&"  > 251      160kbps (webm)".to_string()));
        assert!(lines.contains(&"[-] Generate subtitles".to_string()));
        assert!(lines.iter().any(|l| l.contains(DURATION_WARNING)));

        let lines = render(&configured(5400).view());
        assert!(lines.contains(&"[ ] Generate subtitles".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Translate")));
    }

    #[test]
    fn monitoring_shows_bars_only_for_downloads() {
        let state = started(configured(60), "9f1c");
        let event: JobStatusEvent = serde_json::from_str(
            r#"{"status":"running","tasks":{
                "audio_dl":{"status":"running","progress":50,"detail":"50%"},
                "video_dl":{"status":"skipped"},
                "conversion":{"status":"waiting"}}}"#,
        )
        .unwrap();
        let (state, _) = update(
            state,
            Msg::SnapshotReceived {
                job_id: JobId::new("9f1c"),
                event,
            },
        );

        let lines = render(&state.view());
        assert_eq!(lines[0], "Job 9f1c");
        let audio = lines.iter().find(|l| l.contains("50%")).unwrap();
        assert!(audio.contains("[##########----------]"), "{audio}");
        let video = lines.iter().find(|l| l.contains("Skipped")).unwrap();
        assert!(video.contains("[--------------------]   0%"), "{video}");
        let conversion = lines.iter().find(|l| l.contains("Waiting...")).unwrap();
        assert!(!conversion.contains('%'), "{conversion}");
    }

    #[test]
    fn result_lists_download_paths() {
        let state = started(configured(3661), "j");
        let result = JobResult {
            title: "Lecture 1".to_string(),
            size: "3.10 MB".to_string(),
            filename: "j.mp4".to_string(),
            srt_filename: Some("j.srt".to_string()),
        };
        let (state, _) = update(
            state,
            Msg::SnapshotReceived {
                job_id: JobId::new("j"),
                event: JobStatusEvent {
                    status: JobState::Completed,
                    result: Some(result.clone()),
                    ..JobStatusEvent::default()
                },
            },
        );
        let (state, _) = update(
            state,
            Msg::FinalizeDue {
                job_id: JobId::new("j"),
                result,
            },
        );

        let lines = render(&state.view());
        assert_eq!(lines[0], "Finished: Lecture 1");
        assert!(lines.contains(&"  Duration:  1:01:01".to_string()));
        assert!(lines.contains(&"  Media:     /download/j.mp4".to_string()));
        assert!(lines.contains(&"  Subtitles: /download/j.srt".to_string()));

        let history = render_history(&state.view().history);
        assert_eq!(history.len(), 2);
        assert!(history[1].starts_with(" 1. Lecture 1"));
        assert!(history[1].ends_with("/download/j.mp4  /download/j.srt"));
    }

    #[test]
    fn empty_history() {
        assert_eq!(render_history(&[]), vec!["No conversions yet.".to_string()]);
    }
}
