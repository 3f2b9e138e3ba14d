//! Per-task state machine driven by status snapshots, and its render projection.

use clipflow_logging::{clip_debug, clip_warn};

use crate::model::{JobStatusEvent, TaskId, TaskState, TaskStatus};

/// Detail text rendered for every skipped task, whatever the snapshot says.
pub const SKIPPED_DETAIL: &str = "Skipped";

#[derive(Debug, Clone, PartialEq, Default)]
struct TaskSlot {
    status: TaskStatus,
    /// Last explicit non-zero percentage; what a progress bar would show.
    indicator: f32,
}

/// Current view of every task in one job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskBoard {
    slots: [TaskSlot; 5],
}

impl TaskBoard {
    /// All tasks waiting, all indicators at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, id: TaskId) -> &TaskStatus {
        &self.slots[id.index()].status
    }

    pub fn state(&self, id: TaskId) -> TaskState {
        self.status(id).status
    }

    pub fn indicator(&self, id: TaskId) -> f32 {
        self.slots[id.index()].indicator
    }

    /// Overwrites every task named in `event` with the snapshot's values.
    ///
    /// A task already in a terminal state keeps it: an entry asking to move it
    /// back to `waiting` or `running` is dropped as a whole. Returns the number of
    /// tasks updated.
    pub fn apply(&mut self, event: &JobStatusEvent) -> usize {
        let mut applied = 0;
        for (raw_id, incoming) in &event.tasks {
            let Ok(id) = raw_id.parse::<TaskId>() else {
                clip_debug!("ignoring unknown task id {:?}", raw_id);
                continue;
            };
            let slot = &mut self.slots[id.index()];
            if slot.status.status.is_terminal() && !incoming.status.is_terminal() {
                clip_warn!(
                    "task {} asked to regress from {:?} to {:?}; keeping {:?}",
                    id,
                    slot.status.status,
                    incoming.status,
                    slot.status.status
                );
                continue;
            }
            slot.status = incoming.clone();
            if let Some(progress) = incoming.progress.filter(|p| *p > 0.0) {
                slot.indicator = progress;
            }
            applied += 1;
        }
        applied
    }

    /// Pure projection to render rows, in pipeline order.
    pub fn view(&self) -> Vec<TaskView> {
        TaskId::ALL
            .into_iter()
            .map(|id| {
                let slot = &self.slots[id.index()];
                TaskView {
                    id,
                    label: id.label(),
                    state: slot.status.status,
                    detail: render_detail(&slot.status),
                    indicator: id.has_progress_bar().then_some(slot.indicator),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub id: TaskId,
    pub label: &'static str,
    pub state: TaskState,
    pub detail: String,
    /// `None` for tasks that have no progress bar.
    pub indicator: Option<f32>,
}

fn render_detail(status: &TaskStatus) -> String {
    if status.status == TaskState::Skipped {
        return SKIPPED_DETAIL.to_string();
    }
    match status.detail.as_deref().map(str::trim) {
        Some(detail) if !detail.is_empty() => detail.to_string(),
        _ => placeholder(status.status).to_string(),
    }
}

fn placeholder(state: TaskState) -> &'static str {
    match state {
        TaskState::Waiting => "Waiting...",
        TaskState::Running => "Working...",
        TaskState::Done => "Done",
        TaskState::Skipped => SKIPPED_DETAIL,
        TaskState::Error => "Failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, TaskState, Option<&str>, Option<f32>)]) -> JobStatusEvent {
        JobStatusEvent {
            tasks: entries
                .iter()
                .map(|(id, status, detail, progress)| {
                    (
                        id.to_string(),
                        TaskStatus {
                            status: *status,
                            detail: detail.map(str::to_string),
                            progress: *progress,
                        },
                    )
                })
                .collect(),
            ..JobStatusEvent::default()
        }
    }

    #[test]
    fn new_board_is_all_waiting() {
        let board = TaskBoard::new();
        for row in board.view() {
            assert_eq!(row.state, TaskState::Waiting);
            assert_eq!(row.detail, "Waiting...");
        }
    }

    #[test]
    fn later_snapshot_replaces_detail_without_merging() {
        let mut board = TaskBoard::new();
        board.apply(&snapshot(&[(
            "conversion",
            TaskState::Running,
            Some("Encoding to Opus 27k"),
            None,
        )]));
        board.apply(&snapshot(&[("conversion", TaskState::Done, None, None)]));

        let status = board.status(TaskId::Conversion);
        assert_eq!(status.status, TaskState::Done);
        assert_eq!(status.detail, None);
    }

    #[test]
    fn zero_or_missing_progress_keeps_indicator() {
        let mut board = TaskBoard::new();
        board.apply(&snapshot(&[("audio_dl", TaskState::Running, None, Some(42.5))]));
        board.apply(&snapshot(&[("audio_dl", TaskState::Running, None, Some(0.0))]));
        assert_eq!(board.indicator(TaskId::AudioDl), 42.5);
        board.apply(&snapshot(&[("audio_dl", TaskState::Running, None, None)]));
        assert_eq!(board.indicator(TaskId::AudioDl), 42.5);
        board.apply(&snapshot(&[("audio_dl", TaskState::Done, None, Some(100.0))]));
        assert_eq!(board.indicator(TaskId::AudioDl), 100.0);
    }

    #[test]
    fn unknown_tasks_are_ignored() {
        let mut board = TaskBoard::new();
        let applied = board.apply(&snapshot(&[
            ("thumbnail", TaskState::Running, None, None),
            ("video_dl", TaskState::Running, None, None),
        ]));
        assert_eq!(applied, 1);
        assert_eq!(board.state(TaskId::VideoDl), TaskState::Running);
    }

    #[test]
    fn terminal_task_may_change_terminal_outcome() {
        let mut board = TaskBoard::new();
        board.apply(&snapshot(&[("finalization", TaskState::Done, None, None)]));
        board.apply(&snapshot(&[("finalization", TaskState::Error, None, None)]));
        assert_eq!(board.state(TaskId::Finalization), TaskState::Error);
    }

    #[test]
    fn only_download_tasks_expose_an_indicator() {
        let rows = TaskBoard::new().view();
        let with_bar: Vec<_> = rows
            .iter()
            .filter(|row| row.indicator.is_some())
            .map(|row| row.id)
            .collect();
        assert_eq!(with_bar, vec![TaskId::AudioDl, TaskId::VideoDl]);
    }
}
