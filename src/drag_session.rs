// src/drag_session.rs

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::models::{TaskId, TaskStatus};

fn column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(todo|in-progress|review|completed|closed)-column$")
            .unwrap_or_else(|e| unreachable!("column pattern is a literal: {}", e))
    })
}

/// Decode a `<status>-column` drop-target id.
pub fn status_for_target(target: &str) -> Option<TaskStatus> {
    let caps = column_pattern().captures(target)?;
    caps.get(1)?.as_str().parse().ok()
}

/// What a released drag resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    Move { task_id: TaskId, status: TaskStatus },
    Cancelled,
}

/// Tracks the single in-flight drag gesture.
#[derive(Debug, Default)]
pub struct DragSessionTracker {
    active: Option<TaskId>,
}

impl DragSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&TaskId> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Start a session for `task_id`. Returns `false` and keeps the current
    /// session if one is already in flight.
    pub fn begin_drag(&mut self, task_id: TaskId) -> bool {
        if let Some(current) = &self.active {
            debug!("ignoring drag of {} while {} is in flight", task_id, current);
            return false;
        }
        debug!("drag started: {}", task_id);
        self.active = Some(task_id);
        true
    }

    /// Decide where the active task lands. Does not end the session; the
    /// caller applies the move first and then calls `end_drag`.
    pub fn resolve_drop(&self, drop_target: Option<&str>) -> DropOutcome {
        let Some(task_id) = self.active.clone() else {
            return DropOutcome::Cancelled;
        };
        match drop_target.and_then(status_for_target) {
            Some(status) => DropOutcome::Move { task_id, status },
            None => {
                debug!("drop of {} on {:?} cancelled", task_id, drop_target);
                DropOutcome::Cancelled
            }
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(task_id) = self.active.take() {
            debug!("drag ended: {}", task_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_column_namespace() {
        for status in TaskStatus::ALL {
            assert_eq!(status_for_target(&status.column_id()), Some(status));
        }
    }

    #[test]
    fn rejects_unknown_or_malformed_targets() {
        for target in ["garbage", "done-column", "review", "review-column-2", "Review-column", ""] {
            assert_eq!(status_for_target(target), None, "{}", target);
        }
    }

    #[test]
    fn second_begin_keeps_the_first_session() {
        let mut tracker = DragSessionTracker::new();
        assert!(tracker.begin_drag(TaskId::from("a")));
        assert!(!tracker.begin_drag(TaskId::from("b")));
        assert_eq!(tracker.active(), Some(&TaskId::from("a")));

        tracker.end_drag();
        assert!(tracker.begin_drag(TaskId::from("b")));
        assert_eq!(tracker.active(), Some(&TaskId::from("b")));
    }

    #[test]
    fn resolve_maps_target_to_move_or_cancel() {
        let mut tracker = DragSessionTracker::new();
        tracker.begin_drag(TaskId::from("x"));

        assert_eq!(
            tracker.resolve_drop(Some("in-progress-column")),
            DropOutcome::Move {
                task_id: TaskId::from("x"),
                status: TaskStatus::InProgress,
            }
        );
        assert_eq!(tracker.resolve_drop(Some("garbage")), DropOutcome::Cancelled);
        assert_eq!(tracker.resolve_drop(None), DropOutcome::Cancelled);
        assert!(tracker.is_dragging());
    }

    #[test]
    fn resolve_without_session_is_a_cancel() {
        let tracker = DragSessionTracker::new();
        assert_eq!(tracker.resolve_drop(Some("review-column")), DropOutcome::Cancelled);
    }

    #[test]
    fn end_drag_is_unconditional() {
        let mut tracker = DragSessionTracker::new();
        tracker.end_drag();
        tracker.begin_drag(TaskId::from("x"));
        tracker.end_drag();
        assert!(!tracker.is_dragging());
    }
}
