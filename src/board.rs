// src/board.rs

use std::collections::VecDeque;

use log::{debug, info, warn};
use serde::Serialize;

use crate::drag_session::{DragSessionTracker, DropOutcome};
use crate::error::BoardError;
use crate::models::{Task, TaskDraft, TaskId, TaskStatus};
use crate::task_store::{StoreEvent, SubscriptionId, TaskStore};
use crate::views::{Projection, ViewFilter, ViewIntent, ViewKind, ViewSet};

/// Which save path the open editor routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "task_id", rename_all = "snake_case")]
pub enum EditorTarget {
    NewTask,
    Existing(TaskId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSession {
    pub target: EditorTarget,
    pub draft: TaskDraft,
    /// Inline validation message from the last failed save.
    pub error: Option<String>,
}

/// A committed store change, kept so it can be mirrored remotely and undone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Created { task: Task },
    Replaced { prior: Task, current: Task },
    Removed { index: usize, task: Task },
}

impl Mutation {
    pub fn task(&self) -> &Task {
        match self {
            Mutation::Created { task } => task,
            Mutation::Replaced { current, .. } => current,
            Mutation::Removed { task, .. } => task,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

/// Oldest notifications are dropped past this many.
pub const MAX_NOTIFICATIONS: usize = 50;

/// Everything a client needs to draw the board once.
#[derive(Debug, Serialize)]
pub struct BoardSnapshot<'a> {
    pub active_view: ViewKind,
    pub view: Projection<'a>,
    pub dragging: Option<&'a TaskId>,
    pub editor: Option<&'a EditorSession>,
    pub notifications: &'a [Notification],
}

/// Composes the task store, the drag tracker and the views.
///
/// This is the only place gestures turn into store mutations. Store errors
/// stop here: they become notifications (or are dropped) and the board keeps
/// rendering whatever the store currently holds.
pub struct BoardController {
    store: TaskStore,
    drag: DragSessionTracker,
    views: ViewSet,
    active_view: ViewKind,
    editor: Option<EditorSession>,
    notifications: Vec<Notification>,
    next_notification: u64,
    stale: bool,
    /// Mutations sent to remote storage and not yet answered, oldest first.
    in_flight: VecDeque<Mutation>,
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new(TaskStore::new())
    }
}

impl BoardController {
    pub fn new(store: TaskStore) -> Self {
        BoardController {
            store,
            drag: DragSessionTracker::new(),
            views: ViewSet::default(),
            active_view: ViewKind::default(),
            editor: None,
            notifications: Vec::new(),
            next_notification: 1,
            stale: false,
            in_flight: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut TaskStore {
        &mut self.store
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + Send + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn list(&self) -> &[Task] {
        self.store.list()
    }

    /* ---------------------------------------------------------------- */
    /* Views                                                            */
    /* ---------------------------------------------------------------- */

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn set_view(&mut self, kind: ViewKind) {
        if self.active_view != kind {
            debug!("view switched {} -> {}", self.active_view, kind);
            self.active_view = kind;
        }
    }

    /// Default adapter settings, overridable per render.
    pub fn views(&self) -> &ViewSet {
        &self.views
    }

    pub fn render_view(&self, kind: ViewKind, filter: &ViewFilter) -> Projection<'_> {
        self.render_view_with(&self.views, kind, filter)
    }

    /// Project through `views` instead of the board's default view settings.
    pub fn render_view_with(&self, views: &ViewSet, kind: ViewKind, filter: &ViewFilter) -> Projection<'_> {
        views.adapter(kind).project(self.store.list(), filter)
    }

    pub fn render(&self, filter: &ViewFilter) -> BoardSnapshot<'_> {
        self.render_with(&self.views, filter)
    }

    pub fn render_with(&self, views: &ViewSet, filter: &ViewFilter) -> BoardSnapshot<'_> {
        BoardSnapshot {
            active_view: self.active_view,
            view: self.render_view_with(views, self.active_view, filter),
            dragging: self.drag.active(),
            editor: self.editor.as_ref(),
            notifications: &self.notifications,
        }
    }

    pub fn dispatch(&mut self, intent: ViewIntent) {
        match intent {
            ViewIntent::ActivateTask { task_id } => {
                self.open_existing(&task_id);
            }
            ViewIntent::RequestCreate { status } => self.open_new_task(status),
        }
    }

    /* ---------------------------------------------------------------- */
    /* Editor                                                           */
    /* ---------------------------------------------------------------- */

    pub fn editor(&self) -> Option<&EditorSession> {
        self.editor.as_ref()
    }

    /// Open a blank editor for a task in `status`. Replaces any open draft.
    pub fn open_new_task(&mut self, status: TaskStatus) {
        self.editor = Some(EditorSession {
            target: EditorTarget::NewTask,
            draft: TaskDraft::new_in(status),
            error: None,
        });
    }

    /// Open the editor on a stored task. Replaces any open draft.
    pub fn open_existing(&mut self, task_id: &TaskId) -> bool {
        let Some(task) = self.store.get(task_id) else {
            self.handle_error(BoardError::not_found(task_id.as_str()));
            return false;
        };
        self.editor = Some(EditorSession {
            target: EditorTarget::Existing(task_id.clone()),
            draft: task.to_draft(),
            error: None,
        });
        true
    }

    /// Discard the open draft. Nothing is written.
    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Save `draft` through the open editor: new drafts are added, existing
    /// ones replace their task. A validation failure keeps the editor open
    /// with the message attached.
    pub fn save_editor(&mut self, draft: TaskDraft) -> Option<Mutation> {
        let target = self.editor.as_ref()?.target.clone();
        let result = match &target {
            EditorTarget::NewTask => self
                .store
                .add(&draft)
                .map(|task| Mutation::Created { task }),
            EditorTarget::Existing(task_id) => self.replace_from_draft(task_id, &draft),
        };

        match result {
            Ok(mutation) => {
                self.editor = None;
                Some(mutation)
            }
            Err(BoardError::Validation { field, message }) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.draft = draft;
                    editor.error = Some(format!("{}: {}", field, message));
                }
                None
            }
            Err(e) => {
                // the task vanished underneath the dialog
                self.editor = None;
                self.handle_error(e);
                None
            }
        }
    }

    fn replace_from_draft(&mut self, task_id: &TaskId, draft: &TaskDraft) -> Result<Mutation, BoardError> {
        let prior = self
            .store
            .get(task_id)
            .cloned()
            .ok_or_else(|| BoardError::not_found(task_id.as_str()))?;
        let mut edited = prior.clone();
        draft.validated()?.apply_to(&mut edited);
        if draft.status.is_none() {
            edited.status = prior.status;
        }
        let current = self.store.update(edited)?;
        Ok(Mutation::Replaced { prior, current })
    }

    /* ---------------------------------------------------------------- */
    /* Direct task actions                                              */
    /* ---------------------------------------------------------------- */

    pub fn create_task(&mut self, draft: &TaskDraft) -> Option<Mutation> {
        match self.store.add(draft) {
            Ok(task) => Some(Mutation::Created { task }),
            Err(e) => {
                self.handle_error(e);
                None
            }
        }
    }

    pub fn update_task(&mut self, task: Task) -> Option<Mutation> {
        let prior = match self.store.get(&task.task_id) {
            Some(prior) => prior.clone(),
            None => {
                self.handle_error(BoardError::not_found(task.task_id.as_str()));
                return None;
            }
        };
        match self.store.update(task) {
            Ok(current) => Some(Mutation::Replaced { prior, current }),
            Err(e) => {
                self.handle_error(e);
                None
            }
        }
    }

    pub fn change_status(&mut self, task_id: &TaskId, new_status: &str) -> Option<Mutation> {
        match new_status.parse::<TaskStatus>() {
            Ok(status) => self.apply_status(task_id, status),
            Err(e) => {
                self.handle_error(e);
                None
            }
        }
    }

    pub fn delete_task(&mut self, task_id: &TaskId) -> Option<Mutation> {
        let (index, task) = self.store.delete(task_id)?;
        if matches!(&self.editor, Some(EditorSession { target: EditorTarget::Existing(id), .. }) if id == task_id)
        {
            self.editor = None;
        }
        Some(Mutation::Removed { index, task })
    }

    fn apply_status(&mut self, task_id: &TaskId, status: TaskStatus) -> Option<Mutation> {
        let prior = self.store.get(task_id).cloned();
        match (prior, self.store.set_status(task_id, status)) {
            (Some(prior), Ok(current)) => Some(Mutation::Replaced { prior, current }),
            (_, Err(e)) => {
                self.handle_error(e);
                None
            }
            (None, Ok(_)) => None,
        }
    }

    /* ---------------------------------------------------------------- */
    /* Drag and drop                                                    */
    /* ---------------------------------------------------------------- */

    pub fn dragging(&self) -> Option<&TaskId> {
        self.drag.active()
    }

    pub fn on_drag_start(&mut self, task_id: TaskId) -> bool {
        self.drag.begin_drag(task_id)
    }

    /// Finish the gesture for `task_id`. The move, if any, is applied before
    /// the session is cleared. An end event for a task other than the one in
    /// flight cancels the session.
    pub fn on_drag_end(&mut self, task_id: &TaskId, drop_target: Option<&str>) -> Option<Mutation> {
        let outcome = match self.drag.active() {
            Some(active) if active == task_id => self.drag.resolve_drop(drop_target),
            Some(active) => {
                debug!("drag end for {} while {} is in flight", task_id, active);
                DropOutcome::Cancelled
            }
            None => DropOutcome::Cancelled,
        };

        let mutation = match outcome {
            DropOutcome::Move { task_id, status } => self.apply_status(&task_id, status),
            DropOutcome::Cancelled => None,
        };
        self.drag.end_drag();
        mutation
    }

    /* ---------------------------------------------------------------- */
    /* Notifications                                                    */
    /* ---------------------------------------------------------------- */

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.next_notification;
        self.next_notification += 1;
        self.notifications.push(Notification {
            id,
            level,
            message: message.into(),
        });
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
        id
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    /// Whether a re-fetch was requested since the last call.
    pub fn take_stale(&mut self) -> bool {
        std::mem::take(&mut self.stale)
    }

    pub(crate) fn handle_error(&mut self, err: BoardError) {
        match err {
            BoardError::NotFound { id } => {
                warn!("task {} is gone, requesting refresh", id);
                self.stale = true;
                self.notify(
                    NotificationLevel::Warning,
                    "That task no longer exists. The board has been refreshed.",
                );
            }
            BoardError::InvalidTransition { value } => {
                debug!("ignoring move to unknown status '{}'", value);
            }
            BoardError::Validation { field, message } => {
                self.notify(NotificationLevel::Warning, format!("Invalid {}: {}", field, message));
            }
            BoardError::Persistence(message) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Could not save changes: {}", message),
                );
            }
        }
    }

    /* ---------------------------------------------------------------- */
    /* Remote reconciliation                                            */
    /* ---------------------------------------------------------------- */

    /// Record a mutation whose remote write has been queued.
    pub(crate) fn track_write(&mut self, mutation: Mutation) {
        self.in_flight.push_back(mutation);
    }

    /// Forget the oldest queued write once storage has answered it.
    pub(crate) fn settle_write(&mut self) -> Option<Mutation> {
        self.in_flight.pop_front()
    }

    /// Replace the tasks with a fresh remote listing, then replay the writes
    /// storage has not answered yet so optimistic changes survive.
    pub(crate) fn reload(&mut self, tasks: Vec<Task>) {
        self.store.replace_all(tasks);
        for mutation in &self.in_flight {
            match mutation {
                Mutation::Created { task } => {
                    if self.store.get(&task.task_id).is_none() {
                        self.store.restore(task.clone(), self.store.len());
                    }
                }
                Mutation::Replaced { current, .. } => {
                    self.store.reconcile(current.clone());
                }
                Mutation::Removed { task, .. } => {
                    self.store.delete(&task.task_id);
                }
            }
        }
        if !self.in_flight.is_empty() {
            debug!("replayed {} pending writes over the reload", self.in_flight.len());
        }
    }

    /// Adopt the remote's copy of a mirrored mutation, unless a newer local
    /// write for the same task has landed since.
    pub(crate) fn reconcile(&mut self, mutation: &Mutation, remote: Task) {
        let local = mutation.task();
        match mutation {
            Mutation::Removed { .. } => {}
            _ if self.store.get(&local.task_id) == Some(local) => {
                self.store.reconcile(remote);
            }
            _ => debug!("skipping reconcile of {}, newer local write", local.task_id),
        }
    }

    /// Undo a mutation the remote rejected. Newer local writes win.
    pub(crate) fn rollback(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Created { task } => {
                self.store.delete(&task.task_id);
            }
            Mutation::Replaced { prior, current } => {
                if self.store.get(&current.task_id) == Some(current) {
                    self.store.restore(prior.clone(), 0);
                }
            }
            Mutation::Removed { index, task } => {
                if self.store.get(&task.task_id).is_none() {
                    self.store.restore(task.clone(), *index);
                }
            }
        }
        info!("rolled back {:?} for {}", mutation_kind(mutation), mutation.task().task_id);
    }
}

fn mutation_kind(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Created { .. } => "create",
        Mutation::Replaced { .. } => "replace",
        Mutation::Removed { .. } => "remove",
    }
}
