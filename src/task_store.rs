// src/task_store.rs

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;

use crate::error::{BoardError, Result};
use crate::models::{validate_hours, validate_title, Task, TaskDraft, TaskId, TaskStatus};

/// Change published to store subscribers after every committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Added { task_id: TaskId },
    Updated { task_id: TaskId },
    StatusChanged {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    Deleted { task_id: TaskId },
    Reloaded { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent) + Send>;

/// Canonical, insertion-ordered task collection.
///
/// The store is the only owner of tasks. Views read `list()` and re-project
/// after each notification; nothing else mutates the collection.
#[derive(Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        TaskStore {
            tasks,
            ..Self::default()
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        debug!("store event: {:?}", event);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.task_id == id)
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.task_id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate the draft and append it as a new `todo` (or draft-chosen) task.
    pub fn add(&mut self, draft: &TaskDraft) -> Result<Task> {
        let valid = draft.validated()?;
        let mut task_id = TaskId::generate();
        while self.position(&task_id).is_some() {
            task_id = TaskId::generate();
        }
        let task = valid.into_task(task_id, Utc::now());
        info!("Task created: {:?}", task.task_id);
        self.tasks.push(task.clone());
        self.notify(StoreEvent::Added {
            task_id: task.task_id.clone(),
        });
        Ok(task)
    }

    /// Replace the stored task with the same id. Identity and `created_at`
    /// stay store-owned; `updated_at` is refreshed.
    pub fn update(&mut self, task: Task) -> Result<Task> {
        let idx = self
            .position(&task.task_id)
            .ok_or_else(|| BoardError::not_found(task.task_id.as_str()))?;
        validate_title(&task.title)?;
        validate_hours(task.estimated_hours)?;

        let stored = &mut self.tasks[idx];
        let created_at = stored.created_at;
        let updated_at = stored.updated_at;
        *stored = Task {
            created_at,
            updated_at,
            ..task
        };
        stored.touch();
        let updated = stored.clone();
        self.notify(StoreEvent::Updated {
            task_id: updated.task_id.clone(),
        });
        Ok(updated)
    }

    /// Parse `new_status` and apply it. Any status may follow any other.
    pub fn change_status(&mut self, id: &TaskId, new_status: &str) -> Result<Task> {
        let status: TaskStatus = new_status.parse()?;
        self.set_status(id, status)
    }

    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let idx = self
            .position(id)
            .ok_or_else(|| BoardError::not_found(id.as_str()))?;
        let task = &mut self.tasks[idx];
        let from = task.status;
        task.status = status;
        task.touch();
        let updated = task.clone();
        debug!("Task {} moved {} -> {}", id, from, status);
        self.notify(StoreEvent::StatusChanged {
            task_id: id.clone(),
            from,
            to: status,
        });
        Ok(updated)
    }

    /// Remove the task and return it with its former index. Deleting an
    /// absent task is a no-op.
    pub fn delete(&mut self, id: &TaskId) -> Option<(usize, Task)> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        info!("Task deleted: {:?}", id);
        self.notify(StoreEvent::Deleted { task_id: id.clone() });
        Some((idx, removed))
    }

    /// Swap in a freshly fetched collection.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        let count = self.tasks.len();
        self.notify(StoreEvent::Reloaded { count });
    }

    /// Adopt the remote's copy of a task that already exists locally.
    pub fn reconcile(&mut self, task: Task) -> bool {
        match self.position(&task.task_id) {
            Some(idx) => {
                if self.tasks[idx] != task {
                    let task_id = task.task_id.clone();
                    self.tasks[idx] = task;
                    self.notify(StoreEvent::Updated { task_id });
                }
                true
            }
            None => false,
        }
    }

    /// Put a task back, either over its current version or at `index`
    /// (clamped) when it is absent.
    pub fn restore(&mut self, task: Task, index: usize) {
        let task_id = task.task_id.clone();
        match self.position(&task_id) {
            Some(idx) => {
                self.tasks[idx] = task;
                self.notify(StoreEvent::Updated { task_id });
            }
            None => {
                let idx = index.min(self.tasks.len());
                self.tasks.insert(idx, task);
                self.notify(StoreEvent::Added { task_id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: "300 gsm, matte".to_string(),
            priority: crate::models::Priority::High,
            estimated_hours: 3.0,
            deadline: "2026-11-02T09:00:00Z".to_string(),
            status: None,
        }
    }

    #[test]
    fn add_assigns_fresh_ids_and_defaults_to_todo() {
        let mut store = TaskStore::new();
        let a = store.add(&draft("Flyers")).unwrap();
        let b = store.add(&draft("Posters")).unwrap();

        assert_ne!(a.task_id, b.task_id);
        assert_eq!(a.status, TaskStatus::Todo);
        assert_eq!(a.created_at, a.updated_at);
        let titles: Vec<_> = store.list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Flyers", "Posters"]);
    }

    #[test]
    fn add_rejects_invalid_drafts_without_touching_the_list() {
        let mut store = TaskStore::new();
        store.add(&draft("Flyers")).unwrap();
        let before = store.list().to_vec();

        assert!(matches!(store.add(&draft("")), Err(BoardError::Validation { .. })));
        let mut bad_deadline = draft("Banner");
        bad_deadline.deadline = "soon".into();
        assert!(matches!(
            store.add(&bad_deadline),
            Err(BoardError::Validation { .. })
        ));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn update_replaces_fields_but_keeps_created_at() {
        let mut store = TaskStore::new();
        let task = store.add(&draft("Flyers")).unwrap();

        let mut edited = task.clone();
        edited.title = "Flyers (reprint)".into();
        edited.created_at = Utc::now() + chrono::Duration::days(3);
        let updated = store.update(edited).unwrap();

        assert_eq!(updated.title, "Flyers (reprint)");
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[test]
    fn titles_are_stored_as_submitted() {
        let mut store = TaskStore::new();
        let task = store.add(&draft(" Flyers ")).unwrap();
        assert_eq!(store.get(&task.task_id).unwrap().title, " Flyers ");

        let mut edited = task.clone();
        edited.title = "Flyers (reprint)  ".into();
        store.update(edited).unwrap();
        assert_eq!(store.list()[0].title, "Flyers (reprint)  ");

        let mut blank = task;
        blank.title = "   ".into();
        assert!(matches!(store.update(blank), Err(BoardError::Validation { .. })));
    }

    #[test]
    fn update_of_missing_task_is_not_found() {
        let mut store = TaskStore::new();
        let mut ghost = store.add(&draft("Flyers")).unwrap();
        ghost.task_id = TaskId::from("ghost");
        assert_eq!(store.update(ghost), Err(BoardError::not_found("ghost")));
    }

    #[test]
    fn change_status_allows_any_direction() {
        let mut store = TaskStore::new();
        let task = store.add(&draft("Flyers")).unwrap();

        let done = store.change_status(&task.task_id, "completed").unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        let back = store.change_status(&task.task_id, "in-progress").unwrap();
        assert_eq!(back.status, TaskStatus::InProgress);
        assert!(back.updated_at >= done.updated_at);
        assert_eq!(back.created_at, task.created_at);
    }

    #[test]
    fn change_status_errors_leave_state_unchanged() {
        let mut store = TaskStore::new();
        let task = store.add(&draft("Flyers")).unwrap();
        let before = serde_json::to_string(store.list()).unwrap();

        assert_eq!(
            store.change_status(&TaskId::from("missing-id"), "completed"),
            Err(BoardError::not_found("missing-id"))
        );
        assert_eq!(
            store.change_status(&task.task_id, "shipped"),
            Err(BoardError::invalid_transition("shipped"))
        );
        assert_eq!(serde_json::to_string(store.list()).unwrap(), before);
    }

    #[test]
    fn delete_twice_is_a_no_op_the_second_time() {
        let mut store = TaskStore::new();
        let task = store.add(&draft("Flyers")).unwrap();
        store.add(&draft("Posters")).unwrap();

        assert!(store.delete(&task.task_id).is_some());
        let after_once = store.list().to_vec();
        assert!(store.delete(&task.task_id).is_none());
        assert_eq!(store.list(), after_once.as_slice());
    }

    #[test]
    fn subscribers_see_each_mutation_once() {
        let mut store = TaskStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let task = store.add(&draft("Flyers")).unwrap();
        store.set_status(&task.task_id, TaskStatus::Review).unwrap();
        let _ = store.change_status(&task.task_id, "nope");
        store.delete(&task.task_id);
        store.delete(&task.task_id);

        assert!(store.unsubscribe(sub));
        store.add(&draft("Posters")).unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            StoreEvent::StatusChanged {
                task_id: task.task_id.clone(),
                from: TaskStatus::Todo,
                to: TaskStatus::Review,
            }
        );
        assert_eq!(events[2], StoreEvent::Deleted { task_id: task.task_id.clone() });
    }

    #[test]
    fn restore_reinserts_at_the_original_index() {
        let mut store = TaskStore::new();
        store.add(&draft("A")).unwrap();
        let b = store.add(&draft("B")).unwrap();
        store.add(&draft("C")).unwrap();

        let (idx, removed) = store.delete(&b.task_id).unwrap();
        store.restore(removed, idx);

        let titles: Vec<_> = store.list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }
}
