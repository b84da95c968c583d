// src/persistence.rs

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use crate::error::{BoardError, Result};
use crate::models::{Task, TaskId};

/// Remote task storage the board mirrors its mutations to.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks, oldest first
    async fn fetch_all(&self) -> Result<Vec<Task>>;

    async fn create(&self, task: Task) -> Result<Task>;

    /// Replace the stored task; `NotFound` if it is gone
    async fn replace(&self, task_id: &TaskId, task: Task) -> Result<Task>;

    /// Remove the task; removing an absent task succeeds
    async fn remove(&self, task_id: &TaskId) -> Result<()>;
}

/// Process-local repository. Used when no database is configured and in
/// tests, where `fail_next` simulates a remote outage.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<Vec<Task>>,
    fail_next: Mutex<Option<BoardError>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `err`.
    pub async fn fail_next(&self, err: BoardError) {
        *self.fail_next.lock().await = Some(err);
    }

    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    async fn check_failure(&self) -> Result<()> {
        match self.fail_next.lock().await.take() {
            Some(err) => {
                debug!("in-memory repository failing on request: {}", err);
                Err(err)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn fetch_all(&self) -> Result<Vec<Task>> {
        self.check_failure().await?;
        Ok(self.tasks.lock().await.clone())
    }

    async fn create(&self, task: Task) -> Result<Task> {
        self.check_failure().await?;
        let mut tasks = self.tasks.lock().await;
        if tasks.iter().any(|t| t.task_id == task.task_id) {
            return Err(BoardError::Persistence(format!(
                "duplicate task id {}",
                task.task_id
            )));
        }
        tasks.push(task.clone());
        Ok(task)
    }

    async fn replace(&self, task_id: &TaskId, task: Task) -> Result<Task> {
        self.check_failure().await?;
        let mut tasks = self.tasks.lock().await;
        let slot = tasks
            .iter_mut()
            .find(|t| &t.task_id == task_id)
            .ok_or_else(|| BoardError::not_found(task_id.as_str()))?;
        *slot = task.clone();
        Ok(task)
    }

    async fn remove(&self, task_id: &TaskId) -> Result<()> {
        self.check_failure().await?;
        self.tasks.lock().await.retain(|t| &t.task_id != task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskDraft, TaskStatus};
    use crate::task_store::TaskStore;

    fn sample_task(title: &str) -> Task {
        let mut store = TaskStore::new();
        let mut draft = TaskDraft::new_in(TaskStatus::Todo);
        draft.title = title.to_string();
        draft.deadline = "2026-11-11".to_string();
        store.add(&draft).unwrap()
    }

    #[tokio::test]
    async fn keeps_insertion_order() {
        let repo = InMemoryTaskRepository::new();
        for title in ["A", "B", "C"] {
            repo.create(sample_task(title)).await.unwrap();
        }
        let titles: Vec<_> = repo.fetch_all().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn replace_unknown_is_not_found_and_remove_unknown_is_ok() {
        let repo = InMemoryTaskRepository::new();
        let task = sample_task("A");
        let id = task.task_id.clone();

        assert!(matches!(repo.replace(&id, task).await, Err(BoardError::NotFound { .. })));
        assert!(repo.remove(&id).await.is_ok());
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let repo = InMemoryTaskRepository::new();
        repo.fail_next(BoardError::Persistence("offline".into())).await;

        assert!(repo.create(sample_task("A")).await.is_err());
        assert!(repo.create(sample_task("A")).await.is_ok());
        assert_eq!(repo.snapshot().await.len(), 1);
    }
}
