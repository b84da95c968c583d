// src/board_service.rs

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard};

use crate::board::{BoardController, Mutation, NotificationLevel};
use crate::error::{BoardError, Result};
use crate::persistence::TaskRepository;
use crate::task_store::TaskStore;

/// Work for the storage writer, answered through `done`.
enum StorageJob {
    Mirror {
        mutation: Mutation,
        done: oneshot::Sender<()>,
    },
    Refresh {
        done: oneshot::Sender<Result<usize>>,
    },
}

/// Pairs the board with remote task storage.
///
/// Gestures are applied to the local board first. Their remote writes are
/// queued while the board lock is still held, so storage sees them in the
/// order they were applied locally; a single writer task sends them one at a
/// time and reconciles (success) or rolls back (failure) under the lock
/// again. Refreshes go through the same queue.
pub struct BoardService {
    board: Arc<Mutex<BoardController>>,
    jobs: mpsc::UnboundedSender<StorageJob>,
}

impl BoardService {
    /// Build the board from the repository's current contents and start its
    /// storage writer. Must be called inside a tokio runtime.
    pub async fn load(repo: Arc<dyn TaskRepository>) -> Result<Self> {
        let tasks = repo.fetch_all().await?;
        info!("Board loaded with {} tasks", tasks.len());

        let board = Arc::new(Mutex::new(BoardController::new(TaskStore::with_tasks(tasks))));
        let (jobs, queue) = mpsc::unbounded_channel();
        let writer = StorageWriter {
            board: board.clone(),
            repo,
        };
        tokio::spawn(writer.run(queue));

        Ok(BoardService { board, jobs })
    }

    pub async fn lock(&self) -> MutexGuard<'_, BoardController> {
        self.board.lock().await
    }

    /// Run a board operation and mirror whatever it committed. Returns once
    /// storage has answered the write.
    pub async fn apply<F>(&self, op: F) -> Option<Mutation>
    where
        F: FnOnce(&mut BoardController) -> Option<Mutation>,
    {
        let (mutation, stale, written) = {
            let mut board = self.board.lock().await;
            let mutation = op(&mut *board);
            let written = match &mutation {
                Some(mutation) => self.enqueue(&mut *board, mutation.clone()),
                None => None,
            };
            (mutation, board.take_stale(), written)
        };

        if let Some(written) = written {
            if written.await.is_err() {
                warn!("storage writer dropped a write before answering");
            }
        }
        if stale || self.board.lock().await.take_stale() {
            if let Err(e) = self.refresh().await {
                error!("Refresh after stale board failed: {}", e);
            }
        }
        mutation
    }

    /// Queue the remote write. Called with the board locked so the queue
    /// order is the local apply order.
    fn enqueue(&self, board: &mut BoardController, mutation: Mutation) -> Option<oneshot::Receiver<()>> {
        let (done, written) = oneshot::channel();
        let job = StorageJob::Mirror {
            mutation: mutation.clone(),
            done,
        };
        match self.jobs.send(job) {
            Ok(()) => {
                board.track_write(mutation);
                Some(written)
            }
            Err(_) => {
                error!("storage writer is gone, {} stays local", mutation.task().task_id);
                board.handle_error(BoardError::Persistence("storage is unavailable".into()));
                None
            }
        }
    }

    /// Re-fetch everything from the repository and replace the local tasks.
    /// Runs after every write queued before it; writes queued after it are
    /// replayed over the fetched list.
    pub async fn refresh(&self) -> Result<usize> {
        let (done, answer) = oneshot::channel();
        self.jobs
            .send(StorageJob::Refresh { done })
            .map_err(|_| BoardError::Persistence("storage writer stopped".into()))?;
        answer
            .await
            .map_err(|_| BoardError::Persistence("storage writer stopped".into()))?
    }
}

/// Sends queued jobs to the repository one at a time.
struct StorageWriter {
    board: Arc<Mutex<BoardController>>,
    repo: Arc<dyn TaskRepository>,
}

impl StorageWriter {
    async fn run(self, mut queue: mpsc::UnboundedReceiver<StorageJob>) {
        while let Some(job) = queue.recv().await {
            match job {
                StorageJob::Mirror { mutation, done } => {
                    self.persist(&mutation).await;
                    let _ = done.send(());
                }
                StorageJob::Refresh { done } => {
                    let _ = done.send(self.refresh().await);
                }
            }
        }
        info!("Storage writer stopped");
    }

    async fn persist(&self, mutation: &Mutation) {
        let result = match mutation {
            Mutation::Created { task } => self.repo.create(task.clone()).await.map(Some),
            Mutation::Replaced { current, .. } => self
                .repo
                .replace(&current.task_id, current.clone())
                .await
                .map(Some),
            Mutation::Removed { task, .. } => self.repo.remove(&task.task_id).await.map(|_| None),
        };

        let mut board = self.board.lock().await;
        board.settle_write();
        match result {
            Ok(Some(remote)) => board.reconcile(mutation, remote),
            Ok(None) => {}
            Err(e) => {
                error!("Remote write for {} failed: {}", mutation.task().task_id, e);
                board.rollback(mutation);
                match e {
                    BoardError::NotFound { .. } => board.handle_error(e),
                    other => board.handle_error(BoardError::Persistence(other.to_string())),
                }
            }
        }
    }

    async fn refresh(&self) -> Result<usize> {
        let tasks = match self.repo.fetch_all().await {
            Ok(tasks) => tasks,
            Err(e) => {
                let mut board = self.board.lock().await;
                board.notify(NotificationLevel::Error, format!("Could not reload tasks: {}", e));
                return Err(e);
            }
        };
        let count = tasks.len();
        let mut board = self.board.lock().await;
        board.reload(tasks);
        board.take_stale();
        info!("Board refreshed with {} tasks", count);
        Ok(count)
    }
}
