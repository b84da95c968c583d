use async_trait::async_trait;
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::doc;
use mongodb::{options::ClientOptions, Client, Collection};

use crate::error::{BoardError, Result};
use crate::models::{Task, TaskId};
use crate::persistence::TaskRepository;

/// MongoDB-backed task storage. Documents are keyed by `task_id`; the
/// driver-assigned `_id` gives insertion order.
pub struct MongoTaskRepository {
    pub client: Client,
    tasks: Collection<Task>,
}

impl MongoTaskRepository {
    pub async fn init(uri: &str, db_name: &str, collection: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let tasks = client.database(db_name).collection::<Task>(collection);
        info!("Using MongoDB collection {}.{}", db_name, collection);
        Ok(MongoTaskRepository { client, tasks })
    }
}

#[async_trait]
impl TaskRepository for MongoTaskRepository {
    async fn fetch_all(&self) -> Result<Vec<Task>> {
        let mut cursor = self.tasks.find(doc! {}).sort(doc! { "_id": 1 }).await?;

        let mut tasks = vec![];
        while let Some(task_res) = cursor.next().await {
            match task_res {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    error!("Error reading tasks cursor: {}", e);
                    return Err(e.into());
                }
            }
        }
        Ok(tasks)
    }

    async fn create(&self, task: Task) -> Result<Task> {
        self.tasks.insert_one(&task).await?;
        info!("Task stored: {:?}", task.task_id);
        Ok(task)
    }

    async fn replace(&self, task_id: &TaskId, task: Task) -> Result<Task> {
        let filter = doc! { "task_id": task_id.as_str() };
        let res = self.tasks.replace_one(filter, &task).await?;
        if res.matched_count == 0 {
            return Err(BoardError::not_found(task_id.as_str()));
        }
        Ok(task)
    }

    async fn remove(&self, task_id: &TaskId) -> Result<()> {
        let filter = doc! { "task_id": task_id.as_str() };
        let res = self.tasks.delete_one(filter).await?;
        if res.deleted_count == 0 {
            info!("Task {} already removed", task_id);
        }
        Ok(())
    }
}
