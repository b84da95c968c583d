//! Task board for the print-shop back office.
//!
//! One in-memory task collection, projected through kanban, table and
//! calendar views, with drag-and-drop status changes mirrored to remote task
//! storage.

pub mod app_state;
pub mod board;
pub mod board_api;
pub mod board_server;
pub mod board_service;
pub mod config;
pub mod drag_session;
pub mod error;
pub mod models;
pub mod persistence;
pub mod task_db;
pub mod task_store;
pub mod views;
pub mod web_socket_server;

pub use board::{BoardController, EditorTarget, Mutation, Notification, NotificationLevel};
pub use board_service::BoardService;
pub use drag_session::{DragSessionTracker, DropOutcome};
pub use error::{BoardError, Result};
pub use models::{Priority, Task, TaskDraft, TaskId, TaskStatus};
pub use persistence::{InMemoryTaskRepository, TaskRepository};
pub use task_store::{StoreEvent, TaskStore};
pub use views::{ViewFilter, ViewIntent, ViewKind, ViewQuery};
