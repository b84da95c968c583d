mod task;

pub use task::{parse_deadline, Priority, Task, TaskDraft, TaskId, TaskStatus, ValidDraft};
pub(crate) use task::{validate_hours, validate_title};
