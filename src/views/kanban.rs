use serde::Serialize;

use super::{Projection, ViewAdapter, ViewFilter, ViewIntent, ViewKind};
use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct KanbanView;

#[derive(Debug, Serialize)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub label: &'static str,
    /// Drop-target id the UI attaches to this column.
    pub drop_target: String,
    pub tasks: Vec<&'a Task>,
    pub estimated_hours: f64,
}

impl KanbanColumn<'_> {
    pub fn create_intent(&self) -> ViewIntent {
        ViewIntent::RequestCreate {
            status: self.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KanbanProjection<'a> {
    pub columns: Vec<KanbanColumn<'a>>,
}

impl<'a> KanbanProjection<'a> {
    pub fn column(&self, status: TaskStatus) -> Option<&KanbanColumn<'a>> {
        self.columns.iter().find(|c| c.status == status)
    }
}

impl ViewAdapter for KanbanView {
    fn kind(&self) -> ViewKind {
        ViewKind::Kanban
    }

    fn project<'a>(&self, tasks: &'a [Task], filter: &ViewFilter) -> Projection<'a> {
        let mut columns: Vec<KanbanColumn<'a>> = TaskStatus::ALL
            .iter()
            .map(|status| KanbanColumn {
                status: *status,
                label: status.label(),
                drop_target: status.column_id(),
                tasks: Vec::new(),
                estimated_hours: 0.0,
            })
            .collect();

        for task in filter.apply(tasks) {
            if let Some(column) = columns.iter_mut().find(|c| c.status == task.status) {
                column.estimated_hours += task.estimated_hours;
                column.tasks.push(task);
            }
        }

        Projection::Kanban(KanbanProjection { columns })
    }
}
