//! Read-only projections of the task collection.
//!
//! Every adapter borrows the store's slice for the duration of one render, so
//! a projection cannot outlive the next mutation.

mod calendar;
mod kanban;
mod table;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::models::{Priority, Task, TaskId, TaskStatus};

pub use calendar::{CalendarDay, CalendarProjection, CalendarView};
pub use kanban::{KanbanColumn, KanbanProjection, KanbanView};
pub use table::{SortDirection, TableProjection, TableSort, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Kanban,
    Table,
    Calendar,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewKind::Kanban => "kanban",
            ViewKind::Table => "table",
            ViewKind::Calendar => "calendar",
        })
    }
}

impl FromStr for ViewKind {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kanban" => Ok(ViewKind::Kanban),
            "table" => Ok(ViewKind::Table),
            "calendar" => Ok(ViewKind::Calendar),
            other => Err(BoardError::validation("view", format!("unknown view '{}'", other))),
        }
    }
}

/// User action reported by a view. The controller decides what it means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ViewIntent {
    ActivateTask { task_id: TaskId },
    RequestCreate { status: TaskStatus },
}

/// Local narrowing applied by every view before laying out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViewFilter {
    pub q: Option<String>,
    pub priority: Option<Priority>,
}

impl ViewFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                task.title.to_lowercase().contains(&q)
                    || task.description.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }

    pub(crate) fn apply<'a>(&self, tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> + 'a {
        let filter = self.clone();
        tasks.iter().filter(move |t| filter.matches(t))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Projection<'a> {
    Kanban(KanbanProjection<'a>),
    Table(TableProjection<'a>),
    Calendar(CalendarProjection<'a>),
}

impl Projection<'_> {
    pub fn kind(&self) -> ViewKind {
        match self {
            Projection::Kanban(_) => ViewKind::Kanban,
            Projection::Table(_) => ViewKind::Table,
            Projection::Calendar(_) => ViewKind::Calendar,
        }
    }

    pub fn task_count(&self) -> usize {
        match self {
            Projection::Kanban(p) => p.columns.iter().map(|c| c.tasks.len()).sum(),
            Projection::Table(p) => p.rows.len(),
            Projection::Calendar(p) => p.days.iter().map(|d| d.tasks.len()).sum(),
        }
    }
}

/// Query string accepted wherever the board is rendered: the filter plus
/// per-request table sorting and calendar paging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub q: Option<String>,
    pub priority: Option<Priority>,
    pub sort: Option<TableSort>,
    pub direction: Option<SortDirection>,
    /// `YYYY-MM`
    pub month: Option<String>,
}

impl ViewQuery {
    pub fn filter(&self) -> ViewFilter {
        ViewFilter {
            q: self.q.clone(),
            priority: self.priority,
        }
    }

    /// `base` with this query's table and calendar settings laid over it.
    pub fn views(&self, base: &ViewSet) -> Result<ViewSet, BoardError> {
        let mut views = base.clone();
        if let Some(sort) = self.sort {
            views.table.sort = sort;
        }
        if let Some(direction) = self.direction {
            views.table.direction = direction;
        }
        if let Some(month) = &self.month {
            views.calendar = CalendarView::for_month(month)?;
        }
        Ok(views)
    }
}

/// Contract shared by the kanban, table and calendar layouts.
pub trait ViewAdapter {
    fn kind(&self) -> ViewKind;

    fn project<'a>(&self, tasks: &'a [Task], filter: &ViewFilter) -> Projection<'a>;
}

/// The adapter configuration the board renders with.
#[derive(Debug, Clone, Default)]
pub struct ViewSet {
    pub kanban: KanbanView,
    pub table: TableView,
    pub calendar: CalendarView,
}

impl ViewSet {
    pub fn adapter(&self, kind: ViewKind) -> &dyn ViewAdapter {
        match kind {
            ViewKind::Kanban => &self.kanban,
            ViewKind::Table => &self.table,
            ViewKind::Calendar => &self.calendar,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::task;
    use super::*;

    #[test]
    fn filter_matches_text_and_priority() {
        let mut t = task("1", "Wedding invitations", TaskStatus::Todo, Priority::High, 3);
        t.description = "Letterpress on cotton stock".into();

        let by_text = ViewFilter { q: Some("COTTON".into()), priority: None };
        assert!(by_text.matches(&t));

        let by_priority = ViewFilter { q: None, priority: Some(Priority::Low) };
        assert!(!by_priority.matches(&t));

        assert!(ViewFilter::default().matches(&t));
    }

    #[test]
    fn every_kind_renders_through_its_adapter() {
        let tasks = vec![task("1", "Flyers", TaskStatus::Todo, Priority::Low, 4)];
        let views = ViewSet::default();
        for kind in [ViewKind::Kanban, ViewKind::Table, ViewKind::Calendar] {
            let projection = views.adapter(kind).project(&tasks, &ViewFilter::default());
            assert_eq!(projection.kind(), kind);
            assert_eq!(projection.task_count(), 1);
        }
    }

    #[test]
    fn view_kind_parses_its_display_form() {
        for kind in [ViewKind::Kanban, ViewKind::Table, ViewKind::Calendar] {
            assert_eq!(kind.to_string().parse::<ViewKind>().unwrap(), kind);
        }
        assert!("gantt".parse::<ViewKind>().is_err());
    }

    #[test]
    fn query_overrides_table_and_calendar_settings() {
        let query = ViewQuery {
            sort: Some(TableSort::Title),
            direction: Some(SortDirection::Desc),
            month: Some("2026-12".into()),
            ..ViewQuery::default()
        };
        let views = query.views(&ViewSet::default()).unwrap();
        assert_eq!(views.table.sort, TableSort::Title);
        assert_eq!(views.table.direction, SortDirection::Desc);
        assert_eq!(views.calendar.month, Some((2026, 12)));

        let untouched = ViewQuery::default().views(&views).unwrap();
        assert_eq!(untouched.table.sort, TableSort::Title);

        let bad = ViewQuery { month: Some("12/2026".into()), ..ViewQuery::default() };
        assert!(bad.views(&ViewSet::default()).is_err());
    }
}
