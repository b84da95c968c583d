use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{Projection, ViewAdapter, ViewFilter, ViewKind};
use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSort {
    #[default]
    Deadline,
    Priority,
    Title,
    Status,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct TableView {
    pub sort: TableSort,
    pub direction: SortDirection,
}

#[derive(Debug, Serialize)]
pub struct TableProjection<'a> {
    pub sort: TableSort,
    pub direction: SortDirection,
    pub rows: Vec<&'a Task>,
}

impl TableView {
    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ord = match self.sort {
            TableSort::Deadline => a.deadline.cmp(&b.deadline),
            TableSort::Priority => a.priority.cmp(&b.priority),
            TableSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            TableSort::Status => a.status.cmp(&b.status),
            TableSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

impl ViewAdapter for TableView {
    fn kind(&self) -> ViewKind {
        ViewKind::Table
    }

    fn project<'a>(&self, tasks: &'a [Task], filter: &ViewFilter) -> Projection<'a> {
        let mut rows: Vec<&'a Task> = filter.apply(tasks).collect();
        // stable: ties keep insertion order
        rows.sort_by(|a, b| self.compare(a, b));
        Projection::Table(TableProjection {
            sort: self.sort,
            direction: self.direction,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TaskStatus};
    use crate::views::test_support::task;

    fn titles(view: &TableView, tasks: &[Task]) -> Vec<String> {
        match view.project(tasks, &ViewFilter::default()) {
            Projection::Table(p) => p.rows.iter().map(|t| t.title.clone()).collect(),
            other => panic!("expected table, got {:?}", other.kind()),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Flyers", TaskStatus::Review, Priority::Low, 9),
            task("2", "Posters", TaskStatus::Todo, Priority::High, 3),
            task("3", "banners", TaskStatus::Closed, Priority::Low, 6),
        ]
    }

    #[test]
    fn default_sort_is_deadline_ascending() {
        assert_eq!(titles(&TableView::default(), &sample()), vec!["Posters", "banners", "Flyers"]);
    }

    #[test]
    fn priority_desc_keeps_ties_in_insertion_order() {
        let view = TableView {
            sort: TableSort::Priority,
            direction: SortDirection::Desc,
        };
        assert_eq!(titles(&view, &sample()), vec!["Posters", "Flyers", "banners"]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let view = TableView {
            sort: TableSort::Title,
            direction: SortDirection::Asc,
        };
        assert_eq!(titles(&view, &sample()), vec!["banners", "Flyers", "Posters"]);
    }
}
