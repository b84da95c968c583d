use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{Projection, ViewAdapter, ViewFilter, ViewKind};
use crate::error::{BoardError, Result};
use crate::models::Task;

/// Tasks laid out by deadline day (UTC). `month` limits the range to a
/// single `(year, month)` page.
#[derive(Debug, Clone, Default)]
pub struct CalendarView {
    pub month: Option<(i32, u32)>,
}

impl CalendarView {
    /// Page on the month given as `YYYY-MM`.
    pub fn for_month(raw: &str) -> Result<Self> {
        let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").map_err(|_| {
            BoardError::validation("month", format!("'{}' is not a YYYY-MM month", raw))
        })?;
        Ok(CalendarView {
            month: Some((first.year(), first.month())),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Serialize)]
pub struct CalendarProjection<'a> {
    pub days: Vec<CalendarDay<'a>>,
}

impl ViewAdapter for CalendarView {
    fn kind(&self) -> ViewKind {
        ViewKind::Calendar
    }

    fn project<'a>(&self, tasks: &'a [Task], filter: &ViewFilter) -> Projection<'a> {
        let mut by_day: BTreeMap<NaiveDate, Vec<&'a Task>> = BTreeMap::new();
        for task in filter.apply(tasks) {
            let date = task.deadline.date_naive();
            if let Some((year, month)) = self.month {
                if date.year() != year || date.month() != month {
                    continue;
                }
            }
            by_day.entry(date).or_default().push(task);
        }

        let days = by_day
            .into_iter()
            .map(|(date, tasks)| CalendarDay { date, tasks })
            .collect();
        Projection::Calendar(CalendarProjection { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::{Priority, TaskStatus};
    use crate::views::test_support::task;

    fn days(view: &CalendarView, tasks: &[Task]) -> Vec<(u32, usize)> {
        match view.project(tasks, &ViewFilter::default()) {
            Projection::Calendar(p) => p.days.iter().map(|d| (d.date.day(), d.tasks.len())).collect(),
            other => panic!("expected calendar, got {:?}", other.kind()),
        }
    }

    #[test]
    fn groups_by_deadline_day_in_date_order() {
        let tasks = vec![
            task("1", "Flyers", TaskStatus::Todo, Priority::Low, 12),
            task("2", "Posters", TaskStatus::Review, Priority::High, 4),
            task("3", "Banners", TaskStatus::Todo, Priority::Low, 12),
        ];
        assert_eq!(days(&CalendarView::default(), &tasks), vec![(4, 1), (12, 2)]);
    }

    #[test]
    fn month_page_drops_other_months() {
        let mut next_month = task("2", "Calendars", TaskStatus::Todo, Priority::Low, 20);
        next_month.deadline = next_month.deadline + Duration::days(31);
        let tasks = vec![task("1", "Flyers", TaskStatus::Todo, Priority::Low, 12), next_month];

        let view = CalendarView { month: Some((2026, 10)) };
        assert_eq!(days(&view, &tasks), vec![(12, 1)]);
    }

    #[test]
    fn month_parses_from_year_dash_month() {
        assert_eq!(CalendarView::for_month("2026-11").unwrap().month, Some((2026, 11)));
        for bad in ["2026-13", "November", "2026", ""] {
            assert!(matches!(
                CalendarView::for_month(bad),
                Err(BoardError::Validation { ref field, .. }) if field == "month"
            ));
        }
    }
}
