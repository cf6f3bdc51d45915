//! Due date queries, filtering and sorting over a snapshot of todos

use crate::dates::{date_filter_ranges, is_same_day};
use crate::todo::Todo;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Incomplete todos whose due date has passed
pub fn overdue_todos(todos: &[Todo], now: NaiveDateTime) -> Vec<Todo> {
    todos.iter().filter(|t| t.is_overdue(now)).cloned().collect()
}

/// Incomplete todos due later today
pub fn due_today_todos(todos: &[Todo], now: NaiveDateTime) -> Vec<Todo> {
    todos
        .iter()
        .filter(|t| match t.due_date {
            Some(due) => !t.is_completed() && is_same_day(due, now) && due >= now,
            None => false,
        })
        .cloned()
        .collect()
}

/// Incomplete todos due within the next `hours`
pub fn urgent_todos(todos: &[Todo], now: NaiveDateTime, hours: i64) -> Vec<Todo> {
    let window = Duration::hours(hours);
    todos
        .iter()
        .filter(|t| match t.due_date {
            Some(due) => {
                let remaining = due - now;
                !t.is_completed() && remaining >= Duration::zero() && remaining <= window
            }
            None => false,
        })
        .cloned()
        .collect()
}

/// Todos due between `start` and `end`, both inclusive
pub fn todos_by_due_date(todos: &[Todo], start: NaiveDateTime, end: NaiveDateTime) -> Vec<Todo> {
    todos
        .iter()
        .filter(|t| t.due_date.is_some_and(|due| start <= due && due <= end))
        .cloned()
        .collect()
}

pub fn todos_with_overdue_subtasks(todos: &[Todo], now: NaiveDateTime) -> Vec<Todo> {
    todos
        .iter()
        .filter(|t| t.has_overdue_subtasks(now))
        .cloned()
        .collect()
}

/// Case-insensitive search over todo and subtask titles
///
/// An empty search matches everything. Completed todos are dropped unless
/// `show_completed` is set.
pub fn filter_todos(todos: &[Todo], search: &str, show_completed: bool) -> Vec<Todo> {
    let needle = search.trim().to_lowercase();
    todos
        .iter()
        .filter(|t| show_completed || !t.is_completed())
        .filter(|t| {
            needle.is_empty()
                || t.title.to_lowercase().contains(&needle)
                || t.subtasks
                    .iter()
                    .any(|s| s.title.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Title,
    Progress,
    DueDate,
}

impl SortKey {
    /// Progress lists the most advanced todos first; everything else ascends
    pub fn default_order(self) -> SortOrder {
        match self {
            SortKey::Progress => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "created_at" | "created" => Ok(SortKey::CreatedAt),
            "title" => Ok(SortKey::Title),
            "progress" => Ok(SortKey::Progress),
            "due_date" | "due" => Ok(SortKey::DueDate),
            _ => Err(format!(
                "Invalid sort key '{}'. Valid options are: created_at, title, progress, due_date",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid options are: asc, desc",
                s
            )),
        }
    }
}

/// Due date filter for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    #[default]
    All,
    /// Due at any time today
    DueToday,
    /// Past due and not completed
    Overdue,
    /// Due between Monday 00:00 and Sunday 23:59 of the current week
    ThisWeek,
}

impl DueFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueFilter::All => "all",
            DueFilter::DueToday => "due_today",
            DueFilter::Overdue => "overdue",
            DueFilter::ThisWeek => "this_week",
        }
    }

    pub fn matches(&self, todo: &Todo, now: NaiveDateTime) -> bool {
        let ranges = date_filter_ranges(now);
        match self {
            DueFilter::All => true,
            DueFilter::Overdue => todo.is_overdue(now),
            DueFilter::DueToday => todo.due_date.is_some_and(|d| ranges.today.contains(d)),
            DueFilter::ThisWeek => todo.due_date.is_some_and(|d| ranges.this_week.contains(d)),
        }
    }
}

impl fmt::Display for DueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DueFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "" => Ok(DueFilter::All),
            "due_today" | "today" => Ok(DueFilter::DueToday),
            "overdue" => Ok(DueFilter::Overdue),
            "this_week" | "week" => Ok(DueFilter::ThisWeek),
            _ => Err(format!(
                "Invalid filter '{}'. Valid options are: all, due_today, overdue, this_week",
                s
            )),
        }
    }
}

/// Sort in place; todos without a due date stay last under `DueDate` in either order
pub fn sort_todos(todos: &mut [Todo], key: SortKey, order: SortOrder) {
    let descending = order == SortOrder::Descending;
    let directed = |ordering: Ordering| {
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    };

    match key {
        SortKey::CreatedAt => todos.sort_by(|a, b| directed(a.created_at.cmp(&b.created_at))),
        SortKey::Title => {
            todos.sort_by(|a, b| directed(a.title.to_lowercase().cmp(&b.title.to_lowercase())))
        }
        SortKey::Progress => todos.sort_by(|a, b| {
            directed(a.completion_rate().total_cmp(&b.completion_rate()))
        }),
        SortKey::DueDate => todos.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
    }
}

/// Everything a listing can be narrowed and ordered by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub filter: DueFilter,
    pub show_completed: bool,
    pub search: String,
    pub sort: SortKey,
    /// `None` uses the sort key's default order
    pub order: Option<SortOrder>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: DueFilter::All,
            show_completed: true,
            search: String::new(),
            sort: SortKey::CreatedAt,
            order: None,
        }
    }
}

/// Apply a full listing query to a snapshot
pub fn query_todos(todos: &[Todo], query: &ListQuery, now: NaiveDateTime) -> Vec<Todo> {
    let due_filtered: Vec<Todo> = todos
        .iter()
        .filter(|t| query.filter.matches(t, now))
        .cloned()
        .collect();
    let mut result = filter_todos(&due_filtered, &query.search, query.show_completed);
    let order = query.order.unwrap_or_else(|| query.sort.default_order());
    sort_todos(&mut result, query.sort, order);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::SubTask;
    use chrono::NaiveDate;

    // 2025-01-15 12:00 (水曜日)
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn todo(id: u32, title: &str, due_in_hours: Option<i64>) -> Todo {
        let mut t = Todo::new(id, title, "", now() - Duration::days(10) + Duration::hours(id as i64));
        t.due_date = due_in_hours.map(|h| now() + Duration::hours(h));
        t
    }

    fn ids(todos: &[Todo]) -> Vec<u32> {
        todos.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_due_queries() {
        let mut done = todo(5, "done late", Some(-5));
        done.mark_completed(now());
        let todos = vec![
            todo(1, "late", Some(-2)),
            todo(2, "tonight", Some(6)),
            todo(3, "tomorrow", Some(20)),
            todo(4, "later", Some(24 * 5)),
            done,
            todo(6, "no date", None),
        ];

        assert_eq!(ids(&overdue_todos(&todos, now())), vec![1]);
        assert_eq!(ids(&due_today_todos(&todos, now())), vec![2]);
        assert_eq!(ids(&urgent_todos(&todos, now(), 24)), vec![2, 3]);
        assert_eq!(
            ids(&todos_by_due_date(&todos, now() - Duration::hours(5), now() + Duration::hours(6))),
            vec![1, 2, 5]
        );
    }

    #[test]
    fn test_urgent_window_is_inclusive() {
        let todos = vec![todo(1, "edge", Some(24)), todo(2, "now", Some(0))];
        assert_eq!(ids(&urgent_todos(&todos, now(), 24)), vec![1, 2]);
    }

    #[test]
    fn test_filter_searches_subtasks_and_hides_completed() {
        let mut with_sub = todo(1, "Groceries", None);
        with_sub.add_subtask(SubTask::new(1, 1, "Buy MILK", now()));
        let mut finished = todo(2, "milk the cow", None);
        finished.mark_completed(now());
        let todos = vec![with_sub, finished, todo(3, "Other", None)];

        assert_eq!(ids(&filter_todos(&todos, "milk", true)), vec![1, 2]);
        assert_eq!(ids(&filter_todos(&todos, "milk", false)), vec![1]);
        assert_eq!(ids(&filter_todos(&todos, "", true)), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_due_date_keeps_missing_last() {
        let mut todos = vec![
            todo(1, "none", None),
            todo(2, "later", Some(48)),
            todo(3, "soon", Some(1)),
        ];
        sort_todos(&mut todos, SortKey::DueDate, SortOrder::Ascending);
        assert_eq!(ids(&todos), vec![3, 2, 1]);
        sort_todos(&mut todos, SortKey::DueDate, SortOrder::Descending);
        assert_eq!(ids(&todos), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_by_title_ignores_case() {
        let mut todos = vec![todo(1, "banana", None), todo(2, "Apple", None), todo(3, "cherry", None)];
        sort_todos(&mut todos, SortKey::Title, SortOrder::Ascending);
        assert_eq!(ids(&todos), vec![2, 1, 3]);
    }

    #[test]
    fn test_query_defaults_progress_to_descending() {
        let mut half = todo(1, "half", None);
        half.add_subtask(SubTask::new(1, 1, "a", now()));
        half.add_subtask(SubTask::new(2, 1, "b", now()));
        half.subtasks[0].mark_completed(now());
        let mut full = todo(2, "full", None);
        full.mark_completed(now());
        let todos = vec![todo(3, "zero", None), half, full];

        let query = ListQuery {
            sort: SortKey::Progress,
            ..ListQuery::default()
        };
        assert_eq!(ids(&query_todos(&todos, &query, now())), vec![2, 1, 3]);
    }

    #[test]
    fn test_query_this_week_filter() {
        // 日曜 2025-01-19 23:00 は今週、月曜 2025-01-20 は来週
        let todos = vec![
            todo(1, "sunday", Some(4 * 24 + 11)),
            todo(2, "next monday", Some(5 * 24 + 1)),
            todo(3, "monday past", Some(-2 * 24)),
        ];
        let query = ListQuery {
            filter: DueFilter::ThisWeek,
            ..ListQuery::default()
        };
        assert_eq!(ids(&query_todos(&todos, &query, now())), vec![1, 3]);
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("due_date".parse::<SortKey>(), Ok(SortKey::DueDate));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert_eq!("this_week".parse::<DueFilter>(), Ok(DueFilter::ThisWeek));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
