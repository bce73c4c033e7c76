//! Client-side views over an already fetched list of todos: completion
//! statistics, status tabs, date ranges and free-text search.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::todo::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// Percentage rounded half up, 0 for an empty list.
    pub completion_rate: u32,
}

impl TodoStats {
    pub fn compute<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> Self {
        let (total, completed) = todos.into_iter().fold((0, 0), |(total, done), t| {
            (total + 1, done + usize::from(t.completed))
        });
        Self {
            total,
            completed,
            active: total - completed,
            completion_rate: completion_rate(completed, total),
        }
    }

    /// Stats over the todos created inside `range` only.
    pub fn compute_in_range(todos: &[Todo], range: Option<&DateRange>) -> Self {
        match range {
            Some(r) => Self::compute(todos.iter().filter(|t| r.contains(t.created_at))),
            None => Self::compute(todos),
        }
    }
}

/// `round(completed / total * 100)`, defined as 0 when `total` is 0.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    // floor(x + 0.5) in integer arithmetic
    ((completed as u64 * 200 + total as u64) / (total as u64 * 2)) as u32
}

/// Inclusive bounds on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(StatusFilter::All),
            "active" => Some(StatusFilter::Active),
            "completed" => Some(StatusFilter::Completed),
            _ => None,
        }
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which text fields a search query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFields {
    Title,
    Description,
    #[default]
    Both,
}

impl SearchFields {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "title" => Some(SearchFields::Title),
            "description" | "body" => Some(SearchFields::Description),
            "both" => Some(SearchFields::Both),
            _ => None,
        }
    }
}

/// Case-insensitive substring match. An empty field never matches.
pub fn matches_search(todo: &Todo, query: &str, fields: SearchFields) -> bool {
    let needle = query.to_lowercase();
    let hit = |field: &str| !field.is_empty() && field.to_lowercase().contains(&needle);
    match fields {
        SearchFields::Title => hit(&todo.title),
        SearchFields::Description => hit(&todo.description),
        SearchFields::Both => hit(&todo.title) || hit(&todo.description),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub fields: SearchFields,
    pub range: Option<DateRange>,
}

impl TodoQuery {
    pub fn matches(&self, todo: &Todo) -> bool {
        if !self.status.matches(todo) {
            return false;
        }
        if let Some(range) = &self.range {
            if !range.contains(todo.created_at) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => matches_search(todo, q, self.fields),
            _ => true,
        }
    }

    /// Keep the matching todos, preserving order.
    pub fn apply(&self, todos: Vec<Todo>) -> Vec<Todo> {
        todos.into_iter().filter(|t| self.matches(t)).collect()
    }
}
