use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Longest title accepted by the issue tracker, in characters.
pub const TITLE_MAX_CHARS: usize = 250;

/// Appended to titles cut down to fit `TITLE_MAX_CHARS`.
pub const TRUNCATION_MARKER: &str = "...";

/// Label marking an issue as a todo owned by this application.
pub const TODO_LABEL: &str = "todo";

/// Extra label applied when a remote todo is soft-deleted.
pub const DELETED_LABEL: &str = "deleted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    /// Issue number used to address the remote record. `None` for
    /// todos that only exist in the local fallback store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// The composed single-string form of title and description.
    pub fn text(&self) -> String {
        compose_text(&self.title, &self.description)
    }

    pub fn is_remote(&self) -> bool {
        self.remote_ref.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Split composed text into title (first line) and description.
    pub fn from_text(text: &str) -> Self {
        let (title, description) = parse_text(text);
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    /// Trimmed and truncated title, blank description collapsed to empty.
    /// Fails when the title is empty after trimming.
    pub fn normalized(&self) -> Result<CreateTodo, CoreError> {
        Ok(CreateTodo {
            title: normalize_title(&self.title)?,
            description: normalize_description(&self.description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTodo {
    /// Replace both title and description from composed text.
    pub fn from_text(text: &str) -> Self {
        let (title, description) = parse_text(text);
        Self {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn normalized(&self) -> Result<UpdateTodo, CoreError> {
        let title = match &self.title {
            Some(t) => Some(normalize_title(t)?),
            None => None,
        };
        Ok(UpdateTodo {
            title,
            description: self.description.as_deref().map(normalize_description),
            completed: self.completed,
        })
    }

    /// Apply the present fields to `todo` and stamp `updated_at`.
    /// Expects an already normalized update.
    pub fn apply_to(&self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(description) = &self.description {
            todo.description = description.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = now;
    }
}

/// `title` alone when the description is empty, otherwise
/// `title + "\n" + description`.
pub fn compose_text(title: &str, description: &str) -> String {
    if description.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n{description}")
    }
}

/// Inverse of [`compose_text`]: line 0 is the title, the remaining
/// lines (rejoined with `\n`) are the description.
pub fn parse_text(text: &str) -> (&str, &str) {
    text.split_once('\n').unwrap_or((text, ""))
}

/// Titles longer than `TITLE_MAX_CHARS` keep their first 247 characters
/// followed by the truncation marker.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }
    let keep = TITLE_MAX_CHARS - TRUNCATION_MARKER.chars().count();
    let mut out: String = title.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn normalize_title(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidText("title must not be empty".into()));
    }
    Ok(truncate_title(trimmed))
}

fn normalize_description(raw: &str) -> String {
    if raw.trim().is_empty() {
        String::new()
    } else {
        raw.to_string()
    }
}
