//! Request and response bodies of the `/api/todos` REST surface.

use serde::{Deserialize, Serialize};

use crate::todo::{CreateTodo, Todo, UpdateTodo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub text: String,
}

impl From<&CreateTodo> for CreateTodoRequest {
    fn from(input: &CreateTodo) -> Self {
        Self {
            text: crate::todo::compose_text(&input.title, &input.description),
        }
    }
}

/// `text` replaces title and description together. `title` and
/// `description` set one half each and win over `text` when both are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn into_update(self) -> UpdateTodo {
        let mut update = match self.text.as_deref() {
            Some(text) => UpdateTodo::from_text(text),
            None => UpdateTodo::default(),
        };
        if self.title.is_some() {
            update.title = self.title;
        }
        if self.description.is_some() {
            update.description = self.description;
        }
        match self.completed {
            Some(c) => update.with_completed(c),
            None => update,
        }
    }
}

impl From<&UpdateTodo> for UpdateTodoRequest {
    fn from(update: &UpdateTodo) -> Self {
        Self {
            text: None,
            title: update.title.clone(),
            description: update.description.clone(),
            completed: update.completed,
        }
    }
}

/// A todo as returned over REST: the entity plus its composed `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoResponse {
    #[serde(flatten)]
    pub todo: Todo,
    pub text: String,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        let text = todo.text();
        Self { todo, text }
    }
}
