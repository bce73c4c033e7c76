use std::sync::Arc;

use async_trait::async_trait;
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo};
use tracing::warn;

use crate::{ServiceError, TodoStore};

/// Runs every operation against `primary` and, when it is unavailable or
/// reports `NotFound`, re-issues it against `fallback`.
///
/// A `NotFound` on list or create means the collection itself is missing
/// (wrong owner/repo, or a token that cannot see the repository). On
/// update and delete the id may belong to a todo created while the
/// primary was down. The two stores are never reconciled.
pub struct FallbackStore {
    primary: Arc<dyn TodoStore>,
    fallback: Arc<dyn TodoStore>,
    name: String,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn TodoStore>, fallback: Arc<dyn TodoStore>) -> Self {
        let name = format!("{}+{}", primary.name(), fallback.name());
        Self {
            primary,
            fallback,
            name,
        }
    }

    fn log_fall_through(&self, op: &str, err: &ServiceError) {
        warn!(
            store = self.primary.name(),
            fallback = self.fallback.name(),
            "{op} failed, using fallback: {err}"
        );
    }
}

fn unavailable_or_missing(err: &ServiceError) -> bool {
    matches!(err, ServiceError::Unavailable(_) | ServiceError::NotFound(_))
}

#[async_trait]
impl TodoStore for FallbackStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError> {
        match self.primary.list_todos().await {
            Err(e) if unavailable_or_missing(&e) => {
                self.log_fall_through("list", &e);
                self.fallback.list_todos().await
            }
            other => other,
        }
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError> {
        match self.primary.create_todo(input).await {
            Err(e) if unavailable_or_missing(&e) => {
                self.log_fall_through("create", &e);
                self.fallback.create_todo(input).await
            }
            other => other,
        }
    }

    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError> {
        match self.primary.update_todo(id, update).await {
            Err(e) if unavailable_or_missing(&e) => {
                self.log_fall_through("update", &e);
                self.fallback.update_todo(id, update).await
            }
            other => other,
        }
    }

    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError> {
        match self.primary.delete_todo(id).await {
            Err(e) if unavailable_or_missing(&e) => {
                self.log_fall_through("delete", &e);
                self.fallback.delete_todo(id).await
            }
            other => other,
        }
    }
}
