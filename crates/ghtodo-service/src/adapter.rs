use std::sync::Arc;

use async_trait::async_trait;
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo};
use tracing::{debug, warn};

use crate::{RetryPolicy, ServiceError, TodoStore};

/// Entry point the REST layer and CLI program against.
///
/// Delegates to a store (normally a `FallbackStore`) and, after a
/// remote-backed create, polls the listing on `retry`'s schedule until the
/// new todo shows up.
pub struct TodoAdapter {
    store: Arc<dyn TodoStore>,
    retry: RetryPolicy,
}

impl TodoAdapter {
    pub fn new(store: Arc<dyn TodoStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    async fn wait_until_listed(&self, todo: &Todo) {
        let store = &self.store;
        let id = todo.id;
        let visible = self
            .retry
            .poll(|attempt| async move {
                match store.list_todos().await {
                    Ok(todos) => todos.iter().any(|t| t.id == id),
                    Err(e) => {
                        debug!(id, attempt, "listing after create failed: {e}");
                        false
                    }
                }
            })
            .await;
        if visible {
            debug!(id, "created todo is visible in listing");
        } else if self.retry.max_attempts > 0 {
            warn!(
                id,
                attempts = self.retry.max_attempts,
                "created todo not yet visible in listing"
            );
        }
    }
}

#[async_trait]
impl TodoStore for TodoAdapter {
    fn name(&self) -> &str {
        self.store.name()
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError> {
        self.store.list_todos().await
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError> {
        let todo = self.store.create_todo(input).await?;
        if todo.is_remote() {
            self.wait_until_listed(&todo).await;
        }
        Ok(todo)
    }

    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError> {
        self.store.update_todo(id, update).await
    }

    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError> {
        self.store.delete_todo(id).await
    }
}
