use async_trait::async_trait;
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo};
use ghtodo_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The issue tracker could not be reached or refused the request.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ServiceError {
    fn from(e: CoreError) -> Self {
        ServiceError::InvalidInput(e.to_string())
    }
}

/// Storage strategy for todos.
///
/// `RemoteTodoStore` keeps todos as GitHub issues, `InMemoryTodoStore`
/// keeps them in process memory. `FallbackStore` composes the two and
/// `HttpService` talks to a running ghtodo-server.
#[async_trait]
pub trait TodoStore: Send + Sync {
    fn name(&self) -> &str;

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError>;
    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError>;
    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError>;
}
