use async_trait::async_trait;
use chrono::Utc;
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo};
use tokio::sync::Mutex;

use crate::{ServiceError, TodoStore};

struct Inner {
    todos: Vec<Todo>,
    next_id: u64,
}

/// Process-lifetime todo list used when the issue tracker is unreachable.
/// Ids come from a counter that only moves forward, so a deleted id is
/// never handed out again.
pub struct InMemoryTodoStore {
    inner: Mutex<Inner>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::with_todos(Vec::new())
    }

    /// Store pre-populated with the two example entries shown on a fresh
    /// install.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let seed = |id, title: &str, completed| Todo {
            id,
            remote_ref: None,
            title: title.to_string(),
            description: String::new(),
            completed,
            created_at: now,
            updated_at: now,
        };
        Self::with_todos(vec![
            seed(1, "Learn React", true),
            seed(2, "Learn Ant Design", false),
        ])
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let next_id = todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner { todos, next_id }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.todos.len()
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: u64) -> ServiceError {
    ServiceError::NotFound(format!("todo {id}"))
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError> {
        Ok(self.inner.lock().await.todos.clone())
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError> {
        let input = input.normalized()?;
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let todo = Todo {
            id: inner.next_id,
            remote_ref: None,
            title: input.title,
            description: input.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        inner.next_id += 1;
        inner.todos.push(todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError> {
        let mut inner = self.inner.lock().await;
        let todo = inner
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        let update = update.normalized()?;
        update.apply_to(todo, Utc::now());
        Ok(todo.clone())
    }

    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().await;
        let idx = inner
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        inner.todos.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_appends_with_increasing_ids() {
        let store = InMemoryTodoStore::new();
        let a = store.create_todo(&CreateTodo::new("first")).await.unwrap();
        let b = store.create_todo(&CreateTodo::new("second")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.completed);
        assert!(a.remote_ref.is_none());

        let ids: Vec<u64> = store.list_todos().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn seeded_store_continues_after_seed_ids() {
        let store = InMemoryTodoStore::seeded();
        assert_eq!(store.len().await, 2);
        let todo = store.create_todo(&CreateTodo::new("third")).await.unwrap();
        assert_eq!(todo.id, 3);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = InMemoryTodoStore::new();
        let a = store.create_todo(&CreateTodo::new("a")).await.unwrap();
        store.delete_todo(a.id).await.unwrap();
        let b = store.create_todo(&CreateTodo::new("b")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn update_refreshes_timestamp_and_fields() {
        let store = InMemoryTodoStore::new();
        let todo = store.create_todo(&CreateTodo::new("Buy milk")).await.unwrap();
        let updated = store
            .update_todo(todo.id, &UpdateTodo::completed(true))
            .await
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Buy milk");
        assert!(updated.updated_at >= todo.updated_at);
        assert_eq!(updated.created_at, todo.created_at);
    }

    #[tokio::test]
    async fn update_rejects_blank_text() {
        let store = InMemoryTodoStore::new();
        let todo = store.create_todo(&CreateTodo::new("Buy milk")).await.unwrap();
        let err = store
            .update_todo(todo.id, &UpdateTodo::from_text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let unchanged = store.list_todos().await.unwrap();
        assert_eq!(unchanged[0].title, "Buy milk");
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = InMemoryTodoStore::new();
        assert!(matches!(
            store.delete_todo(42).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            store.update_todo(42, &UpdateTodo::completed(true)).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let store = InMemoryTodoStore::new();
        let err = store.create_todo(&CreateTodo::new(" \t")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(store.len().await, 0);
    }
}
