use async_trait::async_trait;
use ghtodo_core::api::{CreateTodoRequest, TodoResponse, UpdateTodoRequest};
use ghtodo_core::stats::{DateRange, StatusFilter, TodoStats};
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo};
use reqwest::{Client, StatusCode};

use crate::{ServiceError, TodoStore};

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub store: String,
}

/// Async HTTP client implementation of TodoStore.
/// Connects to a running ghtodo-server.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<HealthStatus, ServiceError> {
        self.get_json("/api/health").await
    }

    /// Todos filtered server-side by status tab and free-text search.
    pub async fn list_filtered(
        &self,
        status: StatusFilter,
        search: Option<&str>,
    ) -> Result<Vec<Todo>, ServiceError> {
        let mut params = vec![("status", status.as_str().to_string())];
        if let Some(q) = search {
            params.push(("q", q.to_string()));
        }
        let resp = self
            .client
            .get(format!("{}/api/todos", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        let todos: Vec<TodoResponse> = handle_response(resp).await?;
        Ok(todos.into_iter().map(|t| t.todo).collect())
    }

    pub async fn stats(&self, range: Option<&DateRange>) -> Result<TodoStats, ServiceError> {
        let mut builder = self.client.get(format!("{}/api/stats", self.base_url));
        if let Some(r) = range {
            builder = builder.query(&[("start", r.start.to_rfc3339()), ("end", r.end.to_rfc3339())]);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        handle_response(resp).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        handle_response(resp).await
    }

    async fn put_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let resp = self
            .client
            .put(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        handle_response(resp).await
    }

    async fn delete_req(&self, path: &str) -> Result<(), ServiceError> {
        let resp = self
            .client
            .delete(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    if resp.status().is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error(resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST => ServiceError::InvalidInput(msg),
        StatusCode::SERVICE_UNAVAILABLE => ServiceError::Unavailable(msg),
        _ => ServiceError::Internal(msg),
    }
}

#[async_trait]
impl TodoStore for HttpService {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError> {
        let todos: Vec<TodoResponse> = self.get_json("/api/todos").await?;
        Ok(todos.into_iter().map(|t| t.todo).collect())
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError> {
        let resp: TodoResponse = self
            .post_json("/api/todos", &CreateTodoRequest::from(input))
            .await?;
        Ok(resp.todo)
    }

    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError> {
        let resp: TodoResponse = self
            .put_json(&format!("/api/todos/{id}"), &UpdateTodoRequest::from(update))
            .await?;
        Ok(resp.todo)
    }

    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError> {
        self.delete_req(&format!("/api/todos/{id}")).await
    }
}
