use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use ghtodo_core::api::{CreateTodoRequest, TodoResponse, UpdateTodoRequest};
use ghtodo_core::stats::{SearchFields, StatusFilter, TodoQuery};
use ghtodo_core::todo::CreateTodo;
use ghtodo_service::{ServiceError, TodoStore};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{to_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", put(update_todo).delete(delete_todo))
}

#[derive(Debug, Deserialize)]
struct TodoListQuery {
    status: Option<String>,
    q: Option<String>,
    fields: Option<String>,
}

impl TodoListQuery {
    fn into_query(self) -> Result<TodoQuery, ServiceError> {
        let status = match self.status.as_deref() {
            Some(s) => StatusFilter::from_str(s)
                .ok_or_else(|| ServiceError::InvalidInput(format!("unknown status: {s}")))?,
            None => StatusFilter::All,
        };
        let fields = match self.fields.as_deref() {
            Some(f) => SearchFields::from_str(f)
                .ok_or_else(|| ServiceError::InvalidInput(format!("unknown search fields: {f}")))?,
            None => SearchFields::Both,
        };
        Ok(TodoQuery {
            status,
            search: self.q,
            fields,
            range: None,
        })
    }
}

fn render(todos: Vec<ghtodo_core::Todo>) -> Json<Value> {
    let body: Vec<TodoResponse> = todos.into_iter().map(TodoResponse::from).collect();
    Json(json!(body))
}

fn invalid_body(e: JsonRejection) -> ApiError {
    to_error(ServiceError::InvalidInput(format!(
        "invalid todo payload: {}",
        e.body_text()
    )))
}

/// Ids that are not numbers cannot match any todo.
fn todo_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| to_error(ServiceError::NotFound("todo not found".into())))
}

async fn list_todos(
    State(state): State<AppState>,
    Query(q): Query<TodoListQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = q.into_query().map_err(to_error)?;
    let todos = state.adapter.list_todos().await.map_err(to_error)?;
    Ok(render(query.apply(todos)))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = payload.map_err(invalid_body)?;
    let input = CreateTodo::from_text(&req.text);
    state
        .adapter
        .create_todo(&input)
        .await
        .map(|t| (StatusCode::CREATED, Json(json!(TodoResponse::from(t)))))
        .map_err(to_error)
}

async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = todo_id(path)?;
    let Json(req) = payload.map_err(invalid_body)?;
    state
        .adapter
        .update_todo(id, &req.into_update())
        .await
        .map(|t| Json(json!(TodoResponse::from(t))))
        .map_err(to_error)
}

async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = todo_id(path)?;
    state
        .adapter
        .delete_todo(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
