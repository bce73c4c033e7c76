//! In-process servers for tests: the ghtodo REST surface backed by
//! in-memory or fake-GitHub stores, and a minimal fake of the GitHub
//! Issues API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use ghtodo_service::github::{Issue, IssueLabel, IssueState};
use ghtodo_service::{
    FallbackStore, GitHubConfig, InMemoryTodoStore, RemoteTodoStore, RetryPolicy, TodoAdapter,
    TodoStore,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::routes::{build_router, AppState, GitHubProxy, InnerAppState};

/// Token the fake GitHub accepts and the test stores send.
pub const TEST_TOKEN: &str = "ghp_test_token";

/// Nothing listens on the discard port, so requests fail fast.
const UNREACHABLE_API: &str = "http://127.0.0.1:9";

/// Retry schedule that still polls once but never sleeps.
pub fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        initial_delay: Duration::ZERO,
        max_attempts: 1,
        interval: Duration::ZERO,
    }
}

pub fn state_with_store(store: Arc<dyn TodoStore>, proxy_api: &str) -> AppState {
    let proxy_config = GitHubConfig::new("octo", "todos", Some(TEST_TOKEN.into()))
        .with_api_url(proxy_api);
    let proxy = GitHubProxy::new(&proxy_config).unwrap();
    Arc::new(InnerAppState {
        adapter: TodoAdapter::new(store, quick_retry()),
        proxy,
    })
}

/// Router over an empty in-memory store.
pub fn test_router() -> Router {
    build_router(state_with_store(
        Arc::new(InMemoryTodoStore::new()),
        UNREACHABLE_API,
    ))
}

/// Router over the seeded in-memory store.
pub fn seeded_test_router() -> Router {
    build_router(state_with_store(
        Arc::new(InMemoryTodoStore::seeded()),
        UNREACHABLE_API,
    ))
}

/// GitHub at `api_url` first, an empty in-memory store as fallback.
pub fn github_state(api_url: &str) -> AppState {
    let config = GitHubConfig::new("octo", "todos", Some(TEST_TOKEN.into())).with_api_url(api_url);
    let remote = Arc::new(RemoteTodoStore::new(config).unwrap());
    let store = Arc::new(FallbackStore::new(remote, Arc::new(InMemoryTodoStore::new())));
    state_with_store(store, api_url)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

pub async fn spawn_server(state: AppState) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url: format!("http://{addr}"),
        _handle: handle,
    }
}

/// Spawn a server over an empty in-memory store on a random port.
pub async fn spawn_test_server() -> TestServer {
    spawn_server(state_with_store(
        Arc::new(InMemoryTodoStore::new()),
        UNREACHABLE_API,
    ))
    .await
}

// -- Fake GitHub --

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub authorized: bool,
}

#[derive(Default)]
struct FakeState {
    issues: Vec<Issue>,
    requests: Vec<RecordedRequest>,
    failing: bool,
}

type Fake = Arc<Mutex<FakeState>>;

impl FakeState {
    fn record(&mut self, method: &str, path: String, body: Value, headers: &HeaderMap) -> Option<Response> {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("token {TEST_TOKEN}"))
            .unwrap_or(false);
        self.requests.push(RecordedRequest {
            method: method.to_string(),
            path,
            body,
            authorized,
        });
        if self.failing {
            return Some(gh_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error"));
        }
        if !authorized {
            return Some(gh_error(StatusCode::UNAUTHORIZED, "Bad credentials"));
        }
        None
    }
}

fn gh_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
}

fn labels_from(body: &Value) -> Option<Vec<IssueLabel>> {
    body["labels"].as_array().map(|labels| {
        labels
            .iter()
            .filter_map(|l| l.as_str())
            .map(|name| IssueLabel { name: name.to_string() })
            .collect()
    })
}

/// Handle on a running fake GitHub API.
pub struct FakeGitHub {
    pub base_url: String,
    state: Fake,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeGitHub {
    /// Make every request fail with a 500.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.state.lock().unwrap().issues.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn push_issue(&self, issue: Issue) {
        self.state.lock().unwrap().issues.push(issue);
    }

    /// An issue as GitHub would return it, created `minutes` after a
    /// fixed base time.
    pub fn issue(number: u64, title: &str, minutes: i64) -> Issue {
        let at = base_time() + chrono::Duration::minutes(minutes);
        Issue {
            id: 1000 + number,
            number,
            title: title.to_string(),
            body: None,
            state: IssueState::Open,
            labels: vec![IssueLabel { name: "todo".into() }],
            created_at: at,
            updated_at: at,
            pull_request: None,
        }
    }
}

pub async fn spawn_fake_github() -> FakeGitHub {
    let state: Fake = Arc::default();
    let app = Router::new()
        .route("/repos/{owner}/{repo}/issues", get(fake_list).post(fake_create))
        .route("/repos/{owner}/{repo}/issues/{number}", patch(fake_patch))
        .route("/users/{name}", get(fake_user))
        .route("/zen", get(fake_zen))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FakeGitHub {
        base_url: format!("http://{addr}"),
        state,
        _handle: handle,
    }
}

async fn fake_list(
    State(fake): State<Fake>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut s = fake.lock().unwrap();
    let query = serde_json::to_value(&params).unwrap_or(Value::Null);
    if let Some(resp) = s.record("GET", format!("/repos/{owner}/{repo}/issues"), query, &headers) {
        return resp;
    }
    let wanted_state = params.get("state").map(String::as_str).unwrap_or("open");
    let labels: Vec<&str> = params
        .get("labels")
        .map(|l| l.split(',').collect())
        .unwrap_or_default();
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let issues: Vec<&Issue> = s
        .issues
        .iter()
        .filter(|i| match wanted_state {
            "all" => true,
            "closed" => i.state.is_closed(),
            _ => !i.state.is_closed(),
        })
        .filter(|i| labels.iter().all(|l| i.has_label(l)))
        .skip(page.saturating_sub(1) * per_page)
        .take(per_page)
        .collect();
    Json(json!(issues)).into_response()
}

async fn fake_create(
    State(fake): State<Fake>,
    Path((owner, repo)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = fake.lock().unwrap();
    if let Some(resp) = s.record("POST", format!("/repos/{owner}/{repo}/issues"), body.clone(), &headers) {
        return resp;
    }
    let number = s.issues.len() as u64 + 1;
    let mut issue = FakeGitHub::issue(
        number,
        body["title"].as_str().unwrap_or_default(),
        number as i64,
    );
    issue.body = body["body"].as_str().map(String::from);
    issue.labels = labels_from(&body).unwrap_or_default();
    s.issues.push(issue.clone());
    (StatusCode::CREATED, Json(json!(issue))).into_response()
}

async fn fake_patch(
    State(fake): State<Fake>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = fake.lock().unwrap();
    let path = format!("/repos/{owner}/{repo}/issues/{number}");
    if let Some(resp) = s.record("PATCH", path, body.clone(), &headers) {
        return resp;
    }
    let Some(issue) = s.issues.iter_mut().find(|i| i.number == number) else {
        return gh_error(StatusCode::NOT_FOUND, "Not Found");
    };
    if let Some(title) = body["title"].as_str() {
        issue.title = title.to_string();
    }
    if let Some(b) = body.get("body") {
        issue.body = b.as_str().map(String::from);
    }
    if let Some(state) = body["state"].as_str() {
        issue.state = if state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        };
    }
    if let Some(labels) = labels_from(&body) {
        issue.labels = labels;
    }
    issue.updated_at += chrono::Duration::seconds(30);
    Json(json!(issue.clone())).into_response()
}

async fn fake_user(
    State(fake): State<Fake>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut s = fake.lock().unwrap();
    if let Some(resp) = s.record("GET", format!("/users/{name}"), Value::Null, &headers) {
        return resp;
    }
    if name == "ghost" {
        return gh_error(StatusCode::NOT_FOUND, "Not Found");
    }
    Json(json!({ "login": name, "params": params })).into_response()
}

async fn fake_zen(State(fake): State<Fake>, headers: HeaderMap) -> Response {
    let mut s = fake.lock().unwrap();
    if let Some(resp) = s.record("GET", "/zen".into(), Value::Null, &headers) {
        return resp;
    }
    (
        [(header::CONTENT_TYPE, "text/plain;charset=utf-8")],
        "Keep it logically awesome.",
    )
        .into_response()
}
