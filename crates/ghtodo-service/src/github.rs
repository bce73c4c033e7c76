//! Todos stored as GitHub issues carrying the `todo` label.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghtodo_core::todo::{CreateTodo, Todo, UpdateTodo, DELETED_LABEL, TODO_LABEL};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ServiceError, TodoStore};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub rejects API requests without a User-Agent.
pub const USER_AGENT: &str = concat!("ghtodo/", env!("CARGO_PKG_VERSION"));

/// Largest page the issues endpoint serves.
const PER_PAGE: usize = 100;

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    /// Personal access token. Without one every call is reported as
    /// unavailable.
    pub token: Option<String>,
    /// Per-request timeout. `None` keeps the client default.
    pub timeout: Option<Duration>,
}

impl GitHubConfig {
    pub fn new(owner: &str, repo: &str, token: Option<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token,
            timeout: None,
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/{}/issues", self.api_url, self.owner, self.repo)
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/{number}", self.issues_url())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == IssueState::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
}

/// The subset of a GitHub issue this crate reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the "issue" is really a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn into_todo(self) -> Todo {
        Todo {
            id: self.id,
            remote_ref: Some(self.number),
            completed: self.state.is_closed(),
            title: self.title,
            description: self.body.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    labels: &'a [&'a str],
}

#[derive(Debug, Default, Serialize)]
struct IssuePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a [&'a str]>,
}

/// GitHub Issues backed implementation of `TodoStore`.
///
/// Todos are addressed by issue `id`, but GitHub addresses issues by
/// `number`, so every listing refreshes an id → number cache that
/// update and delete resolve through.
pub struct RemoteTodoStore {
    config: GitHubConfig,
    client: Client,
    refs: Mutex<HashMap<u64, u64>>,
}

impl RemoteTodoStore {
    pub fn new(config: GitHubConfig) -> Result<Self, ServiceError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Internal(format!("HTTP client init: {e}")))?;
        Ok(Self {
            config,
            client,
            refs: Mutex::new(HashMap::new()),
        })
    }

    fn with_auth(&self, builder: RequestBuilder) -> Result<RequestBuilder, ServiceError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or_else(|| ServiceError::Unavailable("no GitHub token configured".into()))?;
        Ok(builder
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json"))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let resp = self
            .with_auth(builder)?
            .send()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("request failed: {e}")))?;
        handle_response(resp).await
    }

    async fn patch_issue(&self, number: u64, patch: &IssuePatch<'_>) -> Result<Issue, ServiceError> {
        let builder = self.client.patch(self.config.issue_url(number)).json(patch);
        self.send(builder).await
    }

    fn remember(&self, issue: &Issue) {
        if let Ok(mut refs) = self.refs.lock() {
            refs.insert(issue.id, issue.number);
        }
    }

    fn cached_ref(&self, id: u64) -> Option<u64> {
        self.refs.lock().ok().and_then(|refs| refs.get(&id).copied())
    }

    /// Issue number for a todo id, listing the repository on a cache miss.
    async fn resolve(&self, id: u64) -> Result<u64, ServiceError> {
        if let Some(number) = self.cached_ref(id) {
            return Ok(number);
        }
        debug!(id, "issue number not cached, refreshing listing");
        self.list_todos().await?;
        self.cached_ref(id)
            .ok_or_else(|| ServiceError::NotFound(format!("todo {id}")))
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Unavailable(format!("json decode: {e}")));
    }
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or(body);
    if status == StatusCode::NOT_FOUND {
        Err(ServiceError::NotFound(msg))
    } else {
        Err(ServiceError::Unavailable(format!("GitHub returned {status}: {msg}")))
    }
}

#[async_trait]
impl TodoStore for RemoteTodoStore {
    fn name(&self) -> &str {
        "github"
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, ServiceError> {
        let mut issues: Vec<Issue> = Vec::new();
        for page in 1u32.. {
            let builder = self
                .client
                .get(self.config.issues_url())
                .query(&[("state", "all"), ("labels", TODO_LABEL)])
                .query(&[("per_page", PER_PAGE as u32), ("page", page)]);
            let batch: Vec<Issue> = self.send(builder).await?;
            let last = batch.len() < PER_PAGE;
            issues.extend(batch);
            if last {
                break;
            }
        }

        let mut todos: Vec<Todo> = issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .inspect(|issue| self.remember(issue))
            .map(Issue::into_todo)
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ServiceError> {
        let input = input.normalized()?;
        let body = NewIssue {
            title: &input.title,
            body: (!input.description.is_empty()).then_some(input.description.as_str()),
            labels: &[TODO_LABEL],
        };
        let builder = self.client.post(self.config.issues_url()).json(&body);
        let issue: Issue = self.send(builder).await?;
        self.remember(&issue);

        let mut todo = issue.into_todo();
        todo.completed = false;
        Ok(todo)
    }

    async fn update_todo(&self, id: u64, update: &UpdateTodo) -> Result<Todo, ServiceError> {
        let update = update.normalized()?;
        let number = self.resolve(id).await?;
        let patch = IssuePatch {
            title: update.title.as_deref(),
            body: update.description.as_deref(),
            state: update.completed.map(IssueState::from_completed),
            labels: None,
        };
        let issue = self.patch_issue(number, &patch).await?;
        self.remember(&issue);
        Ok(issue.into_todo())
    }

    /// Issues cannot be deleted through the API; the issue is closed and
    /// labelled `deleted` instead.
    async fn delete_todo(&self, id: u64) -> Result<(), ServiceError> {
        let number = self.resolve(id).await?;
        let patch = IssuePatch {
            state: Some(IssueState::Closed),
            labels: Some(&[TODO_LABEL, DELETED_LABEL][..]),
            ..Default::default()
        };
        self.patch_issue(number, &patch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_json(state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 9001,
            "number": 17,
            "title": "Buy milk",
            "body": null,
            "state": state,
            "labels": [{ "name": "todo" }],
            "created_at": "2025-03-01T10:00:00Z",
            "updated_at": "2025-03-02T10:00:00Z",
            "user": { "login": "someone" }
        })
    }

    #[test]
    fn closed_issue_maps_to_completed_todo() {
        let issue: Issue = serde_json::from_value(issue_json("closed")).unwrap();
        let todo = issue.into_todo();
        assert_eq!(todo.id, 9001);
        assert_eq!(todo.remote_ref, Some(17));
        assert!(todo.completed);
        assert_eq!(todo.description, "");
    }

    #[test]
    fn open_issue_maps_to_active_todo() {
        let issue: Issue = serde_json::from_value(issue_json("open")).unwrap();
        assert!(!issue.into_todo().completed);
    }

    #[test]
    fn state_mapping_is_its_own_inverse() {
        for completed in [true, false] {
            assert_eq!(IssueState::from_completed(completed).is_closed(), completed);
        }
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = IssuePatch {
            state: Some(IssueState::Closed),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert_eq!(v, serde_json::json!({ "state": "closed" }));
    }

    #[test]
    fn new_issue_without_description_has_no_body() {
        let v = serde_json::to_value(NewIssue {
            title: "t",
            body: None,
            labels: &[TODO_LABEL],
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({ "title": "t", "labels": ["todo"] }));
    }

    #[test]
    fn config_builds_repository_urls() {
        let config = GitHubConfig::new("octo", "todos", None).with_api_url("http://127.0.0.1:9/");
        assert_eq!(config.issues_url(), "http://127.0.0.1:9/repos/octo/todos/issues");
        assert_eq!(config.issue_url(4), "http://127.0.0.1:9/repos/octo/todos/issues/4");
    }

    #[tokio::test]
    async fn missing_token_is_unavailable() {
        let store = RemoteTodoStore::new(GitHubConfig::new("octo", "todos", None)).unwrap();
        assert!(matches!(
            store.list_todos().await,
            Err(ServiceError::Unavailable(_))
        ));
        assert!(matches!(
            store.create_todo(&CreateTodo::new("x")).await,
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_any_request() {
        let store = RemoteTodoStore::new(GitHubConfig::new("octo", "todos", None)).unwrap();
        assert!(matches!(
            store.create_todo(&CreateTodo::new("  ")).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
