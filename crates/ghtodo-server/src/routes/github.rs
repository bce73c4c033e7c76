use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use ghtodo_service::github::USER_AGENT;
use ghtodo_service::{GitHubConfig, ServiceError};
use serde_json::json;
use tracing::warn;

use super::AppState;

/// Read-only passthrough to the GitHub API for clients that need data the
/// todo endpoints do not expose.
pub struct GitHubProxy {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubProxy {
    pub fn new(config: &GitHubConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Internal(format!("HTTP client init: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        url
    }

    /// Upstream body and its content type.
    async fn fetch(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<(String, Bytes), (StatusCode, String)> {
        let mut builder = self
            .client
            .get(self.target_url(path, query))
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("token {token}"));
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err((status, format!("upstream returned {status}")));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let body = resp
            .bytes()
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("read body: {e}")))?;
        Ok((content_type, body))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/github/{*path}", get(proxy))
}

async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    match state.proxy.fetch(&path, query.as_deref()).await {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err((status, msg)) => {
            warn!(%path, "GitHub proxy request failed: {msg}");
            (
                status,
                Json(json!({ "error": "Failed to fetch data from GitHub" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_keeps_path_and_query() {
        let proxy = GitHubProxy::new(
            &GitHubConfig::new("o", "r", None).with_api_url("http://127.0.0.1:1/"),
        )
        .unwrap();
        assert_eq!(
            proxy.target_url("users/octo", Some("per_page=5&page=2")),
            "http://127.0.0.1:1/users/octo?per_page=5&page=2"
        );
        assert_eq!(
            proxy.target_url("/rate_limit", Some("")),
            "http://127.0.0.1:1/rate_limit"
        );
    }
}
