use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use ghtodo_core::stats::{DateRange, TodoStats};
use ghtodo_service::{ServiceError, TodoStore};
use serde::Deserialize;

use super::{to_error, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(stats))
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl StatsQuery {
    fn range(&self) -> Result<Option<DateRange>, ServiceError> {
        match (self.start, self.end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
            _ => Err(ServiceError::InvalidInput(
                "start and end must be given together".into(),
            )),
        }
    }
}

async fn stats(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Result<Json<TodoStats>, ApiError> {
    let range = q.range().map_err(to_error)?;
    let todos = state.adapter.list_todos().await.map_err(to_error)?;
    Ok(Json(TodoStats::compute_in_range(&todos, range.as_ref())))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::test_helpers::{seeded_test_router, test_router};

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn empty_store_has_zero_rate() {
        let (status, body) = get(test_router(), "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["completionRate"], 0);
    }

    #[tokio::test]
    async fn seeded_store_is_half_done() {
        let (_, body) = get(seeded_test_router(), "/api/stats").await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["completed"], 1);
        assert_eq!(body["active"], 1);
        assert_eq!(body["completionRate"], 50);
    }

    #[tokio::test]
    async fn range_outside_creation_time_counts_nothing() {
        let (status, body) = get(
            seeded_test_router(),
            "/api/stats?start=2000-01-01T00:00:00Z&end=2000-01-31T23:59:59Z",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn half_open_range_is_rejected() {
        let (status, _) = get(test_router(), "/api/stats?start=2000-01-01T00:00:00Z").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
