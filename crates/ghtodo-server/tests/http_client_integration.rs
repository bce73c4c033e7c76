//! Integration tests for HttpService against a real server.
//!
//! Each test spawns an in-process axum server on 127.0.0.1:0 backed by the
//! in-memory store, then exercises the HTTP client through the full
//! request/response cycle.

use chrono::{Duration, Utc};
use ghtodo_core::stats::{DateRange, StatusFilter};
use ghtodo_core::todo::{CreateTodo, UpdateTodo};
use ghtodo_service::{HttpService, ServiceError, TodoStore};

async fn spawn_server() -> String {
    let server = ghtodo_server::test_helpers::spawn_test_server().await;
    server.base_url
}

#[tokio::test]
async fn health_check_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);
    let health = svc.health_check().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.store, "memory");
}

#[tokio::test]
async fn todo_lifecycle_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);

    // Create
    let todo = svc
        .create_todo(&CreateTodo::new("Buy milk").with_description("2 liters"))
        .await
        .unwrap();
    assert_eq!(todo.title, "Buy milk");
    assert_eq!(todo.description, "2 liters");
    assert!(!todo.completed);

    // Complete
    let done = svc
        .update_todo(todo.id, &UpdateTodo::completed(true))
        .await
        .unwrap();
    assert!(done.completed);
    assert_eq!(done.title, "Buy milk");

    // Edit text
    let edited = svc
        .update_todo(todo.id, &UpdateTodo::from_text("Buy oat milk"))
        .await
        .unwrap();
    assert_eq!(edited.title, "Buy oat milk");
    assert_eq!(edited.description, "");
    assert!(edited.completed);

    let stats = svc.stats(None).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.completion_rate, 100);

    // Delete
    svc.delete_todo(todo.id).await.unwrap();
    assert!(svc.list_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filtered_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);

    let milk = svc.create_todo(&CreateTodo::new("Buy milk")).await.unwrap();
    svc.create_todo(&CreateTodo::new("Call mom").with_description("about the milk order"))
        .await
        .unwrap();
    svc.create_todo(&CreateTodo::new("Write report")).await.unwrap();
    svc.update_todo(milk.id, &UpdateTodo::completed(true))
        .await
        .unwrap();

    let completed = svc.list_filtered(StatusFilter::Completed, None).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, milk.id);

    let active = svc.list_filtered(StatusFilter::Active, None).await.unwrap();
    assert_eq!(active.len(), 2);

    let milk_hits = svc
        .list_filtered(StatusFilter::All, Some("MILK"))
        .await
        .unwrap();
    assert_eq!(milk_hits.len(), 2);

    let active_milk = svc
        .list_filtered(StatusFilter::Active, Some("milk"))
        .await
        .unwrap();
    assert_eq!(active_milk.len(), 1);
    assert_eq!(active_milk[0].title, "Call mom");
}

#[tokio::test]
async fn stats_range_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);
    svc.create_todo(&CreateTodo::new("a")).await.unwrap();
    svc.create_todo(&CreateTodo::new("b")).await.unwrap();

    let now = Utc::now();
    let around_now = DateRange::new(now - Duration::hours(1), now + Duration::hours(1)).unwrap();
    let stats = svc.stats(Some(&around_now)).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.completion_rate, 0);

    let last_year = DateRange::new(now - Duration::days(400), now - Duration::days(300)).unwrap();
    let stats = svc.stats(Some(&last_year)).await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn missing_todo_is_not_found_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);

    let err = svc.delete_todo(9999).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");

    let err = svc
        .update_todo(9999, &UpdateTodo::completed(true))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_text_is_invalid_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);

    let err = svc.create_todo(&CreateTodo::new("   ")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)), "got {err:?}");
    assert!(svc.list_todos().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let svc = HttpService::new("http://127.0.0.1:9");
    let err = svc.list_todos().await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn partial_text_update_keeps_other_half_via_http() {
    let url = spawn_server().await;
    let svc = HttpService::new(&url);

    let todo = svc
        .create_todo(&CreateTodo::new("Buy milk").with_description("2 litres"))
        .await
        .unwrap();

    let renamed = svc
        .update_todo(
            todo.id,
            &UpdateTodo {
                title: Some("Buy oat milk".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Buy oat milk");
    assert_eq!(renamed.description, "2 litres");

    let described = svc
        .update_todo(
            todo.id,
            &UpdateTodo {
                description: Some("1 litre".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(described.title, "Buy oat milk");
    assert_eq!(described.description, "1 litre");
}
