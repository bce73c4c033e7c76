pub mod config;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use ghtodo_service::{
    FallbackStore, InMemoryTodoStore, RemoteTodoStore, RetryPolicy, TodoAdapter, TodoStore,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use config::ServerConfig;

pub use routes::{build_router, AppState, GitHubProxy, InnerAppState};

/// Wire the stores together: GitHub first, in-memory list when GitHub
/// fails. Without a token the in-memory list is used directly.
pub fn build_adapter(config: &ServerConfig) -> Result<TodoAdapter> {
    let fallback: Arc<dyn TodoStore> = Arc::new(if config.seed {
        InMemoryTodoStore::seeded()
    } else {
        InMemoryTodoStore::new()
    });

    let github = config.github.to_config();
    let store: Arc<dyn TodoStore> = if github.token.is_some() {
        let remote = Arc::new(RemoteTodoStore::new(github)?);
        Arc::new(FallbackStore::new(remote, fallback))
    } else {
        warn!("GitHub token not found, serving todos from memory only");
        fallback
    };
    Ok(TodoAdapter::new(store, RetryPolicy::default()))
}

pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let github = config.github.to_config();
    info!(
        owner = %github.owner,
        repo = %github.repo,
        token = if github.token.is_some() { "loaded" } else { "not found" },
        "GitHub repository"
    );
    let proxy = GitHubProxy::new(&github)?;
    let adapter = build_adapter(config)?;
    Ok(Arc::new(InnerAppState { adapter, proxy }))
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
