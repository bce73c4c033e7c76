mod adapter;
mod fallback;
pub mod github;
mod http;
mod memory;
mod retry;
mod traits;

pub use adapter::TodoAdapter;
pub use fallback::FallbackStore;
pub use github::{GitHubConfig, RemoteTodoStore};
pub use http::{HealthStatus, HttpService};
pub use memory::InMemoryTodoStore;
pub use retry::RetryPolicy;
pub use traits::{ServiceError, TodoStore};
