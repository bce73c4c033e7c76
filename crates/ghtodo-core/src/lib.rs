pub mod api;
pub mod error;
pub mod stats;
pub mod todo;

pub use error::CoreError;
pub use stats::{DateRange, SearchFields, StatusFilter, TodoQuery, TodoStats};
pub use todo::{CreateTodo, Todo, UpdateTodo};
