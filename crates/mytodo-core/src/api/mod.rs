//! Backend REST API access.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL, USER_AGENT};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use types::{
    AuthResponse, BearerToken, CreateTodoRequest, Todo, TodoFilter, UpdateTodoRequest, User,
};
