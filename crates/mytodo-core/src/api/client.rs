//! HTTP client for the todo backend.
//!
//! Every call goes through [`ApiClient::send`], which attaches the JSON
//! content type, the optional bearer token and normalizes failures into
//! [`ApiError`]. The token is an argument of each call, never client state.
//! No retries and no timeouts: one attempt, surfaced as-is.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::error::{ApiError, ApiResult};
use super::types::{
    AuthResponse, BearerToken, CompleteTodoRequest, CreateTodoRequest, CredentialsRequest,
    MessageResponse, Todo, TodoFilter, UpdateTodoRequest, User,
};

/// Default backend location when neither config nor env override it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Standard User-Agent header for mytodo requests.
pub const USER_AGENT: &str = concat!("mytodo/", env!("CARGO_PKG_VERSION"));

const NO_BODY: Option<&()> = None;

/// Builds `/todos/<id>[/<suffix>]` with `id` percent-encoded as one segment.
///
/// # Errors
/// `Validation` for an empty, `.` or `..` id.
fn todo_path(id: &str, suffix: Option<&str>) -> ApiResult<String> {
    if matches!(id, "" | "." | "..") {
        return Err(ApiError::validation(format!("Invalid todo id: {id:?}")));
    }
    let mut url = Url::parse("http://localhost/todos")
        .map_err(|e| ApiError::parse(format!("Failed to build todo path: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::parse("Failed to build todo path"))?
        .push(id)
        .extend(suffix);
    Ok(url.path().to_string())
}

/// Todo REST API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues one request and decodes a 2xx JSON body into `T`.
    ///
    /// # Errors
    /// `Transport` when the request or body read fails, `Unauthorized` or
    /// `HttpStatus` for non-2xx responses, `Parse` when the body does not
    /// match `T`.
    pub async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&BearerToken>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.execute(method.clone(), path, token, body).await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::parse(format!("Failed to parse response from {method} {path}: {e}"))
        })
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&BearerToken>,
        body: Option<&B>,
    ) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(reqwest::header::USER_AGENT, USER_AGENT);

        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| {
                ApiError::parse(format!("Failed to encode request for {method} {path}: {e}"))
            })?;
            builder = builder.body(payload);
        }

        debug!(%method, path, authenticated = token.is_some(), "sending request");

        let response = builder.send().await.map_err(|e| ApiError::transport(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::transport(&e))?;

        debug!(%method, path, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &text));
        }

        Ok(text)
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn register(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = CredentialsRequest { email, password };
        self.send(Method::POST, "/auth/register", None, Some(&request))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = CredentialsRequest { email, password };
        self.send(Method::POST, "/auth/login", None, Some(&request))
            .await
    }

    /// Fetches the profile behind `token`; used to validate a restored session.
    pub async fn profile(&self, token: &BearerToken) -> ApiResult<User> {
        self.send(Method::GET, "/auth/profile", Some(token), NO_BODY)
            .await
    }

    // ------------------------------------------------------------------
    // Todos
    // ------------------------------------------------------------------

    pub async fn list_todos(&self, token: &BearerToken, filter: TodoFilter) -> ApiResult<Vec<Todo>> {
        self.send(Method::GET, filter.path(), Some(token), NO_BODY)
            .await
    }

    pub async fn get_todo(&self, token: &BearerToken, id: &str) -> ApiResult<Todo> {
        self.send(Method::GET, &todo_path(id, None)?, Some(token), NO_BODY)
            .await
    }

    pub async fn create_todo(
        &self,
        token: &BearerToken,
        request: &CreateTodoRequest,
    ) -> ApiResult<Todo> {
        self.send(Method::POST, "/todos", Some(token), Some(request))
            .await
    }

    pub async fn update_todo(
        &self,
        token: &BearerToken,
        id: &str,
        request: &UpdateTodoRequest,
    ) -> ApiResult<Todo> {
        self.send(Method::PUT, &todo_path(id, None)?, Some(token), Some(request))
            .await
    }

    pub async fn set_completed(
        &self,
        token: &BearerToken,
        id: &str,
        completed: bool,
    ) -> ApiResult<Todo> {
        let request = CompleteTodoRequest { completed };
        self.send(
            Method::PUT,
            &todo_path(id, Some("complete"))?,
            Some(token),
            Some(&request),
        )
        .await
    }

    /// Deletes a todo and returns the server's confirmation message.
    pub async fn delete_todo(&self, token: &BearerToken, id: &str) -> ApiResult<String> {
        let response: MessageResponse = self
            .send(Method::DELETE, &todo_path(id, None)?, Some(token), NO_BODY)
            .await?;
        Ok(response.message)
    }
}
