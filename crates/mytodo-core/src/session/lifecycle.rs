//! Session lifecycle: restore, validate, login, register, logout.
//!
//! ```text
//! Uninitialized --start()--> Validating --profile ok--> Authenticated
//!       |                        `--profile err--> Anonymous (token cleared)
//!       `--start(), no token----------------------> Anonymous
//! ```
//! `login`/`register` move any state to `Authenticated`; `logout` moves any
//! state to `Anonymous`.

use tracing::{debug, info, warn};

use super::store::{SessionStore, TokenStore};
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult, AuthResponse, BearerToken, User};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Validating,
    Authenticated,
    Anonymous,
}

/// Token and user of an authenticated session, handed to todo operations.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
    pub token: &'a BearerToken,
    pub user: &'a User,
}

pub struct SessionController<S> {
    api: ApiClient,
    store: SessionStore<S>,
    state: SessionState,
    last_validation_error: Option<ApiError>,
}

impl<S: TokenStore> SessionController<S> {
    pub fn new(api: ApiClient, backend: S) -> Self {
        Self {
            api,
            store: SessionStore::new(backend),
            state: SessionState::Uninitialized,
            last_validation_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn user(&self) -> Option<&User> {
        self.store.user()
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.store.token()
    }

    /// Why the last startup validation rejected the persisted token.
    ///
    /// Lets callers tell an expired token (`Unauthorized`) from an
    /// unreachable server (`Transport`).
    pub fn last_validation_error(&self) -> Option<&ApiError> {
        self.last_validation_error.as_ref()
    }

    /// Restores and validates the persisted session. Runs once; later calls
    /// return the current state.
    ///
    /// Any validation failure clears the token from memory and storage.
    pub async fn start(&mut self) -> SessionState {
        if self.state != SessionState::Uninitialized {
            return self.state;
        }

        let persisted = match self.store.load_persisted() {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to read persisted token: {err:#}");
                self.last_validation_error = Some(ApiError::storage(&err));
                self.discard_token();
                self.transition(SessionState::Anonymous);
                return self.state;
            }
        };

        let Some(token) = persisted else {
            self.transition(SessionState::Anonymous);
            return self.state;
        };

        self.store.restore_token(token.clone());
        self.transition(SessionState::Validating);

        match self.api.profile(&token).await {
            Ok(user) => {
                self.store.set_user(user);
                self.transition(SessionState::Authenticated);
            }
            Err(err) => {
                warn!(kind = %err.kind, "Session validation failed: {err}");
                self.discard_token();
                self.last_validation_error = Some(err);
                self.transition(SessionState::Anonymous);
            }
        }

        self.state
    }

    /// Authenticates with email and password.
    ///
    /// # Errors
    /// `Validation` for blank fields, otherwise whatever the backend returned.
    /// The session is unchanged on failure.
    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<User> {
        let email = validate_credentials(email, password)?;
        let response = self.api.login(email, password).await?;
        self.establish(response)
    }

    /// Creates an account and logs into it.
    ///
    /// # Errors
    /// `Validation` for blank fields or a short password, otherwise whatever
    /// the backend returned. The session is unchanged on failure.
    pub async fn register(&mut self, email: &str, password: &str) -> ApiResult<User> {
        let email = validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let response = self.api.register(email, password).await?;
        self.establish(response)
    }

    /// Ends the session locally. No server call is made.
    ///
    /// # Errors
    /// `Storage` if the persisted token could not be removed; the in-memory
    /// session is cleared regardless.
    pub fn logout(&mut self) -> ApiResult<()> {
        let result = self
            .store
            .clear_token()
            .map_err(|e| ApiError::storage(&e));
        self.last_validation_error = None;
        self.transition(SessionState::Anonymous);
        result
    }

    /// Gate for operations that need a validated session.
    ///
    /// # Errors
    /// `Unauthorized` unless the state is `Authenticated`.
    pub fn require_authenticated(&self) -> ApiResult<AuthContext<'_>> {
        match self.state {
            SessionState::Authenticated => match (self.store.token(), self.store.user()) {
                (Some(token), Some(user)) => Ok(AuthContext { token, user }),
                _ => Err(ApiError::unauthorized("Not logged in")),
            },
            SessionState::Uninitialized | SessionState::Validating => Err(ApiError::new(
                ApiErrorKind::Unauthorized,
                "Session is still being validated",
            )),
            SessionState::Anonymous => Err(ApiError::unauthorized("Not logged in")),
        }
    }

    fn establish(&mut self, response: AuthResponse) -> ApiResult<User> {
        let token = BearerToken::new(response.token)
            .ok_or_else(|| ApiError::parse("Server returned an empty token"))?;
        self.store
            .set_token(token)
            .map_err(|e| ApiError::storage(&e))?;
        self.store.set_user(response.user.clone());
        self.last_validation_error = None;
        self.transition(SessionState::Authenticated);
        Ok(response.user)
    }

    fn discard_token(&mut self) {
        if let Err(err) = self.store.clear_token() {
            warn!("Failed to clear persisted token: {err:#}");
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "session state changed");
        } else {
            debug!(state = ?next, "session state unchanged");
        }
        self.state = next;
    }
}

/// Required-field checks; returns the trimmed email.
fn validate_credentials<'a>(email: &'a str, password: &str) -> ApiResult<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    Ok(email)
}
