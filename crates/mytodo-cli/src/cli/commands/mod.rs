//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod todos;

use anyhow::{Context, Result};
use mytodo_core::api::ApiClient;
use mytodo_core::config::Config;
use mytodo_core::session::{AuthContext, FileTokenStore, SessionController, SessionState};
use tracing::debug;

pub type Session = SessionController<FileTokenStore>;

/// Builds a session bound to the credentials file under `MYTODO_HOME`.
///
/// The session is not started; call [`validated_session`] for commands that
/// need a logged-in user.
pub fn open_session(config: &Config, api_url: Option<&str>) -> Result<Session> {
    let base_url = config
        .effective_base_url(api_url)
        .context("resolve API base URL")?;
    debug!(%base_url, "using API base URL");
    Ok(SessionController::new(
        ApiClient::new(&base_url),
        FileTokenStore::in_home(),
    ))
}

/// Opens the session and validates the saved token against the server.
pub async fn validated_session(config: &Config, api_url: Option<&str>) -> Result<Session> {
    let mut session = open_session(config, api_url)?;
    session.start().await;
    Ok(session)
}

/// Token and user of the session, or an error telling the user to log in.
pub fn require_login(session: &Session) -> Result<AuthContext<'_>> {
    if session.state() == SessionState::Authenticated {
        return Ok(session.require_authenticated()?);
    }
    match session.last_validation_error() {
        Some(cause) => anyhow::bail!(
            "Not logged in: saved session was rejected ({}: {cause})",
            cause.kind
        ),
        None => anyhow::bail!("Not logged in. Run `mytodo login` first."),
    }
}
