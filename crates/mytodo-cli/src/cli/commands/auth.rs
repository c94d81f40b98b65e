//! Login, register, logout and whoami handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use mytodo_core::config::Config;

use super::{open_session, require_login, validated_session};

pub async fn login(
    config: &Config,
    api_url: Option<&str>,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let mut session = open_session(config, api_url)?;
    let user = session.login(email, &password).await?;
    println!("Logged in as {}", user.email);
    Ok(())
}

pub async fn register(
    config: &Config,
    api_url: Option<&str>,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let mut session = open_session(config, api_url)?;
    let user = session.register(email, &password).await?;
    println!("Registered and logged in as {}", user.email);
    Ok(())
}

pub fn logout(config: &Config, api_url: Option<&str>) -> Result<()> {
    let mut session = open_session(config, api_url)?;
    session.logout()?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(config: &Config, api_url: Option<&str>) -> Result<()> {
    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;
    println!("{} ({})", auth.user.email, auth.user.id);
    Ok(())
}

/// Uses the flag/env value, otherwise reads one line from stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
