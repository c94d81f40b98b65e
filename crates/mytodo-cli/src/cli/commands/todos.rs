//! Todo command handlers.

use anyhow::Result;
use mytodo_core::api::{Todo, TodoFilter, UpdateTodoRequest};
use mytodo_core::config::Config;
use mytodo_core::todos::{TodoCollection, validate_description, validate_title};

use super::{require_login, validated_session};

pub async fn list(
    config: &Config,
    api_url: Option<&str>,
    completed: bool,
    active: bool,
) -> Result<()> {
    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let filter = if completed {
        TodoFilter::Completed
    } else {
        TodoFilter::All
    };
    let mut todos = TodoCollection::new();
    todos.load(session.api(), auth.token, filter).await?;

    let shown: Vec<&Todo> = if active {
        todos.filtered(false).collect()
    } else {
        todos.items().iter().collect()
    };

    if shown.is_empty() {
        println!("No todos found.");
        return Ok(());
    }
    for todo in &shown {
        println!("{}", format_todo(todo));
    }
    if !completed && !active {
        println!(
            "\n{} open, {} completed",
            todos.active_count(),
            todos.completed_count()
        );
    }
    Ok(())
}

pub async fn show(config: &Config, api_url: Option<&str>, id: &str) -> Result<()> {
    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let mut todos = TodoCollection::new();
    let todo = todos.refresh(session.api(), auth.token, id).await?;
    println!("{}", format_details(&todo));
    Ok(())
}

pub async fn add(
    config: &Config,
    api_url: Option<&str>,
    title: &str,
    description: &str,
) -> Result<()> {
    // reject before touching the network
    validate_title(title)?;
    validate_description(description)?;

    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let mut todos = TodoCollection::new();
    let todo = todos
        .create(session.api(), auth.token, title, description)
        .await?;
    println!("Created {}", format_todo(&todo));
    Ok(())
}

pub async fn edit(
    config: &Config,
    api_url: Option<&str>,
    id: &str,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let fields = UpdateTodoRequest { title, description };
    if fields.is_empty() {
        anyhow::bail!("Nothing to update: pass --title and/or --description");
    }
    if let Some(title) = fields.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(description) = fields.description.as_deref() {
        validate_description(description)?;
    }

    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let mut todos = TodoCollection::new();
    let todo = todos.update(session.api(), auth.token, id, fields).await?;
    println!("Updated {}", format_todo(&todo));
    Ok(())
}

pub async fn set_completed(
    config: &Config,
    api_url: Option<&str>,
    id: &str,
    completed: bool,
) -> Result<()> {
    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let mut todos = TodoCollection::new();
    let todo = todos
        .set_completed(session.api(), auth.token, id, completed)
        .await?;
    println!("{}", format_todo(&todo));
    Ok(())
}

pub async fn remove(config: &Config, api_url: Option<&str>, id: &str) -> Result<()> {
    let session = validated_session(config, api_url).await?;
    let auth = require_login(&session)?;

    let mut todos = TodoCollection::new();
    let message = todos.remove(session.api(), auth.token, id).await?;
    println!("{message}");
    Ok(())
}

/// One-line listing: `[x] <id>  <title>`.
fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    format!("[{mark}] {}  {}", todo.id, todo.title)
}

fn format_details(todo: &Todo) -> String {
    let mut out = format!("{}\n\nid:       {}\n", todo.title, todo.id);
    let status = if todo.completed { "completed" } else { "open" };
    out.push_str(&format!("status:   {status}\n"));
    out.push_str(&format!(
        "created:  {}\n",
        todo.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(done) = todo.completed_at {
        out.push_str(&format!("done:     {}\n", done.format("%Y-%m-%d %H:%M UTC")));
    }
    if !todo.description.is_empty() {
        out.push('\n');
        out.push_str(&todo.description);
        out.push('\n');
    }
    out.trim_end().to_string()
}
