//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use tempfile::TempDir;

pub const CREATED_AT: &str = "2025-07-01T10:00:00Z";

/// Creates a temp MYTODO_HOME directory for test isolation.
pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp mytodo home")
}

/// Temp home with a saved token, as left behind by a previous login.
pub fn logged_in_home(token: &str) -> TempDir {
    let home = temp_home();
    std::fs::write(
        home.path().join("credentials.json"),
        json!({ "token": token }).to_string(),
    )
    .expect("write credentials");
    home
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn user_json(email: &str) -> Value {
    json!({
        "id": "u1",
        "email": email,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT,
    })
}

pub fn todo_json(id: &str, title: &str, completed: bool) -> Value {
    let mut todo = json!({
        "id": id,
        "user_id": "u1",
        "title": title,
        "description": "",
        "completed": completed,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT,
    });
    if completed {
        todo["completed_at"] = json!("2025-07-02T08:30:00Z");
    }
    todo
}
