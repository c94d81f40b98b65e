//! Core mytodo library (API client, session lifecycle, todo collection, config).

pub mod api;
pub mod config;
pub mod session;
pub mod todos;
