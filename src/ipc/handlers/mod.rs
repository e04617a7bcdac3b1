pub mod core;
pub mod courses;
pub mod marks;
pub mod results;
pub mod settings;
pub mod students;

use crate::config::GradingSettings;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request, Role};
use rusqlite::Connection;
use serde_json::{Map, Value};

pub(crate) fn params_map(req: &Request) -> Map<String, Value> {
    req.params.as_object().cloned().unwrap_or_default()
}

pub(crate) fn require_db<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub(crate) fn require_role(
    state: &AppState,
    req: &Request,
    allowed: fn(Role) -> bool,
) -> Result<(), Value> {
    if allowed(state.role) {
        return Ok(());
    }
    Err(err(
        &req.id,
        "forbidden",
        format!("role {} may not call {}", state.role.as_str(), req.method),
        Some(serde_json::json!({ "role": state.role.as_str() })),
    ))
}

pub(crate) fn load_grading(conn: &Connection, req: &Request) -> Result<GradingSettings, Value> {
    GradingSettings::load(conn).map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))
}
