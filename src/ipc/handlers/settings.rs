use super::{load_grading, require_db, require_role};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Role};
use serde_json::json;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "grading": grading }))
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::can_manage_records) {
        return resp;
    }
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    if let Err(msg) = grading.merge_patch(patch) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = grading.save(conn) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "grading": grading }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
