use super::{params_map, require_db, require_role};
use crate::ipc::error::{engine_err, ok, ok_as};
use crate::ipc::types::{AppState, Request, Role};
use crate::records;
use crate::repo::{RecordStore, SqliteRepo};
use serde_json::json;

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "courses": [] }));
    };
    match SqliteRepo::new(conn).courses() {
        Ok(courses) => ok_as(&req.id, "courses", &courses),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_courses_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::can_manage_records) {
        return resp;
    }
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match records::create_course(&SqliteRepo::new(conn), &params_map(req)) {
        Ok(course) => ok_as(&req.id, "course", &course),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.create" => Some(handle_courses_create(state, req)),
        _ => None,
    }
}
