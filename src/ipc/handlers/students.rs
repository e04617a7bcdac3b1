use super::{params_map, require_db, require_role};
use crate::ipc::error::{engine_err, err, ok, ok_as};
use crate::ipc::types::{AppState, Request, Role};
use crate::records;
use crate::repo::{MarkSource, RecordStore, SqliteRepo};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    match SqliteRepo::new(conn).students() {
        Ok(students) => ok_as(&req.id, "students", &students),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match records::required_id(&params_map(req), "studentId") {
        Ok(id) => id,
        Err(e) => return engine_err(&req.id, &e),
    };
    match SqliteRepo::new(conn).student(&student_id) {
        Ok(Some(s)) => ok_as(&req.id, "student", &s),
        Ok(None) => err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::can_manage_records) {
        return resp;
    }
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match records::create_student(&SqliteRepo::new(conn), &params_map(req)) {
        Ok(student) => ok_as(&req.id, "student", &student),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::can_manage_records) {
        return resp;
    }
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match records::required_id(&params_map(req), "studentId") {
        Ok(id) => id,
        Err(e) => return engine_err(&req.id, &e),
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    match records::update_student(&SqliteRepo::new(conn), &student_id, patch) {
        Ok(student) => ok_as(&req.id, "student", &student),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        _ => None,
    }
}
