use super::{params_map, require_db, require_role};
use crate::ipc::error::{engine_err, ok, ok_as};
use crate::ipc::types::{AppState, Request, Role};
use crate::records;
use crate::repo::{MarkSource, SqliteRepo};
use serde_json::json;

fn handle_marks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "marks": [] }));
    };
    match SqliteRepo::new(conn).all_marks() {
        Ok(marks) => ok_as(&req.id, "marks", &marks),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_marks_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let result = records::required_id(&params_map(req), "studentId")
        .and_then(|id| SqliteRepo::new(conn).marks_by_student(&id));
    match result {
        Ok(marks) => ok_as(&req.id, "marks", &marks),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_marks_by_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let result = records::required_id(&params_map(req), "courseId")
        .and_then(|id| SqliteRepo::new(conn).marks_by_course(&id));
    match result {
        Ok(marks) => ok_as(&req.id, "marks", &marks),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_marks_record(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(state, req, Role::can_record_marks) {
        return resp;
    }
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match records::record_mark(&SqliteRepo::new(conn), &params_map(req)) {
        Ok(mark) => ok_as(&req.id, "mark", &mark),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.list" => Some(handle_marks_list(state, req)),
        "marks.byStudent" => Some(handle_marks_by_student(state, req)),
        "marks.byCourse" => Some(handle_marks_by_course(state, req)),
        "marks.record" => Some(handle_marks_record(state, req)),
        _ => None,
    }
}
