use super::{load_grading, params_map, require_db};
use crate::ipc::error::{engine_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::records;
use crate::repo::SqliteRepo;
use crate::{report, threshold, validate};
use serde_json::json;

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    match report::all_results(&SqliteRepo::new(conn), grading.pass_threshold) {
        Ok(rows) => ok(
            &req.id,
            json!({ "passThreshold": grading.pass_threshold, "results": rows }),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_results_threshold(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let cutoff = match req.params.get("percentage") {
        None | Some(serde_json::Value::Null) => grading.default_threshold,
        Some(raw) => match validate::validate_percentage_threshold(raw) {
            Ok(v) => v,
            Err(e) => return engine_err(&req.id, &e),
        },
    };

    let filtered = report::all_results(&SqliteRepo::new(conn), grading.pass_threshold)
        .and_then(|rows| threshold::filter_by_threshold(&rows, cutoff));
    match filtered {
        Ok(rows) => ok(&req.id, json!({ "threshold": cutoff, "results": rows })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_results_transcript(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let transcript = records::required_id(&params_map(req), "studentId").and_then(|id| {
        report::build_transcript(&SqliteRepo::new(conn), &id, grading.pass_threshold)
    });
    match transcript {
        Ok(t) => ok(&req.id, json!({ "transcript": t })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_results_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let grading = match load_grading(conn, req) {
        Ok(g) => g,
        Err(resp) => return resp,
    };
    let results = records::required_id(&params_map(req), "courseId").and_then(|id| {
        report::build_course_results(&SqliteRepo::new(conn), &id, grading.pass_threshold)
    });
    match results {
        Ok(r) => ok(&req.id, json!({ "courseResults": r })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.list" => Some(handle_results_list(state, req)),
        "results.threshold" => Some(handle_results_threshold(state, req)),
        "results.transcript" => Some(handle_results_transcript(state, req)),
        "results.course" => Some(handle_results_course(state, req)),
        _ => None,
    }
}
