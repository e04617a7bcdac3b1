use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "results.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            enrollment_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            credits INTEGER NOT NULL CHECK(credits > 0),
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // The CHECKs mirror the write-path validation; rows violating them are never stored.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS marks(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            marks REAL NOT NULL CHECK(marks >= 0),
            max_marks REAL NOT NULL CHECK(max_marks > 0),
            exam_date TEXT,
            created_at TEXT NOT NULL,
            CHECK(marks <= max_marks),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_student ON marks(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_marks_course ON marks(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, text),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_roundtrip_and_overwrite() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("schema");
        assert_eq!(settings_get_json(&conn, "grading").expect("get"), None);
        settings_set_json(&conn, "grading", &json!({ "passThreshold": 50 })).expect("set");
        settings_set_json(&conn, "grading", &json!({ "passThreshold": 55 })).expect("set");
        assert_eq!(
            settings_get_json(&conn, "grading").expect("get"),
            Some(json!({ "passThreshold": 55 }))
        );
    }

    #[test]
    fn schema_rejects_marks_over_maximum() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("schema");
        conn.execute(
            "INSERT INTO students(id, name, email, created_at) VALUES('s1', 'A', 'a@b.c', 'now')",
            [],
        )
        .expect("student");
        conn.execute(
            "INSERT INTO courses(id, name, code, credits, created_at) VALUES('c1', 'Math', 'M1', 3, 'now')",
            [],
        )
        .expect("course");
        let res = conn.execute(
            "INSERT INTO marks(id, student_id, course_id, marks, max_marks, created_at)
             VALUES('m1', 's1', 'c1', 150, 100, 'now')",
            [],
        );
        assert!(res.is_err());
    }
}
