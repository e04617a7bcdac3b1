use crate::error::EngineResult;
use crate::model::{Course, Mark, Student};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashSet;

/// Reads the results engine needs. Ordering of returned marks carries no
/// meaning; implementations should still be deterministic.
pub trait MarkSource {
    fn marks_by_student(&self, student_id: &str) -> EngineResult<Vec<Mark>>;
    fn marks_by_course(&self, course_id: &str) -> EngineResult<Vec<Mark>>;
    fn all_marks(&self) -> EngineResult<Vec<Mark>>;
    fn student(&self, id: &str) -> EngineResult<Option<Student>>;
    fn course(&self, id: &str) -> EngineResult<Option<Course>>;
}

/// Write side used by the record writer. Single writer assumed.
pub trait RecordStore: MarkSource {
    fn students(&self) -> EngineResult<Vec<Student>>;
    fn courses(&self) -> EngineResult<Vec<Course>>;
    fn course_codes(&self) -> EngineResult<HashSet<String>>;
    fn mark_exists(
        &self,
        student_id: &str,
        course_id: &str,
        exam_date: Option<&str>,
    ) -> EngineResult<bool>;
    fn insert_student(&self, student: &Student) -> EngineResult<()>;
    fn update_student(&self, student: &Student) -> EngineResult<()>;
    fn insert_course(&self, course: &Course) -> EngineResult<()>;
    fn insert_mark(&self, mark: &Mark) -> EngineResult<()>;
}

pub struct SqliteRepo<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_marks(&self, filter: &str, arg: Option<&str>) -> EngineResult<Vec<Mark>> {
        let sql = format!(
            "SELECT id, student_id, course_id, marks, max_marks, exam_date
             FROM marks
             {}
             ORDER BY rowid",
            filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let marks = match arg {
            Some(a) => stmt
                .query_map([a], mark_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], mark_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(marks)
    }
}

fn mark_from_row(r: &Row<'_>) -> rusqlite::Result<Mark> {
    Ok(Mark {
        id: r.get(0)?,
        student_id: r.get(1)?,
        course_id: r.get(2)?,
        marks: r.get(3)?,
        max_marks: r.get(4)?,
        exam_date: r.get(5)?,
    })
}

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        email: r.get(2)?,
        phone: r.get(3)?,
        enrollment_date: r.get(4)?,
    })
}

fn course_from_row(r: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: r.get(0)?,
        name: r.get(1)?,
        code: r.get(2)?,
        credits: r.get(3)?,
    })
}

impl MarkSource for SqliteRepo<'_> {
    fn marks_by_student(&self, student_id: &str) -> EngineResult<Vec<Mark>> {
        self.query_marks("WHERE student_id = ?", Some(student_id))
    }

    fn marks_by_course(&self, course_id: &str) -> EngineResult<Vec<Mark>> {
        self.query_marks("WHERE course_id = ?", Some(course_id))
    }

    fn all_marks(&self) -> EngineResult<Vec<Mark>> {
        self.query_marks("", None)
    }

    fn student(&self, id: &str) -> EngineResult<Option<Student>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email, phone, enrollment_date FROM students WHERE id = ?",
                [id],
                student_from_row,
            )
            .optional()?)
    }

    fn course(&self, id: &str) -> EngineResult<Option<Course>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, code, credits FROM courses WHERE id = ?",
                [id],
                course_from_row,
            )
            .optional()?)
    }
}

impl RecordStore for SqliteRepo<'_> {
    fn students(&self) -> EngineResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, phone, enrollment_date FROM students ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn courses(&self) -> EngineResult<Vec<Course>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, code, credits FROM courses ORDER BY rowid")?;
        let rows = stmt
            .query_map([], course_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn course_codes(&self) -> EngineResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT code FROM courses")?;
        let codes = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(codes)
    }

    fn mark_exists(
        &self,
        student_id: &str,
        course_id: &str,
        exam_date: Option<&str>,
    ) -> EngineResult<bool> {
        // `IS` so that two undated marks count as the same exam.
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM marks
                 WHERE student_id = ? AND course_id = ? AND exam_date IS ?
                 LIMIT 1",
                (student_id, course_id, exam_date),
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_student(&self, student: &Student) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO students(id, name, email, phone, enrollment_date, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &student.id,
                &student.name,
                &student.email,
                &student.phone,
                &student.enrollment_date,
                Utc::now().to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    fn update_student(&self, student: &Student) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE students
             SET name = ?, email = ?, phone = ?, enrollment_date = ?, updated_at = ?
             WHERE id = ?",
            (
                &student.name,
                &student.email,
                &student.phone,
                &student.enrollment_date,
                Utc::now().to_rfc3339(),
                &student.id,
            ),
        )?;
        Ok(())
    }

    fn insert_course(&self, course: &Course) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO courses(id, name, code, credits, created_at) VALUES(?, ?, ?, ?, ?)",
            (
                &course.id,
                &course.name,
                &course.code,
                course.credits,
                Utc::now().to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    fn insert_mark(&self, mark: &Mark) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO marks(id, student_id, course_id, marks, max_marks, exam_date, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &mark.id,
                &mark.student_id,
                &mark.course_id,
                mark.marks,
                mark.max_marks,
                &mark.exam_date,
                Utc::now().to_rfc3339(),
            ),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn mem_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        db::init_schema(&conn).expect("schema");
        conn
    }

    fn seed(repo: &SqliteRepo<'_>) {
        repo.insert_student(&Student {
            id: "s1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
            enrollment_date: None,
        })
        .expect("student");
        repo.insert_course(&Course {
            id: "c1".into(),
            name: "Mathematics".into(),
            code: "MATH101".into(),
            credits: 3,
        })
        .expect("course");
    }

    #[test]
    fn marks_come_back_in_insertion_order() {
        let conn = mem_conn();
        let repo = SqliteRepo::new(&conn);
        seed(&repo);
        for (i, v) in [70.0, 80.0, 90.0].iter().enumerate() {
            repo.insert_mark(&Mark {
                id: format!("m{}", i),
                student_id: "s1".into(),
                course_id: "c1".into(),
                marks: *v,
                max_marks: 100.0,
                exam_date: Some(format!("2024-0{}-01", i + 1)),
            })
            .expect("mark");
        }
        let ids: Vec<String> = repo
            .marks_by_student("s1")
            .expect("marks")
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
        assert_eq!(repo.marks_by_course("c1").expect("marks").len(), 3);
        assert_eq!(repo.all_marks().expect("marks").len(), 3);
        assert!(repo.marks_by_course("nope").expect("marks").is_empty());
    }

    #[test]
    fn undated_marks_collide() {
        let conn = mem_conn();
        let repo = SqliteRepo::new(&conn);
        seed(&repo);
        assert!(!repo.mark_exists("s1", "c1", None).expect("exists"));
        repo.insert_mark(&Mark {
            id: "m1".into(),
            student_id: "s1".into(),
            course_id: "c1".into(),
            marks: 50.0,
            max_marks: 100.0,
            exam_date: None,
        })
        .expect("mark");
        assert!(repo.mark_exists("s1", "c1", None).expect("exists"));
        assert!(!repo.mark_exists("s1", "c1", Some("2024-01-01")).expect("exists"));
    }

    #[test]
    fn lookups_and_codes() {
        let conn = mem_conn();
        let repo = SqliteRepo::new(&conn);
        seed(&repo);
        assert_eq!(repo.student("s1").expect("q").map(|s| s.name), Some("Alice".into()));
        assert_eq!(repo.course("missing").expect("q"), None);
        assert!(repo.course_codes().expect("codes").contains("MATH101"));
    }
}
