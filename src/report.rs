use crate::error::{EngineError, EngineResult};
use crate::grading::{self, Grade};
use crate::model::{Course, Student};
use crate::repo::MarkSource;
use crate::stats::{self, ClassStatistics, Scored};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub mark_id: String,
    pub course_id: String,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub credits: Option<i64>,
    pub exam_date: Option<String>,
    pub raw_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub pass: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub student_id: String,
    pub student_name: String,
    pub entries: Vec<TranscriptEntry>,
    pub overall_percentage: f64,
    pub overall_grade: Grade,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentScore {
    pub student_id: String,
    pub student_name: Option<String>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResults {
    pub course_id: String,
    pub course_code: String,
    pub course_name: String,
    pub statistics: ClassStatistics,
    pub student_count: usize,
    pub top_performer: StudentScore,
}

/// One mark with its derived result, joined with display names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub mark_id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub course_id: String,
    pub course_code: Option<String>,
    pub exam_date: Option<String>,
    pub raw_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub pass: bool,
}

impl Scored for TranscriptEntry {
    fn score(&self) -> f64 {
        self.percentage
    }
}

impl Scored for StudentScore {
    fn score(&self) -> f64 {
        self.percentage
    }
}

impl Scored for ResultRow {
    fn score(&self) -> f64 {
        self.percentage
    }
}

/// Per-request lookup cache so a listing touches each student/course once.
struct Names<'a> {
    repo: &'a dyn MarkSource,
    students: HashMap<String, Option<Student>>,
    courses: HashMap<String, Option<Course>>,
}

impl<'a> Names<'a> {
    fn new(repo: &'a dyn MarkSource) -> Self {
        Self {
            repo,
            students: HashMap::new(),
            courses: HashMap::new(),
        }
    }

    fn student(&mut self, id: &str) -> EngineResult<Option<&Student>> {
        if !self.students.contains_key(id) {
            let s = self.repo.student(id)?;
            self.students.insert(id.to_string(), s);
        }
        Ok(self.students.get(id).and_then(|s| s.as_ref()))
    }

    fn course(&mut self, id: &str) -> EngineResult<Option<&Course>> {
        if !self.courses.contains_key(id) {
            let c = self.repo.course(id)?;
            self.courses.insert(id.to_string(), c);
        }
        Ok(self.courses.get(id).and_then(|c| c.as_ref()))
    }
}

pub fn build_transcript(
    repo: &dyn MarkSource,
    student_id: &str,
    pass_threshold: f64,
) -> EngineResult<Transcript> {
    let Some(student) = repo.student(student_id)? else {
        return Err(EngineError::NotFound {
            entity: "student",
            id: student_id.to_string(),
        });
    };

    let marks = repo.marks_by_student(student_id)?;
    let mut names = Names::new(repo);
    let mut entries = Vec::with_capacity(marks.len());
    for m in marks {
        let result = grading::compute_result(m.marks, m.max_marks, pass_threshold)?;
        let course = names.course(&m.course_id)?;
        entries.push(TranscriptEntry {
            mark_id: m.id,
            course_code: course.map(|c| c.code.clone()),
            course_name: course.map(|c| c.name.clone()),
            credits: course.map(|c| c.credits),
            course_id: m.course_id,
            exam_date: m.exam_date,
            raw_score: m.marks,
            max_score: m.max_marks,
            percentage: result.percentage,
            grade: result.grade,
            pass: result.pass,
        });
    }

    let percentages: Vec<f64> = entries.iter().map(|e| e.percentage).collect();
    let overall_percentage = stats::average(&percentages)
        .map_err(|_| EngineError::EmptyInput("no marks on record"))?;

    Ok(Transcript {
        student_id: student.id,
        student_name: student.name,
        entries,
        overall_percentage,
        overall_grade: grading::grade_of(overall_percentage),
    })
}

pub fn build_course_results(
    repo: &dyn MarkSource,
    course_id: &str,
    pass_threshold: f64,
) -> EngineResult<CourseResults> {
    let Some(course) = repo.course(course_id)? else {
        return Err(EngineError::NotFound {
            entity: "course",
            id: course_id.to_string(),
        });
    };

    let marks = repo.marks_by_course(course_id)?;
    if marks.is_empty() {
        return Err(EngineError::EmptyInput("no marks recorded for this course"));
    }

    let mut percentages = Vec::with_capacity(marks.len());
    // (student id, sum, count) in first-seen order
    let mut per_student: Vec<(String, f64, usize)> = Vec::new();
    for m in &marks {
        let p = grading::percentage_of(m.marks, m.max_marks)?;
        percentages.push(p);
        match per_student.iter_mut().find(|(id, _, _)| *id == m.student_id) {
            Some(entry) => {
                entry.1 += p;
                entry.2 += 1;
            }
            None => per_student.push((m.student_id.clone(), p, 1)),
        }
    }

    let statistics = stats::class_statistics(&percentages, pass_threshold)?;

    let student_scores: Vec<StudentScore> = per_student
        .into_iter()
        .map(|(student_id, sum, count)| StudentScore {
            student_id,
            student_name: None,
            percentage: grading::round_2_decimals(sum / count as f64),
        })
        .collect();
    let student_count = student_scores.len();
    let mut top = stats::top_performer(&student_scores)?.clone();
    top.student_name = repo.student(&top.student_id)?.map(|s| s.name);

    Ok(CourseResults {
        course_id: course.id,
        course_code: course.code,
        course_name: course.name,
        statistics,
        student_count,
        top_performer: top,
    })
}

pub fn all_results(repo: &dyn MarkSource, pass_threshold: f64) -> EngineResult<Vec<ResultRow>> {
    let marks = repo.all_marks()?;
    let mut names = Names::new(repo);
    let mut rows = Vec::with_capacity(marks.len());
    for m in marks {
        let result = grading::compute_result(m.marks, m.max_marks, pass_threshold)?;
        let student_name = names.student(&m.student_id)?.map(|s| s.name.clone());
        let course_code = names.course(&m.course_id)?.map(|c| c.code.clone());
        rows.push(ResultRow {
            mark_id: m.id,
            student_id: m.student_id,
            student_name,
            course_id: m.course_id,
            course_code,
            exam_date: m.exam_date,
            raw_score: m.marks,
            max_score: m.max_marks,
            percentage: result.percentage,
            grade: result.grade,
            pass: result.pass,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;

    /// Vec-backed source; the engine only sees the trait.
    #[derive(Default)]
    struct MemSource {
        students: Vec<Student>,
        courses: Vec<Course>,
        marks: Vec<Mark>,
    }

    impl MemSource {
        fn with_student(mut self, id: &str, name: &str) -> Self {
            self.students.push(Student {
                id: id.into(),
                name: name.into(),
                email: format!("{}@example.com", id),
                phone: None,
                enrollment_date: None,
            });
            self
        }

        fn with_course(mut self, id: &str, code: &str) -> Self {
            self.courses.push(Course {
                id: id.into(),
                name: format!("{} course", code),
                code: code.into(),
                credits: 3,
            });
            self
        }

        fn with_mark(mut self, student: &str, course: &str, marks: f64, max: f64) -> Self {
            let n = self.marks.len();
            self.marks.push(Mark {
                id: format!("m{}", n),
                student_id: student.into(),
                course_id: course.into(),
                marks,
                max_marks: max,
                exam_date: None,
            });
            self
        }
    }

    impl MarkSource for MemSource {
        fn marks_by_student(&self, student_id: &str) -> EngineResult<Vec<Mark>> {
            Ok(self.marks.iter().filter(|m| m.student_id == student_id).cloned().collect())
        }
        fn marks_by_course(&self, course_id: &str) -> EngineResult<Vec<Mark>> {
            Ok(self.marks.iter().filter(|m| m.course_id == course_id).cloned().collect())
        }
        fn all_marks(&self) -> EngineResult<Vec<Mark>> {
            Ok(self.marks.clone())
        }
        fn student(&self, id: &str) -> EngineResult<Option<Student>> {
            Ok(self.students.iter().find(|s| s.id == id).cloned())
        }
        fn course(&self, id: &str) -> EngineResult<Option<Course>> {
            Ok(self.courses.iter().find(|c| c.id == id).cloned())
        }
    }

    #[test]
    fn transcript_grades_each_entry_and_averages() {
        let src = MemSource::default()
            .with_student("s1", "Alice")
            .with_course("c1", "MATH101")
            .with_course("c2", "ENG101")
            .with_mark("s1", "c1", 85.0, 100.0)
            .with_mark("s1", "c2", 45.0, 50.0)
            .with_mark("s1", "c1", 39.0, 50.0);
        let t = build_transcript(&src, "s1", 60.0).expect("transcript");
        assert_eq!(t.student_name, "Alice");
        assert_eq!(t.entries.len(), 3);
        assert_eq!(t.entries[0].grade, Grade::B);
        assert_eq!(t.entries[1].percentage, 90.0);
        assert_eq!(t.entries[1].grade, Grade::A);
        assert_eq!(t.entries[1].course_code.as_deref(), Some("ENG101"));
        assert_eq!(t.entries[2].percentage, 78.0);
        // (85 + 90 + 78) / 3 = 84.333..
        assert_eq!(t.overall_percentage, 84.33);
        assert_eq!(t.overall_grade, Grade::B);
    }

    #[test]
    fn transcript_without_marks_is_empty_input() {
        let src = MemSource::default().with_student("s1", "Alice");
        let e = build_transcript(&src, "s1", 60.0).unwrap_err();
        assert_eq!(e, EngineError::EmptyInput("no marks on record"));
    }

    #[test]
    fn transcript_for_unknown_student() {
        let src = MemSource::default();
        let e = build_transcript(&src, "nobody", 60.0).unwrap_err();
        assert!(matches!(e, EngineError::NotFound { entity: "student", .. }));
    }

    #[test]
    fn course_results_statistics() {
        let mut src = MemSource::default().with_course("c1", "MATH101");
        let scores = [45.0, 67.0, 78.0, 82.0, 88.0, 90.0, 91.0, 75.0, 73.0, 80.0];
        for (i, v) in scores.iter().enumerate() {
            let sid = format!("s{}", i);
            src = src.with_student(&sid, &format!("Student {}", i)).with_mark(&sid, "c1", *v, 100.0);
        }
        let r = build_course_results(&src, "c1", 60.0).expect("results");
        assert_eq!(r.student_count, 10);
        assert_eq!(r.statistics.average, 76.9);
        assert_eq!(r.statistics.median, 79.5);
        assert_eq!(r.statistics.highest, 91.0);
        assert_eq!(r.statistics.lowest, 45.0);
        assert_eq!(r.statistics.pass_count, 9);
        assert_eq!(r.statistics.fail_count, 1);
        assert_eq!(r.top_performer.student_id, "s6");
        assert_eq!(r.top_performer.student_name.as_deref(), Some("Student 6"));
    }

    #[test]
    fn course_results_count_distinct_students_and_tie_keeps_first() {
        let src = MemSource::default()
            .with_course("c1", "MATH101")
            .with_student("s1", "Alice")
            .with_student("s2", "Bob")
            .with_mark("s2", "c1", 90.0, 100.0)
            .with_mark("s1", "c1", 45.0, 50.0)
            .with_mark("s2", "c1", 18.0, 20.0);
        let r = build_course_results(&src, "c1", 60.0).expect("results");
        assert_eq!(r.student_count, 2);
        // both average 90; Bob was seen first
        assert_eq!(r.top_performer.student_id, "s2");
    }

    #[test]
    fn course_results_empty_and_unknown() {
        let src = MemSource::default().with_course("c1", "MATH101");
        assert!(matches!(
            build_course_results(&src, "c1", 60.0),
            Err(EngineError::EmptyInput(_))
        ));
        assert!(matches!(
            build_course_results(&src, "c9", 60.0),
            Err(EngineError::NotFound { entity: "course", .. })
        ));
    }

    #[test]
    fn all_results_keep_repository_order() {
        let src = MemSource::default()
            .with_student("s1", "Alice")
            .with_course("c1", "MATH101")
            .with_mark("s1", "c1", 50.0, 100.0)
            .with_mark("s1", "c1", 70.0, 100.0);
        let rows = all_results(&src, 60.0).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mark_id, "m0");
        assert!(!rows[0].pass);
        assert!(rows[1].pass);
        assert_eq!(rows[1].student_name.as_deref(), Some("Alice"));
    }
}
