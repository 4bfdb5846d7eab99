//! In-process store. One mutex guards all state, so each call is atomic.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::lifecycle::student_code;
use crate::models::{Award, Lesson, ProgressSummary, Registration, Status, Student, Submission};

#[derive(Default)]
struct State {
    students: Vec<Student>,
    lessons: BTreeMap<i32, Lesson>,
    /// Insertion order doubles as the tie-break for equal timestamps.
    submissions: Vec<Submission>,
    awards: Vec<Award>,
    settings: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_student(
        &self,
        chat_id: i64,
        full_name: &str,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Registration> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.students.iter().find(|s| s.chat_id == chat_id) {
            return Ok(Registration::Existing(existing.clone()));
        }

        let year = joined_at.year();
        let registered_this_year = state
            .students
            .iter()
            .filter(|s| s.joined_at.year() == year)
            .count() as i64;

        let student = Student {
            id: Uuid::new_v4(),
            chat_id,
            full_name: full_name.to_string(),
            code: student_code(year, registered_this_year + 1),
            status: Status::Basic,
            joined_at,
            graduated: false,
        };
        state.students.push(student.clone());
        Ok(Registration::Created(student))
    }

    async fn student_by_chat_id(&self, chat_id: i64) -> StoreResult<Option<Student>> {
        let state = self.state.lock().await;
        Ok(state.students.iter().find(|s| s.chat_id == chat_id).cloned())
    }

    async fn student_by_code(&self, code: &str) -> StoreResult<Option<Student>> {
        let state = self.state.lock().await;
        Ok(state.students.iter().find(|s| s.code == code).cloned())
    }

    async fn set_status(&self, code: &str, status: Status) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .students
            .iter_mut()
            .find(|s| s.code == code && !s.graduated)
        {
            Some(student) => {
                student.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn resume_student(&self, code: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .students
            .iter_mut()
            .find(|s| s.code == code && s.status == Status::Paused)
        {
            Some(student) => {
                student.status = Status::Basic;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_graduated(&self, code: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .students
            .iter_mut()
            .find(|s| s.code == code && !s.graduated && s.status == Status::Advanced)
        {
            Some(student) => {
                student.graduated = true;
                student.status = Status::Graduated;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn active_students(&self, statuses: &[Status]) -> StoreResult<Vec<Student>> {
        let state = self.state.lock().await;
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|s| !s.graduated && statuses.contains(&s.status))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(students)
    }

    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize> {
        let mut state = self.state.lock().await;
        if !state.lessons.is_empty() {
            return Ok(0);
        }
        for lesson in lessons {
            state.lessons.insert(lesson.day, lesson.clone());
        }
        Ok(state.lessons.len())
    }

    async fn lesson(&self, day: i32) -> StoreResult<Option<Lesson>> {
        let state = self.state.lock().await;
        Ok(state.lessons.get(&day).cloned())
    }

    async fn insert_submission(&self, submission: &Submission) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.submissions.push(submission.clone());
        Ok(())
    }

    async fn grade_latest_submission(
        &self,
        code: &str,
        day: i32,
        grade: i32,
        feedback: &str,
    ) -> StoreResult<Option<Submission>> {
        let mut state = self.state.lock().await;
        // max_by_key keeps the last of equal keys, i.e. the latest insert.
        let latest = state
            .submissions
            .iter_mut()
            .filter(|s| s.student_code == code && s.lesson_day == day)
            .max_by_key(|s| s.submitted_at);

        Ok(latest.map(|submission| {
            submission.grade = Some(grade);
            submission.feedback = Some(feedback.to_string());
            submission.clone()
        }))
    }

    async fn submissions_for(&self, code: &str, day: i32) -> StoreResult<Vec<Submission>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Submission> = state
            .submissions
            .iter()
            .rev()
            .filter(|s| s.student_code == code && s.lesson_day == day)
            .cloned()
            .collect();
        // Stable sort over reversed insertion order keeps later inserts first on ties.
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn submitted_codes(&self, day: i32) -> StoreResult<HashSet<String>> {
        let state = self.state.lock().await;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.lesson_day == day)
            .map(|s| s.student_code.clone())
            .collect())
    }

    async fn submitted_days(&self, code: &str) -> StoreResult<BTreeSet<i32>> {
        let state = self.state.lock().await;
        Ok(state
            .submissions
            .iter()
            .filter(|s| s.student_code == code)
            .map(|s| s.lesson_day)
            .collect())
    }

    async fn progress(&self, code: &str) -> StoreResult<ProgressSummary> {
        let state = self.state.lock().await;
        let rows: Vec<&Submission> = state
            .submissions
            .iter()
            .filter(|s| s.student_code == code)
            .collect();
        let grades: Vec<i32> = rows.iter().filter_map(|s| s.grade).collect();
        Ok(ProgressSummary {
            submission_count: rows.len() as i64,
            average_grade: mean(&grades),
        })
    }

    async fn insert_award(&self, award: &Award) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.awards.push(award.clone());
        Ok(())
    }

    async fn awards_for(&self, code: &str) -> StoreResult<Vec<Award>> {
        let state = self.state.lock().await;
        Ok(state
            .awards
            .iter()
            .filter(|a| a.student_code == code)
            .cloned()
            .collect())
    }

    async fn setting(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock().await;
        Ok(state.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn ensure_setting(&self, key: &str, default: &str) -> StoreResult<String> {
        let mut state = self.state.lock().await;
        Ok(state
            .settings
            .entry(key.to_string())
            .or_insert_with(|| default.to_string())
            .clone())
    }
}

fn mean(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
    }

    fn submission(code: &str, day: i32, submitted_at: DateTime<Utc>) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            student_code: code.to_string(),
            lesson_day: day,
            attachment_ref: format!("file-{}", Uuid::new_v4()),
            submitted_at,
            grade: None,
            feedback: None,
        }
    }

    #[tokio::test]
    async fn sequence_restarts_each_year() {
        let store = MemoryStore::new();
        store.register_student(1, "Ada One", at(2025, 12, 30)).await.unwrap();
        store.register_student(2, "Ben Two", at(2025, 12, 31)).await.unwrap();
        let third = store.register_student(3, "Cy Three", at(2026, 1, 2)).await.unwrap();

        match third {
            Registration::Created(student) => assert_eq!(student.code, "PHX-2026-0001"),
            Registration::Existing(_) => panic!("expected a new student"),
        }
    }

    #[tokio::test]
    async fn graduation_updates_only_advanced_rows() {
        let store = MemoryStore::new();
        store.register_student(1, "Ada One", at(2026, 1, 5)).await.unwrap();
        let code = "PHX-2026-0001";

        assert!(!store.mark_graduated(code).await.unwrap());
        assert!(store.set_status(code, Status::Advanced).await.unwrap());
        assert!(store.mark_graduated(code).await.unwrap());
        assert!(!store.mark_graduated(code).await.unwrap());

        let stored = store.student_by_code(code).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Graduated);
    }

    #[tokio::test]
    async fn equal_timestamps_grade_the_later_insert() {
        let store = MemoryStore::new();
        let now = at(2026, 3, 1);
        let first = submission("PHX-2026-0001", 2, now);
        let second = submission("PHX-2026-0001", 2, now);
        store.insert_submission(&first).await.unwrap();
        store.insert_submission(&second).await.unwrap();

        let graded = store
            .grade_latest_submission("PHX-2026-0001", 2, 8, "good")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.id, second.id);

        let rows = store.submissions_for("PHX-2026-0001", 2).await.unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].grade, None);
    }

    #[tokio::test]
    async fn progress_averages_only_graded_rows() {
        let store = MemoryStore::new();
        let now = at(2026, 3, 1);
        for day in 1..=3 {
            store
                .insert_submission(&submission("PHX-2026-0001", day, now + Duration::hours(day as i64)))
                .await
                .unwrap();
        }
        store
            .grade_latest_submission("PHX-2026-0001", 1, 6, "")
            .await
            .unwrap();
        store
            .grade_latest_submission("PHX-2026-0001", 2, 9, "")
            .await
            .unwrap();

        let progress = store.progress("PHX-2026-0001").await.unwrap();
        assert_eq!(progress.submission_count, 3);
        assert_eq!(progress.average_grade, Some(7.5));
    }

    #[tokio::test]
    async fn ensure_setting_keeps_existing_value() {
        let store = MemoryStore::new();
        assert_eq!(store.ensure_setting("cohort_day", "1").await.unwrap(), "1");
        store.put_setting("cohort_day", "4").await.unwrap();
        assert_eq!(store.ensure_setting("cohort_day", "1").await.unwrap(), "4");
    }
}
