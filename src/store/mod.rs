//! Persistence seam for students, lessons, submissions, awards and settings.
//!
//! Every method is one atomic unit against the backing store. References
//! between records are soft: lookups by code or day return `None` or an
//! empty collection instead of failing.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Award, Lesson, ProgressSummary, Registration, Status, Student, Submission};

pub mod memory;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a student with the next per-year code, unless `chat_id` is taken.
    ///
    /// Counting the year's registrations and inserting happen under one lock.
    async fn register_student(
        &self,
        chat_id: i64,
        full_name: &str,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Registration>;

    async fn student_by_chat_id(&self, chat_id: i64) -> StoreResult<Option<Student>>;

    async fn student_by_code(&self, code: &str) -> StoreResult<Option<Student>>;

    /// Set the status of a non-graduated student. Returns false when no row changed.
    async fn set_status(&self, code: &str, status: Status) -> StoreResult<bool>;

    /// `paused` -> `basic` as a single conditional update.
    async fn resume_student(&self, code: &str) -> StoreResult<bool>;

    /// Flag a non-graduated advanced student as graduated; false if no such row.
    async fn mark_graduated(&self, code: &str) -> StoreResult<bool>;

    /// Non-graduated students whose status is in `statuses`, oldest enrollment first.
    async fn active_students(&self, statuses: &[Status]) -> StoreResult<Vec<Student>>;

    /// Insert the catalog when the lesson table is empty. Returns rows inserted.
    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize>;

    async fn lesson(&self, day: i32) -> StoreResult<Option<Lesson>>;

    async fn insert_submission(&self, submission: &Submission) -> StoreResult<()>;

    /// Overwrite grade and feedback on the most recent submission for the pair.
    async fn grade_latest_submission(
        &self,
        code: &str,
        day: i32,
        grade: i32,
        feedback: &str,
    ) -> StoreResult<Option<Submission>>;

    /// All submissions for the pair, most recent first.
    async fn submissions_for(&self, code: &str, day: i32) -> StoreResult<Vec<Submission>>;

    async fn submitted_codes(&self, day: i32) -> StoreResult<HashSet<String>>;

    /// Distinct lesson days the student has submitted for.
    async fn submitted_days(&self, code: &str) -> StoreResult<BTreeSet<i32>>;

    async fn progress(&self, code: &str) -> StoreResult<ProgressSummary>;

    async fn insert_award(&self, award: &Award) -> StoreResult<()>;

    async fn awards_for(&self, code: &str) -> StoreResult<Vec<Award>>;

    async fn setting(&self, key: &str) -> StoreResult<Option<String>>;

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Write `default` only if `key` is absent, then return the stored value.
    async fn ensure_setting(&self, key: &str, default: &str) -> StoreResult<String>;
}
