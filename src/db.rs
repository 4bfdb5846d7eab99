use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::lifecycle::student_code;
use crate::models::{
    Award, Lesson, ProgressSummary, Registration, Status, Student, Submission,
};
use crate::store::{Store, StoreResult};

const STUDENT_COLUMNS: &str = "id, chat_id, full_name, code, status, joined_at, graduated";

const SUBMISSION_COLUMNS: &str =
    "id, student_code, lesson_day, attachment_ref, submitted_at, grade, feedback";

/// Advisory lock namespace for per-year code allocation; the year is added to it.
const REGISTRATION_LOCK_BASE: i64 = 0x5048_5800_0000;

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_err(err: crate::models::UnknownVariant) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

fn student_from_row(row: &PgRow) -> StoreResult<Student> {
    let status: String = row.get("status");
    Ok(Student {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        full_name: row.get("full_name"),
        code: row.get("code"),
        status: status.parse().map_err(decode_err)?,
        joined_at: row.get("joined_at"),
        graduated: row.get("graduated"),
    })
}

fn lesson_from_row(row: &PgRow) -> StoreResult<Lesson> {
    let tier: String = row.get("tier");
    Ok(Lesson {
        day: row.get("day_num"),
        tier: tier.parse().map_err(decode_err)?,
        title: row.get("title"),
        content: row.get("content"),
        assignment: row.get("assignment"),
        deadline_hour: row.get("deadline_hour"),
    })
}

fn submission_from_row(row: &PgRow) -> Submission {
    Submission {
        id: row.get("id"),
        student_code: row.get("student_code"),
        lesson_day: row.get("lesson_day"),
        attachment_ref: row.get("attachment_ref"),
        submitted_at: row.get("submitted_at"),
        grade: row.get("grade"),
        feedback: row.get("feedback"),
    }
}

fn award_from_row(row: &PgRow) -> StoreResult<Award> {
    let kind: String = row.get("kind");
    Ok(Award {
        id: row.get("id"),
        student_code: row.get("student_code"),
        lesson_day: row.get("lesson_day"),
        kind: kind.parse().map_err(decode_err)?,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl Store for PgStore {
    async fn register_student(
        &self,
        chat_id: i64,
        full_name: &str,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<Registration> {
        let year = joined_at.year();
        let mut tx = self.pool.begin().await?;

        // Serializes count + insert for the year until the transaction ends.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK_BASE + i64::from(year))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM photex.students WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            let student = student_from_row(&row)?;
            tx.rollback().await?;
            return Ok(Registration::Existing(student));
        }

        let registered_this_year: i64 = sqlx::query(
            "SELECT COUNT(*) AS c FROM photex.students \
             WHERE EXTRACT(YEAR FROM joined_at AT TIME ZONE 'UTC')::INT = $1",
        )
        .bind(year)
        .fetch_one(&mut *tx)
        .await?
        .get("c");

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO photex.students (id, chat_id, full_name, code, status, joined_at, graduated)
            VALUES ($1, $2, $3, $4, 'basic', $5, FALSE)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(full_name)
        .bind(student_code(year, registered_this_year + 1))
        .bind(joined_at)
        .fetch_one(&mut *tx)
        .await?;

        let student = student_from_row(&row)?;
        tx.commit().await?;
        Ok(Registration::Created(student))
    }

    async fn student_by_chat_id(&self, chat_id: i64) -> StoreResult<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM photex.students WHERE chat_id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn student_by_code(&self, code: &str) -> StoreResult<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM photex.students WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn set_status(&self, code: &str, status: Status) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE photex.students SET status = $1 WHERE code = $2 AND graduated = FALSE",
        )
        .bind(status.as_str())
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn resume_student(&self, code: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE photex.students SET status = 'basic' WHERE code = $1 AND status = 'paused'",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_graduated(&self, code: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE photex.students SET graduated = TRUE, status = 'graduated' \
             WHERE code = $1 AND graduated = FALSE AND status = 'advanced'",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_students(&self, statuses: &[Status]) -> StoreResult<Vec<Student>> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM photex.students \
             WHERE graduated = FALSE AND status = ANY($1) \
             ORDER BY joined_at"
        ))
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(student_from_row).collect()
    }

    async fn seed_lessons(&self, lessons: &[Lesson]) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await?;
        let existing: i64 = sqlx::query("SELECT COUNT(*) AS c FROM photex.lessons")
            .fetch_one(&mut *tx)
            .await?
            .get("c");
        if existing > 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        for lesson in lessons {
            sqlx::query(
                r#"
                INSERT INTO photex.lessons (day_num, tier, title, content, assignment, deadline_hour)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(lesson.day)
            .bind(lesson.tier.as_str())
            .bind(&lesson.title)
            .bind(&lesson.content)
            .bind(&lesson.assignment)
            .bind(lesson.deadline_hour)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(lessons.len())
    }

    async fn lesson(&self, day: i32) -> StoreResult<Option<Lesson>> {
        let row = sqlx::query(
            "SELECT day_num, tier, title, content, assignment, deadline_hour \
             FROM photex.lessons WHERE day_num = $1",
        )
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(lesson_from_row).transpose()
    }

    async fn insert_submission(&self, submission: &Submission) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO photex.submissions
            (id, student_code, lesson_day, attachment_ref, submitted_at, grade, feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(submission.id)
        .bind(&submission.student_code)
        .bind(submission.lesson_day)
        .bind(&submission.attachment_ref)
        .bind(submission.submitted_at)
        .bind(submission.grade)
        .bind(&submission.feedback)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn grade_latest_submission(
        &self,
        code: &str,
        day: i32,
        grade: i32,
        feedback: &str,
    ) -> StoreResult<Option<Submission>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE photex.submissions SET grade = $3, feedback = $4
            WHERE id = (
                SELECT id FROM photex.submissions
                WHERE student_code = $1 AND lesson_day = $2
                ORDER BY submitted_at DESC, seq DESC
                LIMIT 1
                FOR UPDATE
            )
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(day)
        .bind(grade)
        .bind(feedback)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(submission_from_row))
    }

    async fn submissions_for(&self, code: &str, day: i32) -> StoreResult<Vec<Submission>> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM photex.submissions \
             WHERE student_code = $1 AND lesson_day = $2 \
             ORDER BY submitted_at DESC, seq DESC"
        ))
        .bind(code)
        .bind(day)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(submission_from_row).collect())
    }

    async fn submitted_codes(&self, day: i32) -> StoreResult<HashSet<String>> {
        let rows =
            sqlx::query("SELECT DISTINCT student_code FROM photex.submissions WHERE lesson_day = $1")
                .bind(day)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(|row| row.get("student_code")).collect())
    }

    async fn submitted_days(&self, code: &str) -> StoreResult<BTreeSet<i32>> {
        let rows =
            sqlx::query("SELECT DISTINCT lesson_day FROM photex.submissions WHERE student_code = $1")
                .bind(code)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(|row| row.get("lesson_day")).collect())
    }

    async fn progress(&self, code: &str) -> StoreResult<ProgressSummary> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, AVG(grade)::FLOAT8 AS average \
             FROM photex.submissions WHERE student_code = $1",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(ProgressSummary {
            submission_count: row.get("total"),
            average_grade: row.get("average"),
        })
    }

    async fn insert_award(&self, award: &Award) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO photex.awards (id, student_code, lesson_day, kind, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(award.id)
        .bind(&award.student_code)
        .bind(award.lesson_day)
        .bind(award.kind.as_str())
        .bind(award.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn awards_for(&self, code: &str) -> StoreResult<Vec<Award>> {
        let rows = sqlx::query(
            "SELECT id, student_code, lesson_day, kind, created_at \
             FROM photex.awards WHERE student_code = $1 ORDER BY created_at",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(award_from_row).collect()
    }

    async fn setting(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM photex.settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    async fn put_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO photex.settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ensure_setting(&self, key: &str, default: &str) -> StoreResult<String> {
        sqlx::query(
            "INSERT INTO photex.settings (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(default)
        .execute(&self.pool)
        .await?;

        let value: String = sqlx::query("SELECT value FROM photex.settings WHERE key = $1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?
            .get("value");
        Ok(value)
    }
}
