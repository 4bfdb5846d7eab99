//! Submissions, grading, pending lists, progress and awards.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::curriculum::{self, TOTAL_DAYS};
use crate::error::{AppError, AppResult};
use crate::models::{Award, AwardKind, Lesson, ProgressSummary, Status, Student, Submission, Tier};
use crate::notify::{self, Notifier};
use crate::store::Store;

async fn require_lesson(store: &dyn Store, day: i32) -> AppResult<Lesson> {
    store
        .lesson(day)
        .await?
        .ok_or(AppError::LessonNotFound(day))
}

/// Whether a student in `status` may submit for a lesson of `tier`.
pub fn may_submit(status: Status, tier: Tier) -> bool {
    match tier {
        Tier::Basic => true,
        Tier::Advanced => status == Status::Advanced,
    }
}

/// Record a submission from the student behind `chat_id`.
///
/// The cohort day is not consulted; any catalog day may be submitted. Repeat
/// submissions are kept side by side.
pub async fn submit(
    store: &dyn Store,
    notifier: &dyn Notifier,
    chat_id: i64,
    day: i32,
    attachment: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<Submission> {
    let student = store
        .student_by_chat_id(chat_id)
        .await?
        .ok_or(AppError::NotRegistered)?;

    let attachment = attachment
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(AppError::MissingAttachment)?;

    let lesson = require_lesson(store, day).await?;
    if !may_submit(student.status, lesson.tier) {
        return Err(AppError::TierLocked { day });
    }

    let submission = Submission {
        id: Uuid::new_v4(),
        student_code: student.code.clone(),
        lesson_day: day,
        attachment_ref: attachment.to_string(),
        submitted_at: now,
        grade: None,
        feedback: None,
    };
    store.insert_submission(&submission).await?;
    tracing::info!(code = %student.code, day, "submission received");

    notify::group_best_effort(
        notifier,
        &format!(
            "📩 Submission: {} ({}) for Lesson {day}.",
            student.full_name, student.code
        ),
        None,
    )
    .await;

    Ok(submission)
}

/// Grade the most recent submission for `(code, day)`, replacing any earlier grade.
pub async fn grade(
    store: &dyn Store,
    notifier: &dyn Notifier,
    code: &str,
    day: i32,
    score: i32,
    feedback: &str,
) -> AppResult<Submission> {
    let graded = store
        .grade_latest_submission(code, day, score, feedback)
        .await?
        .ok_or_else(|| AppError::SubmissionNotFound {
            code: code.to_string(),
            day,
        })?;
    tracing::info!(code, day, score, "submission graded");

    match store.student_by_code(code).await? {
        Some(student) => {
            notify::user_best_effort(
                notifier,
                student.chat_id,
                &format!("🏆 Lesson {day} feedback:\nScore: {score}\n{feedback}"),
                None,
            )
            .await;
        }
        None => tracing::warn!(code, "graded submission has no matching student"),
    }

    Ok(graded)
}

/// Students who owe a submission for `day` and have not sent one yet.
pub async fn pending_for(store: &dyn Store, day: i32) -> AppResult<Vec<Student>> {
    let lesson = require_lesson(store, day).await?;
    let submitted = store.submitted_codes(day).await?;
    let eligible = store.active_students(lesson.tier.eligible_statuses()).await?;

    Ok(eligible
        .into_iter()
        .filter(|student| !submitted.contains(&student.code))
        .collect())
}

pub async fn progress_summary(store: &dyn Store, code: &str) -> AppResult<ProgressSummary> {
    Ok(store.progress(code).await?)
}

/// Progress for the student behind `chat_id`.
pub async fn own_progress(store: &dyn Store, chat_id: i64) -> AppResult<(Student, ProgressSummary)> {
    let student = store
        .student_by_chat_id(chat_id)
        .await?
        .ok_or(AppError::NotRegistered)?;
    let summary = progress_summary(store, &student.code).await?;
    Ok((student, summary))
}

/// Append an award. Bonuses are not tied to a lesson and always use day 0.
pub async fn award(
    store: &dyn Store,
    notifier: &dyn Notifier,
    code: &str,
    kind: AwardKind,
    day: i32,
    now: DateTime<Utc>,
) -> AppResult<Award> {
    let lesson_day = match kind {
        AwardKind::Bonus => 0,
        AwardKind::Star | AwardKind::Winner => {
            if !curriculum::is_valid_day(day) {
                return Err(AppError::OutOfRange {
                    day,
                    max: TOTAL_DAYS,
                });
            }
            day
        }
    };

    let student = store
        .student_by_code(code)
        .await?
        .ok_or_else(|| AppError::StudentNotFound(code.to_string()))?;

    let award = Award {
        id: Uuid::new_v4(),
        student_code: student.code.clone(),
        lesson_day,
        kind,
        created_at: now,
    };
    store.insert_award(&award).await?;
    tracing::info!(code, kind = kind.as_str(), day = lesson_day, "award recorded");

    match kind {
        AwardKind::Star => {
            notify::group_best_effort(
                notifier,
                &format!(
                    "🏅 Congratulations! {code} is *Student of the Day* for Lesson {lesson_day}. \
                     Keep inspiring the class! 🚀"
                ),
                None,
            )
            .await;
        }
        AwardKind::Winner => {
            notify::group_best_effort(
                notifier,
                &format!("🏆 {code} won the Lesson {lesson_day} challenge! Outstanding work!"),
                None,
            )
            .await;
        }
        AwardKind::Bonus => {
            notify::user_best_effort(
                notifier,
                student.chat_id,
                "🎁 Surprise Bonus: You’ve unlocked an extra mini-tutorial — \
                 *Designing thumb-stopping social posts*. Keep pushing!",
                None,
            )
            .await;
        }
    }

    Ok(award)
}
