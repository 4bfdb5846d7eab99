//! Student lifecycle: registration, approval, pause/resume and graduation.
//!
//! ```text
//! basic ──approve──▶ advanced ──graduate──▶ graduated
//!   ▲ │                 │
//!   │ └──pause──▶ paused ◀──pause
//!   └───resume───┘
//! ```
//!
//! Resume always lands on `basic`, even for a student paused from `advanced`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::curriculum::ADVANCED_DAYS;
use crate::error::{AppError, AppResult};
use crate::models::{Registration, Status, Student};
use crate::notify::{self, Notifier};
use crate::store::Store;

pub const CODE_PREFIX: &str = "PHX";

pub fn student_code(year: i32, seq: i64) -> String {
    format!("{CODE_PREFIX}-{year}-{seq:04}")
}

/// At least three characters and a space between first and last name.
pub fn validate_full_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.chars().count() < 3 || !name.contains(' ') {
        return Err(AppError::InvalidName);
    }
    Ok(name.to_string())
}

pub async fn register(
    store: &dyn Store,
    chat_id: i64,
    full_name: &str,
    now: DateTime<Utc>,
) -> AppResult<Student> {
    if let Some(existing) = store.student_by_chat_id(chat_id).await? {
        return Err(AppError::AlreadyRegistered {
            code: existing.code,
        });
    }
    let name = validate_full_name(full_name)?;

    match store.register_student(chat_id, &name, now).await? {
        Registration::Created(student) => {
            tracing::info!(code = %student.code, chat_id, "student registered");
            Ok(student)
        }
        Registration::Existing(student) => Err(AppError::AlreadyRegistered { code: student.code }),
    }
}

async fn require_student(store: &dyn Store, code: &str) -> AppResult<Student> {
    store
        .student_by_code(code)
        .await?
        .ok_or_else(|| AppError::StudentNotFound(code.to_string()))
}

fn require_not_graduated(student: &Student) -> AppResult<()> {
    if student.graduated {
        return Err(AppError::AlreadyGraduated(student.code.clone()));
    }
    Ok(())
}

pub async fn approve(store: &dyn Store, notifier: &dyn Notifier, code: &str) -> AppResult<Student> {
    let student = require_student(store, code).await?;
    require_not_graduated(&student)?;

    if !store.set_status(code, Status::Advanced).await? {
        return Err(AppError::AlreadyGraduated(code.to_string()));
    }
    tracing::info!(code, previous = %student.status, "student approved for advanced");

    notify::group_best_effort(
        notifier,
        &format!("🎓 {code} has unlocked *Advanced Training*! Welcome to the pro track! 👏"),
        None,
    )
    .await;
    notify::user_best_effort(
        notifier,
        student.chat_id,
        "🚀 Welcome to Advanced Training!\nYou now receive full lessons, professional assignments, \
         and a CERTIFICATE upon completion.",
        None,
    )
    .await;

    Ok(Student {
        status: Status::Advanced,
        ..student
    })
}

pub async fn pause(store: &dyn Store, code: &str) -> AppResult<()> {
    let student = require_student(store, code).await?;
    require_not_graduated(&student)?;

    if !store.set_status(code, Status::Paused).await? {
        return Err(AppError::AlreadyGraduated(code.to_string()));
    }
    tracing::info!(code, previous = %student.status, "student paused");
    Ok(())
}

/// Returns false, changing nothing, unless the student is currently paused.
pub async fn resume(store: &dyn Store, code: &str) -> AppResult<bool> {
    require_student(store, code).await?;

    let resumed = store.resume_student(code).await?;
    if resumed {
        tracing::info!(code, "student resumed to basic");
    } else {
        tracing::debug!(code, "resume ignored, student not paused");
    }
    Ok(resumed)
}

pub fn covers_advanced_days(days: &BTreeSet<i32>) -> bool {
    ADVANCED_DAYS.into_iter().all(|day| days.contains(&day))
}

/// Whether the student has submitted for every advanced day. Grades do not matter.
pub async fn completed_advanced(store: &dyn Store, code: &str) -> AppResult<bool> {
    let days = store.submitted_days(code).await?;
    Ok(covers_advanced_days(&days))
}

#[derive(Debug, Clone)]
pub struct Graduation {
    pub student: Student,
    pub removed_from_group: bool,
}

pub async fn mark_graduated(
    store: &dyn Store,
    notifier: &dyn Notifier,
    code: &str,
) -> AppResult<Graduation> {
    let student = require_student(store, code).await?;
    require_not_graduated(&student)?;
    if student.status != Status::Advanced {
        return Err(AppError::NotAdvanced(code.to_string()));
    }
    if !completed_advanced(store, code).await? {
        return Err(AppError::NotCompleted(code.to_string()));
    }

    // Only an advanced, non-graduated row is updated; a concurrent change loses.
    if !store.mark_graduated(code).await? {
        let current = require_student(store, code).await?;
        require_not_graduated(&current)?;
        return Err(AppError::NotAdvanced(code.to_string()));
    }
    tracing::info!(code, "student graduated");

    let removed_from_group = match notifier.remove_from_group(student.chat_id).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(code, error = %err, "could not remove graduate from group");
            false
        }
    };

    Ok(Graduation {
        student: Student {
            status: Status::Graduated,
            graduated: true,
            ..student
        },
        removed_from_group,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraduationRun {
    pub graduated: usize,
    pub removed_from_group: usize,
}

/// Graduate every non-graduated advanced student who has completed the track.
pub async fn graduate_all(store: &dyn Store, notifier: &dyn Notifier) -> AppResult<GraduationRun> {
    let mut run = GraduationRun::default();
    for candidate in store.active_students(&[Status::Advanced]).await? {
        if !completed_advanced(store, &candidate.code).await? {
            continue;
        }
        let graduation = match mark_graduated(store, notifier, &candidate.code).await {
            Ok(graduation) => graduation,
            Err(AppError::Database(err)) => return Err(AppError::Database(err)),
            Err(err) => {
                tracing::warn!(code = %candidate.code, error = %err, "graduation skipped");
                continue;
            }
        };
        run.graduated += 1;
        if graduation.removed_from_group {
            run.removed_from_group += 1;
        }
    }
    Ok(run)
}
