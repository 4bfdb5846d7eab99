use serde::Serialize;

use crate::auth::Role;

/// Error classes surfaced to callers of the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    PermissionDenied,
    StateConflict,
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("already registered with code {code}")]
    AlreadyRegistered { code: String },

    #[error("please send your FULL NAME (first + last)")]
    InvalidName,

    #[error("day {day} is out of range (1-{max})")]
    OutOfRange { day: i32, max: i32 },

    #[error("attach a photo, document or video with your submission")]
    MissingAttachment,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("please register first")]
    NotRegistered,

    #[error("student {0} not found")]
    StudentNotFound(String),

    #[error("no lesson found for day {0}")]
    LessonNotFound(i32),

    #[error("no submission found for {code} on lesson {day}")]
    SubmissionNotFound { code: String, day: i32 },

    #[error("lesson {day} is an advanced assignment; trainer approval is required")]
    TierLocked { day: i32 },

    #[error("{0} has not submitted every advanced lesson")]
    NotCompleted(String),

    #[error("{0} is not on the advanced track")]
    NotAdvanced(String),

    #[error("{0} has already graduated")]
    AlreadyGraduated(String),

    #[error("cohort day is already at {0}")]
    AlreadyAtMax(i32),

    #[error("{required} access required")]
    PermissionDenied { required: Role },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidName
            | AppError::OutOfRange { .. }
            | AppError::MissingAttachment
            | AppError::InvalidArgument(_) => ErrorKind::Validation,
            AppError::NotRegistered
            | AppError::StudentNotFound(_)
            | AppError::LessonNotFound(_)
            | AppError::SubmissionNotFound { .. } => ErrorKind::NotFound,
            AppError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            AppError::AlreadyRegistered { .. }
            | AppError::TierLocked { .. }
            | AppError::NotCompleted(_)
            | AppError::NotAdvanced(_)
            | AppError::AlreadyGraduated(_)
            | AppError::AlreadyAtMax(_) => ErrorKind::StateConflict,
            AppError::Database(_) => ErrorKind::Storage,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_a_validation_error() {
        let err = AppError::OutOfRange { day: 15, max: 12 };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "day 15 is out of range (1-12)");
    }

    #[test]
    fn missing_records_are_not_found() {
        assert_eq!(AppError::NotRegistered.kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::SubmissionNotFound {
                code: "PHX-2026-0001".to_string(),
                day: 3
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn role_failures_are_permission_denied() {
        let err = AppError::PermissionDenied {
            required: Role::Admin,
        };
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "admin access required");
    }
}
