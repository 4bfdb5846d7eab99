use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Raised when a status, tier or award kind column holds an unknown value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {field} value `{value}`")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Basic,
    Advanced,
    Paused,
    Graduated,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Basic => "basic",
            Status::Advanced => "advanced",
            Status::Paused => "paused",
            Status::Graduated => "graduated",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Status::Basic),
            "advanced" => Ok(Status::Advanced),
            "paused" => Ok(Status::Paused),
            "graduated" => Ok(Status::Graduated),
            other => Err(UnknownVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Advanced,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Advanced => "advanced",
        }
    }

    /// Statuses that owe a submission for a lesson of this tier.
    pub fn eligible_statuses(self) -> &'static [Status] {
        match self {
            Tier::Basic => &[Status::Basic, Status::Advanced],
            Tier::Advanced => &[Status::Advanced],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Tier::Basic),
            "advanced" => Ok(Tier::Advanced),
            other => Err(UnknownVariant {
                field: "tier",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AwardKind {
    Star,
    Bonus,
    Winner,
}

impl AwardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AwardKind::Star => "star",
            AwardKind::Bonus => "bonus",
            AwardKind::Winner => "winner",
        }
    }
}

impl FromStr for AwardKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "star" => Ok(AwardKind::Star),
            "bonus" => Ok(AwardKind::Bonus),
            "winner" => Ok(AwardKind::Winner),
            other => Err(UnknownVariant {
                field: "kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub chat_id: i64,
    pub full_name: String,
    pub code: String,
    pub status: Status,
    pub joined_at: DateTime<Utc>,
    pub graduated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    pub day: i32,
    pub tier: Tier,
    pub title: String,
    pub content: String,
    pub assignment: String,
    pub deadline_hour: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub student_code: String,
    pub lesson_day: i32,
    pub attachment_ref: String,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Award {
    pub id: Uuid,
    pub student_code: String,
    /// 0 when the award is not tied to a lesson.
    pub lesson_day: i32,
    pub kind: AwardKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub submission_count: i64,
    /// Mean of graded submissions, `None` when nothing has been graded.
    pub average_grade: Option<f64>,
}

/// Outcome of the registration insert, decided inside the store's critical section.
#[derive(Debug, Clone)]
pub enum Registration {
    Created(Student),
    Existing(Student),
}
