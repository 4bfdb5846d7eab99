use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Caller roles, ordered so that a higher role includes every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Trainer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Student => "student",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        })
    }
}

/// Chat ids holding elevated roles.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    pub admins: HashSet<i64>,
    pub trainers: HashSet<i64>,
}

impl RoleDirectory {
    pub fn role_of(&self, chat_id: i64) -> Role {
        if self.admins.contains(&chat_id) {
            Role::Admin
        } else if self.trainers.contains(&chat_id) {
            Role::Trainer
        } else {
            Role::Student
        }
    }
}

pub fn is_allowed(caller: Role, required: Role) -> bool {
    caller >= required
}

pub fn authorize(caller: Role, required: Role) -> AppResult<()> {
    if is_allowed(caller, required) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied { required })
    }
}
