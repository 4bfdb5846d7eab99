//! Process configuration loaded from the environment.
//!
//! | Variable                  | Default        |
//! |---------------------------|----------------|
//! | `DATABASE_URL`            | required unless running in memory |
//! | `ADMIN_IDS`               | empty          |
//! | `TRAINER_IDS`             | empty          |
//! | `GROUP_ID`                | `0`            |
//! | `CERTIFICATE_DIR`         | `certificates` |
//! | `DM_ADVANCED_TO_APPROVED` | `true`         |

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;

use crate::auth::RoleDirectory;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub roles: RoleDirectory,
    pub group_id: i64,
    pub certificate_dir: PathBuf,
    /// Send the full text of advanced lessons privately to approved students.
    pub dm_advanced_to_approved: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            roles: RoleDirectory::default(),
            group_id: 0,
            certificate_dir: PathBuf::from("certificates"),
            dm_advanced_to_approved: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok();

        let admins = parse_ids(&std::env::var("ADMIN_IDS").unwrap_or_default())
            .context("ADMIN_IDS must be a comma-separated list of chat ids")?;
        let trainers = parse_ids(&std::env::var("TRAINER_IDS").unwrap_or_default())
            .context("TRAINER_IDS must be a comma-separated list of chat ids")?;

        let group_id = match std::env::var("GROUP_ID") {
            Ok(value) => value
                .trim()
                .parse()
                .context("GROUP_ID must be a numeric chat id")?,
            Err(_) => 0,
        };

        let certificate_dir = std::env::var("CERTIFICATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("certificates"));

        let dm_advanced_to_approved = match std::env::var("DM_ADVANCED_TO_APPROVED") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("DM_ADVANCED_TO_APPROVED has invalid value `{value}`"))?,
            Err(_) => true,
        };

        Ok(Self {
            database_url,
            roles: RoleDirectory { admins, trainers },
            group_id,
            certificate_dir,
            dm_advanced_to_approved,
        })
    }
}

fn parse_ids(raw: &str) -> anyhow::Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().with_context(|| format!("invalid chat id `{s}`")))
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_lists_with_whitespace() {
        let ids = parse_ids(" 12, 34 ,,56").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&34));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(parse_ids("12,abc").is_err());
    }

    #[test]
    fn empty_id_list_is_allowed() {
        assert!(parse_ids("").unwrap().is_empty());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
