//! Outbound delivery to students and the training group.
//!
//! Delivery is always best-effort. Callers commit their state change first,
//! then go through [`user_best_effort`] / [`group_best_effort`], which log and
//! swallow failures one recipient at a time.

use std::path::Path;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_user(
        &self,
        chat_id: i64,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<(), NotifyError>;

    async fn notify_group(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError>;

    async fn remove_from_group(&self, chat_id: i64) -> Result<(), NotifyError>;
}

/// Writes every delivery to the log instead of a chat transport.
pub struct LogNotifier {
    group_id: i64,
}

impl LogNotifier {
    pub fn new(group_id: i64) -> Self {
        Self { group_id }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_user(
        &self,
        chat_id: i64,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            chat_id,
            attachment = ?attachment,
            "direct message: {text}"
        );
        Ok(())
    }

    async fn notify_group(&self, text: &str, attachment: Option<&Path>) -> Result<(), NotifyError> {
        tracing::info!(
            group_id = self.group_id,
            attachment = ?attachment,
            "group message: {text}"
        );
        Ok(())
    }

    async fn remove_from_group(&self, chat_id: i64) -> Result<(), NotifyError> {
        tracing::info!(group_id = self.group_id, chat_id, "removed from group");
        Ok(())
    }
}

pub async fn user_best_effort(
    notifier: &dyn Notifier,
    chat_id: i64,
    text: &str,
    attachment: Option<&Path>,
) -> bool {
    match notifier.notify_user(chat_id, text, attachment).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(chat_id, error = %err, "direct notification dropped");
            false
        }
    }
}

pub async fn group_best_effort(
    notifier: &dyn Notifier,
    text: &str,
    attachment: Option<&Path>,
) -> bool {
    match notifier.notify_group(text, attachment).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "group notification dropped");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{Notifier, NotifyError};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Delivery {
        User {
            chat_id: i64,
            text: String,
            attachment: Option<PathBuf>,
        },
        Group {
            text: String,
        },
        Removed {
            chat_id: i64,
        },
    }

    /// Records deliveries; chat ids in `failing` and the group (when
    /// `group_down`) reject delivery.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub failing: HashSet<i64>,
        pub group_down: bool,
        deliveries: Mutex<Vec<Delivery>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_group_down() -> Self {
            Self {
                group_down: true,
                ..Self::default()
            }
        }

        pub fn deliveries(&self) -> Vec<Delivery> {
            self.deliveries.lock().unwrap().clone()
        }

        pub fn group_messages(&self) -> Vec<String> {
            self.deliveries()
                .into_iter()
                .filter_map(|d| match d {
                    Delivery::Group { text } => Some(text),
                    _ => None,
                })
                .collect()
        }

        pub fn messages_to(&self, target: i64) -> Vec<String> {
            self.deliveries()
                .into_iter()
                .filter_map(|d| match d {
                    Delivery::User { chat_id, text, .. } if chat_id == target => Some(text),
                    _ => None,
                })
                .collect()
        }

        fn fail(recipient: impl ToString) -> NotifyError {
            NotifyError::Delivery {
                recipient: recipient.to_string(),
                reason: "unreachable".to_string(),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_user(
            &self,
            chat_id: i64,
            text: &str,
            attachment: Option<&Path>,
        ) -> Result<(), NotifyError> {
            if self.failing.contains(&chat_id) {
                return Err(Self::fail(chat_id));
            }
            self.deliveries.lock().unwrap().push(Delivery::User {
                chat_id,
                text: text.to_string(),
                attachment: attachment.map(Path::to_path_buf),
            });
            Ok(())
        }

        async fn notify_group(
            &self,
            text: &str,
            _attachment: Option<&Path>,
        ) -> Result<(), NotifyError> {
            if self.group_down {
                return Err(Self::fail("group"));
            }
            self.deliveries.lock().unwrap().push(Delivery::Group {
                text: text.to_string(),
            });
            Ok(())
        }

        async fn remove_from_group(&self, chat_id: i64) -> Result<(), NotifyError> {
            if self.group_down || self.failing.contains(&chat_id) {
                return Err(Self::fail(chat_id));
            }
            self.deliveries
                .lock()
                .unwrap()
                .push(Delivery::Removed { chat_id });
            Ok(())
        }
    }
}
