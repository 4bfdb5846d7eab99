//! Group-facing broadcasts: lesson pins, the upgrade notice and certificates.

use crate::certificate::CertificateIssuer;
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::models::{Lesson, Status, Tier};
use crate::notify::{self, Notifier};
use crate::report;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct PinnedLesson {
    pub lesson: Lesson,
    /// Approved students who received the full lesson privately.
    pub private_deliveries: usize,
}

/// Post a lesson to the group; advanced lessons may also go out privately.
pub async fn pin_lesson(
    store: &dyn Store,
    notifier: &dyn Notifier,
    day: i32,
    dm_advanced_to_approved: bool,
) -> AppResult<PinnedLesson> {
    let lesson = store
        .lesson(day)
        .await?
        .ok_or(AppError::LessonNotFound(day))?;

    notify::group_best_effort(
        notifier,
        &report::lesson_preview(&lesson, dm_advanced_to_approved),
        None,
    )
    .await;

    let mut private_deliveries = 0;
    if lesson.tier == Tier::Advanced && dm_advanced_to_approved {
        let text = report::advanced_lesson_message(&lesson);
        for student in store.active_students(&[Status::Advanced]).await? {
            if notify::user_best_effort(notifier, student.chat_id, &text, None).await {
                private_deliveries += 1;
            }
        }
    }
    tracing::info!(day, private_deliveries, "lesson pinned");

    Ok(PinnedLesson {
        lesson,
        private_deliveries,
    })
}

pub async fn post_upgrade_notice(notifier: &dyn Notifier) -> bool {
    notify::group_best_effort(notifier, &report::upgrade_notice(), None).await
}

/// Issue certificates to every advanced, non-graduated student who completed
/// the track. Returns how many were rendered.
pub async fn certify_completed(
    store: &dyn Store,
    notifier: &dyn Notifier,
    issuer: &dyn CertificateIssuer,
) -> AppResult<usize> {
    let mut issued = 0;
    for student in store.active_students(&[Status::Advanced]).await? {
        if !lifecycle::completed_advanced(store, &student.code).await? {
            continue;
        }

        let path = match issuer.render(&student.full_name, &student.code) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(code = %student.code, error = %err, "certificate rendering failed");
                continue;
            }
        };
        issued += 1;
        tracing::info!(code = %student.code, path = %path.display(), "certificate issued");

        notify::group_best_effort(
            notifier,
            &format!(
                "🎖 {} ({}) has completed the program! Certificate issued.",
                student.full_name, student.code
            ),
            None,
        )
        .await;
        notify::user_best_effort(
            notifier,
            student.chat_id,
            "🏆 Your Photex Certificate",
            Some(path.as_path()),
        )
        .await;
    }
    Ok(issued)
}
