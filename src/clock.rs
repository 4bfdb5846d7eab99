use crate::curriculum::TOTAL_DAYS;
use crate::error::{AppError, AppResult};
use crate::store::Store;

pub const COHORT_DAY_KEY: &str = "cohort_day";

/// Handle to the persisted cohort-day setting.
#[derive(Debug, Clone, Copy)]
pub struct CohortClock {
    total_days: i32,
}

impl Default for CohortClock {
    fn default() -> Self {
        Self {
            total_days: TOTAL_DAYS,
        }
    }
}

impl CohortClock {
    pub fn total_days(&self) -> i32 {
        self.total_days
    }

    /// Initialize the day to 1 on first run; an existing value is kept.
    pub async fn ensure_default(&self, store: &dyn Store) -> AppResult<i32> {
        let raw = store.ensure_setting(COHORT_DAY_KEY, "1").await?;
        Ok(self.parse_stored(&raw))
    }

    pub async fn current(&self, store: &dyn Store) -> AppResult<i32> {
        match store.setting(COHORT_DAY_KEY).await? {
            Some(raw) => Ok(self.parse_stored(&raw)),
            None => Ok(1),
        }
    }

    pub async fn advance(&self, store: &dyn Store) -> AppResult<i32> {
        let current = self.current(store).await?;
        if current >= self.total_days {
            return Err(AppError::AlreadyAtMax(self.total_days));
        }
        let next = current + 1;
        store.put_setting(COHORT_DAY_KEY, &next.to_string()).await?;
        tracing::info!(day = next, "cohort day advanced");
        Ok(next)
    }

    pub async fn set_day(&self, store: &dyn Store, day: i32) -> AppResult<i32> {
        if !(1..=self.total_days).contains(&day) {
            return Err(AppError::OutOfRange {
                day,
                max: self.total_days,
            });
        }
        store.put_setting(COHORT_DAY_KEY, &day.to_string()).await?;
        tracing::info!(day, "cohort day set");
        Ok(day)
    }

    fn parse_stored(&self, raw: &str) -> i32 {
        match raw.trim().parse::<i32>() {
            Ok(day) => day.clamp(1, self.total_days),
            Err(_) => {
                tracing::warn!(value = raw, "unreadable cohort day setting, using 1");
                1
            }
        }
    }
}
