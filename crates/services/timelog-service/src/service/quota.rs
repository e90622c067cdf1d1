//! Daily quota enforcement against persisted entries.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{check_daily_cap, logged_hours};

use crate::repository::TimeLogRepository;

/// Checks the per-user daily hour cap against a fresh read of the store.
///
/// This is check-then-act; callers serialize it per (user, day) with a lock
/// held through the subsequent write.
pub struct QuotaEnforcer {
    repo: Arc<dyn TimeLogRepository>,
}

impl QuotaEnforcer {
    pub fn new(repo: Arc<dyn TimeLogRepository>) -> Self {
        Self { repo }
    }

    /// Fail with `QuotaExceeded` if `proposed_hours` would push `user_id`
    /// over the cap on `log_date`. `exclude_log_id` is the entry being
    /// updated, whose current hours must not count.
    pub async fn check_quota(
        &self,
        user_id: Uuid,
        log_date: NaiveDate,
        proposed_hours: f64,
        exclude_log_id: Option<Uuid>,
    ) -> AppResult<()> {
        let siblings = self
            .repo
            .find_by_user_and_date_range(user_id, log_date, log_date, exclude_log_id)
            .await?;
        let logged = logged_hours(&siblings, exclude_log_id);

        check_daily_cap(logged, proposed_hours).map_err(|e| {
            tracing::warn!(
                user_id = %user_id,
                log_date = %log_date,
                logged,
                proposed_hours,
                "Daily quota exceeded"
            );
            AppError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockTimeLogRepository;
    use chrono::Utc;
    use domain::{TimeLog, TimeLogStatus};
    use mockall::predicate::eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
    }

    fn log(user_id: Uuid, hours: f64) -> TimeLog {
        let now = Utc::now();
        TimeLog {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id,
            hours,
            notes: "Implementation".to_string(),
            log_date: day(),
            status: TimeLogStatus::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_rejects_third_entry_with_remaining() {
        let user = Uuid::new_v4();
        let mut repo = MockTimeLogRepository::new();
        repo.expect_find_by_user_and_date_range()
            .with(eq(user), eq(day()), eq(day()), eq(None))
            .returning(move |_, _, _, _| Ok(vec![log(user, 5.0), log(user, 6.0)]));

        let enforcer = QuotaEnforcer::new(Arc::new(repo));

        match enforcer.check_quota(user, day(), 2.0, None).await {
            Err(AppError::QuotaExceeded { remaining }) => assert_eq!(remaining, 1.0),
            other => panic!("expected quota error, got {:?}", other),
        }
        tokio_test::assert_ok!(enforcer.check_quota(user, day(), 1.0, None).await);
    }

    #[tokio::test]
    async fn test_update_excludes_itself() {
        let user = Uuid::new_v4();
        let existing = log(user, 8.0);
        let existing_id = existing.id;
        let other = log(user, 3.0);

        let mut repo = MockTimeLogRepository::new();
        // Even if the store ignores the exclusion, the sum must skip it.
        repo.expect_find_by_user_and_date_range()
            .with(eq(user), eq(day()), eq(day()), eq(Some(existing_id)))
            .returning(move |_, _, _, _| Ok(vec![existing.clone(), other.clone()]));

        let enforcer = QuotaEnforcer::new(Arc::new(repo));
        tokio_test::assert_ok!(enforcer.check_quota(user, day(), 9.0, Some(existing_id)).await);
        tokio_test::assert_err!(enforcer.check_quota(user, day(), 9.5, Some(existing_id)).await);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repo = MockTimeLogRepository::new();
        repo.expect_find_by_user_and_date_range()
            .returning(|_, _, _, _| Err(AppError::internal("connection reset")));

        let enforcer = QuotaEnforcer::new(Arc::new(repo));
        let result = enforcer.check_quota(Uuid::new_v4(), day(), 1.0, None).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
