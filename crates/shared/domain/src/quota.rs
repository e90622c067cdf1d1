//! Daily hour cap arithmetic.
//!
//! The cap is checked against a fresh sum of the user's other entries for
//! the day, never against a running counter. Fetching those entries is the
//! caller's job.
//!
//! Validated hours sit on a hundredths grid, so sums are taken in whole
//! hundredths and compared exactly.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::constants::{DAILY_HOURS_CAP, DATE_FORMAT, HOURS_SCALE};
use crate::error::{DomainError, DomainResult};
use crate::time_log::TimeLog;

/// Round `hours` to the nearest hundredth.
pub fn quantize_hours(hours: f64) -> f64 {
    (hours * HOURS_SCALE).round() / HOURS_SCALE
}

/// Whole hundredths, when `hours` lies exactly on the grid.
fn grid_units(hours: f64) -> Option<i64> {
    let units = (hours * HOURS_SCALE).round();
    (units / HOURS_SCALE == hours).then_some(units as i64)
}

/// Hours still available on a day where `logged` hours already exist.
pub fn remaining_allowance(logged: f64) -> f64 {
    match grid_units(logged) {
        Some(units) => ((cap_units() - units).max(0)) as f64 / HOURS_SCALE,
        None => (DAILY_HOURS_CAP - logged).max(0.0),
    }
}

fn cap_units() -> i64 {
    (DAILY_HOURS_CAP * HOURS_SCALE) as i64
}

/// Sum of hours over `logs`, skipping the entry identified by `exclude`.
pub fn logged_hours<'a>(logs: impl IntoIterator<Item = &'a TimeLog>, exclude: Option<Uuid>) -> f64 {
    let units: i64 = logs
        .into_iter()
        .filter(|log| Some(log.id) != exclude)
        .map(|log| (log.hours * HOURS_SCALE).round() as i64)
        .sum();
    units as f64 / HOURS_SCALE
}

/// Reject `proposed` hours if they would push the day over the cap.
pub fn check_daily_cap(logged: f64, proposed: f64) -> DomainResult<()> {
    let exceeds = match (grid_units(logged), grid_units(proposed)) {
        (Some(logged), Some(proposed)) => logged + proposed > cap_units(),
        _ => logged + proposed > DAILY_HOURS_CAP,
    };
    if exceeds {
        return Err(DomainError::QuotaExceeded {
            remaining: remaining_allowance(logged),
        });
    }
    Ok(())
}

/// Lock key serializing quota checks for one user and calendar day.
pub fn quota_key(user_id: Uuid, day: NaiveDate) -> String {
    format!("quota:{}:{}", user_id, day.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_log::TimeLogStatus;
    use chrono::Utc;

    fn log(hours: f64) -> TimeLog {
        let now = Utc::now();
        TimeLog {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            hours,
            notes: "Daily standup".to_string(),
            log_date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
            status: TimeLogStatus::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_third_entry_over_cap_reports_remaining() {
        let day = vec![log(5.0), log(6.0)];
        let logged = logged_hours(&day, None);

        match check_daily_cap(logged, 2.0) {
            Err(DomainError::QuotaExceeded { remaining }) => assert_eq!(remaining, 1.0),
            other => panic!("expected quota error, got {:?}", other),
        }
        assert!(check_daily_cap(logged, 1.0).is_ok());
    }

    #[test]
    fn test_remaining_is_floored_at_zero() {
        assert_eq!(remaining_allowance(12.0), 0.0);
        assert_eq!(remaining_allowance(14.0), 0.0);

        match check_daily_cap(14.0, 0.5) {
            Err(DomainError::QuotaExceeded { remaining }) => assert_eq!(remaining, 0.0),
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_entry_not_counted() {
        let existing = log(8.0);
        let other = log(3.0);
        let id = existing.id;
        let day = vec![existing, other];

        // Raising the 8h entry to 9h: (11 - 8) + 9 = 12 fits.
        let logged = logged_hours(&day, Some(id));
        assert_eq!(logged, 3.0);
        assert!(check_daily_cap(logged, 9.0).is_ok());

        // Without exclusion the same change would look like 11 + 9.
        assert!(check_daily_cap(logged_hours(&day, None), 9.0).is_err());
    }

    #[test]
    fn test_fractional_sums_reaching_cap_are_accepted() {
        let day = vec![log(4.1), log(4.1)];
        let logged = logged_hours(&day, None);
        assert_eq!(logged, 8.2);
        assert!(check_daily_cap(logged, 3.8).is_ok());
        assert!(check_daily_cap(logged, 3.81).is_err());

        let tenths = vec![log(0.1), log(0.2), log(11.7)];
        assert_eq!(logged_hours(&tenths, None), 12.0);
    }

    #[test]
    fn test_any_excess_over_cap_rejected() {
        assert!(check_daily_cap(6.0, 6.0000000005).is_err());
        assert!(check_daily_cap(11.99, 0.0100001).is_err());
        assert!(check_daily_cap(6.0, 6.0).is_ok());
    }

    #[test]
    fn test_remaining_is_exact_in_hundredths() {
        match check_daily_cap(8.2, 4.0) {
            Err(DomainError::QuotaExceeded { remaining }) => assert_eq!(remaining, 3.8),
            other => panic!("expected quota error, got {:?}", other),
        }
    }

    #[test]
    fn test_quantize_rounds_to_hundredths() {
        assert_eq!(quantize_hours(2.346), 2.35);
        assert_eq!(quantize_hours(7.5), 7.5);
        assert_eq!(quantize_hours(0.004), 0.0);
    }

    #[test]
    fn test_quota_key_format() {
        let user = Uuid::nil();
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(
            quota_key(user, day),
            "quota:00000000-0000-0000-0000-000000000000:2025-01-06"
        );
    }
}
