//! Billing summary aggregation.
//!
//! Rolls a project's time logs up into totals, per-user and per-day
//! groups. Amounts are derived from the project's current billing rate at
//! the time the summary is computed; nothing is rounded here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DATE_FORMAT;
use crate::time_log::TimeLogDetail;

/// Hours and amount billed for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserHours {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub hours: f64,
    pub amount: f64,
}

/// Hours and amount billed for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DateHours {
    /// `YYYY-MM-DD`
    pub date: String,
    pub hours: f64,
    pub amount: f64,
}

/// Aggregated billing view of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub total_hours: f64,
    pub total_amount: f64,
    /// First-seen order of users in the log set
    pub hours_by_user: Vec<UserHours>,
    /// Newest date first
    pub hours_by_date: Vec<DateHours>,
}

/// Summarize `logs` at `billing_rate`. All statuses are included.
pub fn summarize(billing_rate: f64, logs: &[TimeLogDetail]) -> BillingSummary {
    let total_hours: f64 = logs.iter().map(|d| d.log.hours).sum();

    let mut by_user: Vec<UserHours> = Vec::new();
    let mut user_index: HashMap<Uuid, usize> = HashMap::new();
    let mut by_date: BTreeMap<String, f64> = BTreeMap::new();

    for detail in logs {
        let idx = *user_index.entry(detail.user.id).or_insert_with(|| {
            by_user.push(UserHours {
                user_id: detail.user.id,
                user_name: detail.user.name.clone(),
                user_email: detail.user.email.clone(),
                hours: 0.0,
                amount: 0.0,
            });
            by_user.len() - 1
        });
        by_user[idx].hours += detail.log.hours;

        let date = detail.log.log_date.format(DATE_FORMAT).to_string();
        *by_date.entry(date).or_insert(0.0) += detail.log.hours;
    }

    for user in &mut by_user {
        user.amount = user.hours * billing_rate;
    }

    // Zero-padded ISO dates sort correctly as strings.
    let hours_by_date = by_date
        .into_iter()
        .rev()
        .map(|(date, hours)| DateHours {
            date,
            hours,
            amount: hours * billing_rate,
        })
        .collect();

    BillingSummary {
        total_hours,
        total_amount: total_hours * billing_rate,
        hours_by_user: by_user,
        hours_by_date,
    }
}
