//! Schedule kinds and next-execution computation.
//!
//! A [`Schedule`] is a closed sum over the four supported kinds. Per-kind
//! required fields are part of the variant itself, so a schedule missing a
//! field for its kind cannot be represented; it is rejected at the
//! deserialization boundary. Range checks live in [`Schedule::validate`] and
//! run when a job is registered, never at compute time.
//!
//! All date math is UTC; there is no timezone or daylight-saving handling by
//! design.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// When a job should fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Schedule {
    /// Every `interval_seconds`, anchored to the previous execution.
    #[serde(rename_all = "camelCase")]
    Interval { interval_seconds: u64 },

    /// Once a day at `hour:minute:00` UTC.
    Daily { hour: u32, minute: u32 },

    /// Once a week on `day_of_week` at `hour:minute:00` UTC.
    #[serde(rename_all = "camelCase")]
    Weekly {
        day_of_week: Weekday,
        hour: u32,
        minute: u32,
    },

    /// A single fixed instant. The owning job is deactivated after it fires.
    #[serde(rename_all = "camelCase")]
    OnceAt { run_at: DateTime<Utc> },
}

impl Schedule {
    /// Range-checks the schedule's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidSchedule`] for a zero interval or an
    /// out-of-range hour/minute.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        match *self {
            Schedule::Interval { interval_seconds } => {
                if interval_seconds == 0 {
                    return Err(SchedulerError::InvalidSchedule(
                        "intervalSeconds must be greater than zero".to_owned(),
                    ));
                }
            }
            Schedule::Daily { hour, minute }
            | Schedule::Weekly { hour, minute, .. } => {
                if hour > 23 {
                    return Err(SchedulerError::InvalidSchedule(format!(
                        "hour must be 0-23, got {hour}"
                    )));
                }
                if minute > 59 {
                    return Err(SchedulerError::InvalidSchedule(format!(
                        "minute must be 0-59, got {minute}"
                    )));
                }
            }
            Schedule::OnceAt { .. } => {}
        }
        Ok(())
    }

    /// Computes the next execution instant. Pure function of the schedule,
    /// `now`, and the previous execution.
    ///
    /// With no previous execution an `Interval` schedule yields
    /// `now + interval`; a job is never due immediately at registration.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
        match *self {
            Schedule::Interval { interval_seconds } => {
                last.unwrap_or(now) + Duration::seconds(clamp_secs(interval_seconds))
            }
            Schedule::Daily { hour, minute } => {
                let today = at_wall_time(now.date_naive(), hour, minute);
                if today > now {
                    today
                } else {
                    at_wall_time(now.date_naive() + Days::new(1), hour, minute)
                }
            }
            Schedule::Weekly {
                day_of_week,
                hour,
                minute,
            } => {
                let days_ahead = (i64::from(day_of_week.num_days_from_monday())
                    - i64::from(now.weekday().num_days_from_monday()))
                .rem_euclid(7);
                #[allow(clippy::cast_sign_loss)]
                let candidate =
                    at_wall_time(now.date_naive() + Days::new(days_ahead as u64), hour, minute);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
            Schedule::OnceAt { run_at } => run_at,
        }
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

fn at_wall_time(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour.min(23), minute.min(59), 0)
        .expect("clamped wall-clock time is always valid")
        .and_utc()
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;
