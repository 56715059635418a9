use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How often a recurring reminder repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Upper bound on `interval`, enforced at validation time. Generous enough
/// for any real schedule while keeping every date computation in range.
pub const MAX_INTERVAL: u32 = 1_000;

/// Recurrence rule for a reminder.
///
/// `days_of_week` uses the persisted 0-6 indexing with 0 = Sunday, and is
/// only meaningful for weekly patterns. `end_date` cuts the series off: no
/// occurrence is produced strictly after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            days_of_week: None,
            end_date: None,
        }
    }

    /// Check the pattern invariants before it is allowed anywhere near the
    /// store. `Scheduler::schedule` calls this before persisting.
    pub fn validate(&self) -> Result<()> {
        if self.interval < 1 {
            return Err(Error::validation("interval must be >= 1"));
        }
        if self.interval > MAX_INTERVAL {
            return Err(Error::validation(format!(
                "interval must be <= {}",
                MAX_INTERVAL
            )));
        }
        if let Some(days) = &self.days_of_week {
            if self.frequency != Frequency::Weekly {
                return Err(Error::validation(
                    "daysOfWeek is only valid for weekly patterns",
                ));
            }
            if days.is_empty() {
                return Err(Error::validation("daysOfWeek must not be empty"));
            }
            if days.iter().any(|&d| d > 6) {
                return Err(Error::validation(
                    "daysOfWeek entries must be in 0..=6 (0 = Sunday)",
                ));
            }
        }
        Ok(())
    }
}

/// Compute the next occurrence after `previous` for `pattern`.
///
/// Pure function: no I/O, no clock reads. Returns `None` when the candidate
/// falls strictly after `pattern.end_date`, which tells the caller the
/// series is exhausted. A candidate past the representable date range is
/// treated the same way, so a persisted pattern that predates the interval
/// bound can never panic the fire path.
///
/// Monthly and yearly advances clamp the day-of-month to the length of the
/// target month (Jan 31 + 1 month = Feb 28, or Feb 29 in leap years).
pub fn next_occurrence(
    previous: DateTime<Utc>,
    pattern: &RecurrencePattern,
) -> Option<DateTime<Utc>> {
    let interval = pattern.interval as i64;

    let candidate = match pattern.frequency {
        Frequency::Daily => previous.checked_add_signed(Duration::days(interval))?,
        Frequency::Weekly => match &pattern.days_of_week {
            None => previous.checked_add_signed(Duration::days(7 * interval))?,
            Some(days) => {
                let weekday = previous.weekday().num_days_from_sunday() as u8;
                previous.checked_add_signed(Duration::days(in_week_jump(weekday, days, interval)))?
            }
        },
        Frequency::Monthly => shift_months(previous, interval)?,
        Frequency::Yearly => shift_months(previous, interval * 12)?,
    };

    match pattern.end_date {
        Some(end) if candidate.date_naive() > end => None,
        _ => Some(candidate),
    }
}

/// Day delta for weekly patterns with an explicit weekday set.
///
/// Jumps to a later weekday inside the same week ignore the interval; the
/// interval only applies when wrapping into a new week. Compatibility rule
/// carried over from the original product behavior, pending product-owner
/// confirmation.
fn in_week_jump(weekday: u8, days: &[u8], interval: i64) -> i64 {
    let mut sorted = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    match sorted.iter().find(|&&d| d > weekday) {
        Some(&next) => (next - weekday) as i64,
        None => 7 * interval - weekday as i64 + sorted[0] as i64,
    }
}

/// Advance by whole months, clamping the day to the target month's length.
/// Time of day is preserved. `None` when the target year leaves the
/// representable range.
fn shift_months(previous: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let total = previous.year() as i64 * 12 + previous.month0() as i64 + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = previous.day().min(days_in_month(year, month));

    Some(
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_time(previous.time())
            .and_utc(),
    )
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}
