//! Revenue projections from booked time.
//!
//! Revenue of an entry is `hourly_rate * minutes / 60` in minor currency
//! units. Projections are reported in major units, rounded.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::{debug, instrument};

use mite_resources::{Mite, Result, TimeEntry};

/// Delimiter used by [`pretty_number`] when none is given.
pub const DEFAULT_DELIMITER: &str = ".";

/// Projected revenue for a year, in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueProjection {
    /// Revenue so far, scaled linearly to the whole year.
    pub per_year: i64,
    /// Revenue so far plus the rest of the year at the last 4 weeks' daily rate.
    pub per_last_4_weeks: i64,
    /// Revenue so far plus the rest of the year at the last 7 days' daily rate.
    pub per_last_7_days: i64,
}

impl RevenueProjection {
    /// Project the revenue of `year` as seen at `now`.
    ///
    /// Entries are assigned to the year by `date_at`; the 4-week and 7-day
    /// windows select entries created strictly after `now - 28d` and
    /// `now - 7d`.
    pub fn compute(entries: &[TimeEntry], year: i32, now: DateTime<Utc>) -> Self {
        let four_weeks_ago = now - Duration::days(28);
        let one_week_ago = now - Duration::days(7);

        let this_year: Vec<&TimeEntry> = entries
            .iter()
            .filter(|entry| entry.date_at.year() == year)
            .collect();
        let last_4_weeks: Vec<&TimeEntry> = this_year
            .iter()
            .copied()
            .filter(|entry| entry.created_at.with_timezone(&Utc) > four_weeks_ago)
            .collect();
        let last_week = last_4_weeks
            .iter()
            .filter(|entry| entry.created_at.with_timezone(&Utc) > one_week_ago);

        let revenue: f64 = this_year.iter().map(|entry| entry.earned()).sum();
        let per_day_last_4_weeks = last_4_weeks.iter().map(|entry| entry.earned()).sum::<f64>() / 28.0;
        let per_day_last_week = last_week.map(|entry| entry.earned()).sum::<f64>() / 7.0;

        let days_in_year = f64::from(days_in_year(year));
        let elapsed = f64::from(elapsed_days(year, now.date_naive()));
        let remaining = days_in_year - elapsed;

        Self {
            per_year: (revenue * (days_in_year / elapsed / 100.0)).round() as i64,
            per_last_4_weeks: ((revenue + per_day_last_4_weeks * remaining) / 100.0).round() as i64,
            per_last_7_days: ((revenue + per_day_last_week * remaining) / 100.0).round() as i64,
        }
    }
}

/// Fetch the time entries of `year` and project its revenue as seen at `now`.
#[instrument(skip(mite))]
pub async fn financial_metrics(mite: &Mite, year: i32, now: DateTime<Utc>) -> Result<RevenueProjection> {
    let entries: Vec<TimeEntry> = mite
        .time_entries()
        .for_year(year)
        .await?
        .into_iter()
        .map(|wrapper| wrapper.time_entry)
        .collect();

    debug!(entries = entries.len(), "Computing projection");
    Ok(RevenueProjection::compute(&entries, year, now))
}

/// Number of days in `year`.
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Days of `year` that have passed by `today`, counting today.
///
/// A past year counts as fully elapsed; a future year as one day in.
pub fn elapsed_days(year: i32, today: NaiveDate) -> u32 {
    match today.year().cmp(&year) {
        std::cmp::Ordering::Equal => today.ordinal(),
        std::cmp::Ordering::Greater => days_in_year(year),
        std::cmp::Ordering::Less => 1,
    }
}

/// Group the digits of `n` in thousands.
///
/// `pretty_number(1234567, ".")` -> `"1.234.567"`
pub fn pretty_number(n: i64, delimiter: &str) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * delimiter.len() + 1);

    if n < 0 {
        out.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(delimiter);
        }
        out.push(digit);
    }
    out
}
