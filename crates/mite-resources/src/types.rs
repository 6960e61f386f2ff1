//! Typed records returned by the API.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// A booked block of time.
///
/// `hourly_rate` and `revenue` are in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeEntry {
    pub id: u64,
    pub date_at: NaiveDate,
    pub minutes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hourly_rate: i64,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub billable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locked: bool,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub customer_id: Option<u64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub service_id: Option<u64>,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl TimeEntry {
    /// Revenue of this entry in minor currency units: rate times hours.
    pub fn earned(&self) -> f64 {
        self.hourly_rate as f64 * (f64::from(self.minutes) / 60.0)
    }
}

/// Missing and `null` both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The API wraps every record under its singular resource name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimeEntryWrapper {
    pub time_entry: TimeEntry,
}
