use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{ArmError, Result};

/// Resolved query window, always concrete UTC instants by the time a request
/// is built. `start <= end` is not enforced here; the archive rejects
/// inverted windows itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Resolves optional bound strings against the current wall clock.
    ///
    /// Accepted forms per bound:
    /// - calendar date `YYYY-MM-DD`, resolved to midnight UTC
    /// - full ISO-8601 `YYYY-MM-DDTHH:MM:SS` (trailing `Z` or offset allowed)
    ///
    /// An omitted start defaults to one hour before `now`; an omitted end
    /// defaults to `now`.
    pub fn resolve(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let now = Utc::now();
        Self::resolve_at(start, end, now)
    }

    /// Same as [`TimeRange::resolve`], with an explicit reference instant.
    pub fn resolve_at(
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let start = match start {
            Some(s) => parse_bound("start_time", s)?,
            None => now - Duration::hours(1),
        };
        let end = match end {
            Some(s) => parse_bound("end_time", s)?,
            None => now,
        };
        Ok(TimeRange { start, end })
    }

    /// Start bound in the wire format sent to the archive.
    pub fn start_param(&self) -> String {
        format_bound(self.start)
    }

    /// End bound in the wire format sent to the archive.
    pub fn end_param(&self) -> String {
        format_bound(self.end)
    }
}

fn format_bound(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_bound(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();

    // Full ISO-8601 with an explicit offset ("...Z", "...+00:00").
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    // ISO-8601 without an offset; treated as UTC.
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc());
    }
    // Calendar date; midnight boundary.
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc());
    }

    Err(ArmError::Validation(format!(
        "{field} '{raw}' is not a calendar date (YYYY-MM-DD) or ISO-8601 timestamp (YYYY-MM-DDTHH:MM:SS)"
    )))
}
