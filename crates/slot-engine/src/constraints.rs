//! Scheduling constraints and their normalization.
//!
//! [`Constraints`] mirrors the JSON object a constraint parser produces from a
//! free-text request. Before generation it is resolved into
//! [`ResolvedConstraints`]: dates parsed in the engine's timezone, the duration
//! checked against the configured [`DurationPolicy`], weekday names parsed.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Preferred part of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    #[default]
    Any,
}

impl TimeOfDay {
    /// Inclusive range of start hours a slot may use for this preference.
    pub fn hour_window(self) -> HourWindow {
        match self {
            TimeOfDay::Morning => HourWindow { first: 9, last: 11 },
            TimeOfDay::Afternoon => HourWindow { first: 13, last: 16 },
            TimeOfDay::Any => HourWindow { first: 9, last: 16 },
        }
    }
}

/// An inclusive range of wall-clock start hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    pub first: u32,
    pub last: u32,
}

impl HourWindow {
    /// Number of distinct hours in the window.
    pub fn span(self) -> u32 {
        self.last - self.first + 1
    }

    pub fn contains(self, hour: u32) -> bool {
        (self.first..=self.last).contains(&hour)
    }
}

/// What to do with an explicit duration that is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPolicy {
    /// Fail with [`SlotError::InvalidConstraint`].
    #[default]
    Reject,
    /// Quietly use the default duration instead.
    Substitute,
}

/// Scheduling requirements extracted from a user's request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Meeting length. `None` means the request did not say.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    /// Earliest day to consider, `YYYY-MM-DD` (a full timestamp is accepted too).
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_days: Vec<String>,
    /// The original free-text request, kept for detail enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Constraints {
    /// Constraints for a plain request on `start_date` with everything else unset.
    pub fn starting(start_date: impl Into<String>) -> Self {
        Self {
            duration_minutes: None,
            start_date: start_date.into(),
            end_date: None,
            time_of_day: None,
            excluded_days: Vec::new(),
            context: None,
        }
    }

    /// The constraints used when a parser fails: one hour, starting tomorrow,
    /// any time of day.
    pub fn fallback(reference: DateTime<Utc>) -> Self {
        let tomorrow = (reference + Duration::days(1)).date_naive();
        Self {
            duration_minutes: Some(60),
            start_date: tomorrow.format("%Y-%m-%d").to_string(),
            end_date: None,
            time_of_day: Some(TimeOfDay::Any),
            excluded_days: Vec::new(),
            context: None,
        }
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_time_of_day(mut self, time_of_day: TimeOfDay) -> Self {
        self.time_of_day = Some(time_of_day);
        self
    }

    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    pub fn with_excluded_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_days = days.into_iter().map(Into::into).collect();
        self
    }

    /// Parse and validate every field against `now` in timezone `tz`.
    ///
    /// A start moment at or before `now` is pushed forward to the day after
    /// `now`, so generation never offers a slot on the current day through
    /// that path.
    ///
    /// # Errors
    /// Returns [`SlotError::InvalidConstraint`] for an unparsable date, an
    /// unknown weekday name, or (under [`DurationPolicy::Reject`]) an explicit
    /// duration that is not positive.
    pub fn resolve(
        &self,
        now: DateTime<Utc>,
        tz: Tz,
        policy: DurationPolicy,
        default_minutes: i64,
    ) -> Result<ResolvedConstraints> {
        let duration_minutes = match self.duration_minutes {
            None => default_minutes,
            Some(m) if m > 0 => m,
            Some(m) => match policy {
                DurationPolicy::Reject => {
                    return Err(SlotError::InvalidConstraint(format!(
                        "durationMinutes must be positive, got {}",
                        m
                    )))
                }
                DurationPolicy::Substitute => default_minutes,
            },
        };

        let duration = Duration::try_minutes(duration_minutes).ok_or_else(|| {
            SlotError::InvalidConstraint(format!(
                "durationMinutes {} is out of range",
                duration_minutes
            ))
        })?;

        let requested = parse_start_moment(&self.start_date, tz)?;
        let reset = requested <= now;
        let start_date = if reset {
            (now.with_timezone(&tz) + Duration::days(1)).date_naive()
        } else {
            requested.with_timezone(&tz).date_naive()
        };

        let end_date = self
            .end_date
            .as_deref()
            .map(|s| parse_calendar_date(s, tz))
            .transpose()?;

        let excluded_days = self
            .excluded_days
            .iter()
            .map(|name| parse_weekday(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedConstraints {
            duration,
            start_date,
            start_reset: reset,
            end_date,
            window: self.time_of_day.unwrap_or_default().hour_window(),
            excluded_days,
        })
    }
}

/// Constraints after parsing and normalization, ready for generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraints {
    pub duration: Duration,
    /// First calendar day (in the engine timezone) a candidate may use.
    pub start_date: NaiveDate,
    /// Whether the requested start was in the past and got moved to tomorrow.
    pub start_reset: bool,
    pub end_date: Option<NaiveDate>,
    pub window: HourWindow,
    pub excluded_days: Vec<Weekday>,
}

impl ResolvedConstraints {
    pub fn excludes(&self, day: Weekday) -> bool {
        self.excluded_days.contains(&day)
    }
}

/// Parse a start date into the instant it begins.
///
/// A bare `YYYY-MM-DD` means the first instant of that day in `tz` (local
/// midnight, or the end of a DST gap that swallows it); RFC 3339 keeps its
/// own offset; a naive `YYYY-MM-DDTHH:MM:SS` is read as local time in `tz`.
pub fn parse_start_moment(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return start_of_day(date, tz).ok_or_else(|| {
            SlotError::InvalidConstraint(format!("'{}' does not exist in timezone {}", s, tz))
        });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        Ok(naive) => local_to_utc(naive, tz, s),
        Err(e) => Err(SlotError::InvalidConstraint(format!(
            "invalid date '{}': {}",
            s, e
        ))),
    }
}

/// Parse a date field into a calendar day in `tz`.
pub fn parse_calendar_date(s: &str, tz: Tz) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    parse_start_moment(s, tz).map(|moment| moment.with_timezone(&tz).date_naive())
}

/// Parse a weekday name such as `"Friday"` or `"fri"`, ignoring case.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| SlotError::InvalidConstraint(format!("unknown weekday '{}'", name)))
}

/// First existing wall-clock instant of `date` in `tz`, probing forward in
/// quarter hours.
fn start_of_day(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..24 * 4)
        .filter_map(|step| midnight.checked_add_signed(Duration::minutes(15 * step)))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz, original: &str) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            SlotError::InvalidConstraint(format!(
                "'{}' does not exist in timezone {}",
                original, tz
            ))
        })
}
