//! Real availability from participants' busy calendars.
//!
//! [`FreeBusyAvailability`] holds busy intervals per participant email. A
//! lookup merges the organizer's and attendee's busy time over a lookahead
//! window, then carves hour-aligned meeting slots out of the shared free time
//! that falls on weekdays inside working hours and the requested time of day.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

use crate::collaborators::{AvailabilitySource, CalendarSession, Participant};
use crate::config::{AvailabilityConfig, ConfigError};
use crate::constraints::{parse_start_moment, Constraints, ResolvedConstraints};
use crate::error::{Result, SlotError};
use crate::finder::SlotFinder;
use crate::freebusy::{self, BusyInterval, FreeWindow};
use crate::slot::Slot;

/// An in-memory free/busy source keyed by participant email.
#[derive(Debug, Clone)]
pub struct FreeBusyAvailability {
    calendars: HashMap<String, Vec<BusyInterval>>,
    finder: SlotFinder,
    config: AvailabilityConfig,
}

impl FreeBusyAvailability {
    /// Slots are scored, explained and limited the same way `finder` does it.
    pub fn new(
        finder: SlotFinder,
        config: AvailabilityConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calendars: HashMap::new(),
            finder,
            config,
        })
    }

    /// Register (or replace) the busy intervals for `email`.
    pub fn with_calendar(mut self, email: impl Into<String>, busy: Vec<BusyInterval>) -> Self {
        self.calendars.insert(email.into(), busy);
        self
    }

    pub fn add_busy(&mut self, email: &str, interval: BusyInterval) {
        self.calendars
            .entry(email.to_string())
            .or_default()
            .push(interval);
    }

    fn calendar(&self, email: &str) -> Result<&[BusyInterval]> {
        self.calendars
            .get(email)
            .map(Vec::as_slice)
            .ok_or_else(|| SlotError::Provider(format!("no free/busy data for {}", email)))
    }

    /// Earliest hour-aligned slot inside `free` on one working day that fits
    /// the duration and the time-of-day window.
    fn carve(
        &self,
        free: &FreeWindow,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
        resolved: &ResolvedConstraints,
        now: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tz = self.finder.tz();
        let lower = free.start.max(day_start).max(now);
        let upper = free.end.min(day_end);
        let start = ceil_to_hour(lower, tz)?;
        let end = start.checked_add_signed(resolved.duration)?;
        let local_hour = start.with_timezone(&tz).hour();
        let fits = start > now && end <= upper;
        (fits && resolved.window.contains(local_hour)).then_some((start, end))
    }

    fn is_working_day(&self, date: NaiveDate, resolved: &ResolvedConstraints) -> bool {
        let enforce = self.finder.config().enforce_bounds;
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => false,
            day if enforce && resolved.excludes(day) => false,
            _ => !(enforce && resolved.end_date.is_some_and(|end| date > end)),
        }
    }
}

impl AvailabilitySource for FreeBusyAvailability {
    fn find_slots(
        &self,
        session: &CalendarSession,
        attendee: &Participant,
        constraints: &Constraints,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        session.require_open()?;
        let tz = self.finder.tz();
        let finder_config = self.finder.config();
        let resolved = constraints.resolve(
            now,
            tz,
            finder_config.duration_policy,
            finder_config.default_duration_minutes,
        )?;

        let mut busy = self.calendar(&session.account().email)?.to_vec();
        busy.extend_from_slice(self.calendar(&attendee.email)?);

        // Search from the requested start, but never before now.
        let window_start = parse_start_moment(&constraints.start_date, tz)?.max(now);
        let window_end = window_start
            .checked_add_signed(Duration::days(i64::from(self.config.lookahead_days)))
            .ok_or_else(|| {
                SlotError::InvalidConstraint(format!(
                    "lookahead from {} is out of range",
                    window_start
                ))
            })?;
        let free = freebusy::free_windows(&busy, window_start, window_end);

        let mut slots = Vec::new();
        let mut date = window_start.with_timezone(&tz).date_naive();
        let last_date = window_end.with_timezone(&tz).date_naive();

        'days: while date <= last_date && slots.len() < finder_config.slot_count {
            if self.is_working_day(date, &resolved) {
                let first_hour = self.config.workday_start_hour.max(resolved.window.first);
                let (Some(day_start), Some(day_end)) = (
                    local_hour(date, first_hour, tz),
                    local_hour(date, self.config.workday_end_hour, tz),
                ) else {
                    date = next_day(date)?;
                    continue;
                };
                for window in free.iter().filter(|f| f.start < day_end && f.end > day_start) {
                    if let Some((start, end)) =
                        self.carve(window, day_start, day_end, &resolved, now)
                    {
                        let index = slots.len();
                        slots.push(Slot {
                            id: format!("slot-{}", index),
                            start,
                            end,
                            reason: self.finder.reason_for(index).to_string(),
                            score: self.finder.score_for(index),
                        });
                        if slots.len() == finder_config.slot_count {
                            break 'days;
                        }
                    }
                }
            }
            date = next_day(date)?;
        }

        debug!(
            organizer = %session.account().email,
            attendee = %attendee.email,
            busy_intervals = busy.len(),
            free_windows = free.len(),
            found = slots.len(),
            "free/busy lookup finished"
        );
        Ok(slots)
    }
}

/// `hour:00` on `date` in `tz`; hour 24 is midnight of the next day.
fn local_hour(date: NaiveDate, hour: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let (date, hour) = if hour >= 24 {
        (date.checked_add_days(Days::new(1))?, 0)
    } else {
        (date, hour)
    };
    tz.from_local_datetime(&date.and_hms_opt(hour, 0, 0)?)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Round `t` up to the next whole wall-clock hour in `tz`.
fn ceil_to_hour(t: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let local = t.with_timezone(&tz).naive_local();
    let floor = local.date().and_hms_opt(local.hour(), 0, 0)?;
    let target = if floor < local {
        floor.checked_add_signed(Duration::hours(1))?
    } else {
        floor
    };
    tz.from_local_datetime(&target)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| SlotError::InvalidConstraint(format!("date {} is out of range", date)))
}
