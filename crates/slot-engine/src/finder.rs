//! Constraint-driven slot generation.
//!
//! [`SlotFinder::generate`] turns [`Constraints`] into a small batch of
//! plausible, explainable candidate slots, ordered best-first. It is not an
//! availability intersection: it offers diverse weekday candidates that honor
//! the duration, start date and time-of-day preference.
//!
//! Per candidate index `i`:
//!
//! 1. Advance from the effective start date by `i` days, plus one more day
//!    when the spread says so.
//! 2. Pick a wall-clock hour inside the time-of-day window, minutes zeroed.
//! 3. Move Saturday forward two days and Sunday forward one.
//! 4. Set `end = start + duration`.
//! 5. Take the reason at `i mod reasons.len()` and score `base_score - i`.
//!
//! Where each choice comes from is a [`CandidateSpread`]. [`IndexSpread`]
//! derives everything from `i` and is the default; [`SeededSpread`] draws from
//! a seeded ChaCha stream for the reference distribution with reproducible
//! output.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::{ConfigError, FinderConfig, MAX_SLOT_COUNT, MIN_SLOT_COUNT};
use crate::constraints::{Constraints, HourWindow, ResolvedConstraints};
use crate::error::{Result, SlotError};
use crate::slot::Slot;

/// Source of the per-candidate choices made during generation.
pub trait CandidateSpread {
    /// Number of candidates in the batch. Clamped to `3..=5` by the finder.
    fn slot_count(&mut self) -> usize;

    /// Whether candidate `index` skips one extra day past its base offset.
    fn extra_day(&mut self, index: usize) -> bool;

    /// Start hour for candidate `index`. Clamped into `window` by the finder.
    fn hour(&mut self, index: usize, window: HourWindow) -> u32;
}

/// Deterministic spread derived from the candidate index.
///
/// Odd indices take the extra day and hours cycle through the window, so the
/// same constraints and `now` always give the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpread {
    count: usize,
}

impl IndexSpread {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl CandidateSpread for IndexSpread {
    fn slot_count(&mut self) -> usize {
        self.count
    }

    fn extra_day(&mut self, index: usize) -> bool {
        index % 2 == 1
    }

    fn hour(&mut self, index: usize, window: HourWindow) -> u32 {
        window.first + (index as u32 % window.span())
    }
}

/// Seeded pseudo-random spread: 3 to 5 candidates, a coin flip for the extra
/// day and a uniform hour in the window.
#[derive(Debug, Clone)]
pub struct SeededSpread {
    rng: ChaCha8Rng,
}

impl SeededSpread {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl CandidateSpread for SeededSpread {
    fn slot_count(&mut self) -> usize {
        self.rng.random_range(MIN_SLOT_COUNT..=MAX_SLOT_COUNT)
    }

    fn extra_day(&mut self, _index: usize) -> bool {
        self.rng.random_bool(0.5)
    }

    fn hour(&mut self, _index: usize, window: HourWindow) -> u32 {
        self.rng.random_range(window.first..=window.last)
    }
}

/// Generates ranked candidate slots from constraints.
///
/// Holds only immutable configuration; `generate` allocates a fresh batch on
/// every call and can be shared across threads.
#[derive(Debug, Clone)]
pub struct SlotFinder {
    config: FinderConfig,
    tz: Tz,
}

impl SlotFinder {
    /// Build a finder from validated configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for an out-of-range slot count, an
    /// empty reason list, a non-positive default duration or an unknown
    /// timezone.
    pub fn new(config: FinderConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self { config, tz })
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The justification used for candidate `index`.
    pub fn reason_for(&self, index: usize) -> &str {
        &self.config.reasons[index % self.config.reasons.len()]
    }

    /// The score given to candidate `index`.
    pub fn score_for(&self, index: usize) -> i64 {
        self.config.base_score - index as i64
    }

    /// Generate a batch with the configured spread: seeded when
    /// `FinderConfig::seed` is set, index-derived otherwise.
    ///
    /// # Errors
    /// Returns [`SlotError::InvalidConstraint`] for malformed constraints and,
    /// with bound enforcement on, [`SlotError::Exhausted`] when fewer than three
    /// candidates fall on or before `endDate`.
    pub fn generate(&self, constraints: &Constraints, now: DateTime<Utc>) -> Result<Vec<Slot>> {
        match self.config.seed {
            Some(seed) => self.generate_with(constraints, now, &mut SeededSpread::new(seed)),
            None => self.generate_with(
                constraints,
                now,
                &mut IndexSpread::new(self.config.slot_count),
            ),
        }
    }

    /// Generate a batch using an explicit spread.
    pub fn generate_with<S: CandidateSpread + ?Sized>(
        &self,
        constraints: &Constraints,
        now: DateTime<Utc>,
        spread: &mut S,
    ) -> Result<Vec<Slot>> {
        let resolved = constraints.resolve(
            now,
            self.tz,
            self.config.duration_policy,
            self.config.default_duration_minutes,
        )?;
        if self.config.enforce_bounds {
            check_bounds(&resolved)?;
        }

        let count = spread.slot_count().clamp(MIN_SLOT_COUNT, MAX_SLOT_COUNT);
        let mut slots: Vec<Slot> = Vec::with_capacity(count);

        for index in 0..count {
            let extra = spread.extra_day(index);
            let offset = index as u64 + u64::from(extra);
            let hour = spread
                .hour(index, resolved.window)
                .clamp(resolved.window.first, resolved.window.last);

            let mut date = self.correct_day(advance(resolved.start_date, offset)?, &resolved)?;
            let mut start = self.at_hour(date, hour)?;
            // Never offer the past, and never the same instant twice in a batch.
            while start <= now || slots.iter().any(|s| s.start == start) {
                date = self.correct_day(advance(date, 1)?, &resolved)?;
                start = self.at_hour(date, hour)?;
            }

            if self.config.enforce_bounds && resolved.end_date.is_some_and(|end| date > end) {
                debug!(index, %date, "candidate past end date dropped");
                continue;
            }

            let end = start.checked_add_signed(resolved.duration).ok_or_else(|| {
                SlotError::InvalidConstraint(format!(
                    "a {}-minute meeting starting {} ends out of range",
                    resolved.duration.num_minutes(),
                    start
                ))
            })?;

            debug!(index, %date, hour, extra, "candidate generated");
            slots.push(Slot {
                id: format!("slot-{}", index),
                start,
                end,
                reason: self.reason_for(index).to_string(),
                score: self.score_for(index),
            });
        }

        if let (true, Some(end_date)) = (self.config.enforce_bounds, resolved.end_date) {
            if slots.len() < MIN_SLOT_COUNT {
                return Err(SlotError::Exhausted { end_date });
            }
        }

        info!(
            count = slots.len(),
            start_date = %resolved.start_date,
            start_reset = resolved.start_reset,
            duration_minutes = resolved.duration.num_minutes(),
            "generated slot batch"
        );
        Ok(slots)
    }

    /// Move `date` off weekends (and, when enforcing bounds, excluded days).
    fn correct_day(&self, mut date: NaiveDate, resolved: &ResolvedConstraints) -> Result<NaiveDate> {
        loop {
            let weekday = date.weekday();
            let skip = match weekday {
                Weekday::Sat => 2,
                Weekday::Sun => 1,
                day if self.config.enforce_bounds && resolved.excludes(day) => 1,
                _ => return Ok(date),
            };
            date = advance(date, skip)?;
        }
    }

    /// The instant `hour:00` falls on `date` in the finder's timezone.
    ///
    /// A wall-clock time skipped by a DST transition shifts forward an hour.
    fn at_hour(&self, date: NaiveDate, hour: u32) -> Result<DateTime<Utc>> {
        let naive = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| SlotError::InvalidConstraint(format!("invalid hour {}", hour)))?;
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                let shifted = naive.checked_add_signed(Duration::hours(1))?;
                self.tz.from_local_datetime(&shifted).earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                SlotError::InvalidConstraint(format!("{} does not exist in {}", naive, self.tz))
            })
    }
}

fn check_bounds(resolved: &ResolvedConstraints) -> Result<()> {
    let workdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];
    if workdays.iter().all(|day| resolved.excludes(*day)) {
        return Err(SlotError::InvalidConstraint(
            "excludedDays rules out every weekday".to_string(),
        ));
    }
    if let Some(end) = resolved.end_date {
        if end < resolved.start_date {
            return Err(SlotError::InvalidConstraint(format!(
                "endDate {} is before the search start {}",
                end, resolved.start_date
            )));
        }
    }
    Ok(())
}

fn advance(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| SlotError::InvalidConstraint(format!("date {} is out of range", date)))
}
