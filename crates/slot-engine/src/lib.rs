//! # slot-engine
//!
//! Deterministic, explainable meeting-slot search for two-person scheduling.
//!
//! Given structured constraints (duration, start date, time-of-day preference)
//! the engine produces a small best-first batch of weekday candidate slots,
//! each with a score and a human-readable reason. When real free/busy data is
//! available it is preferred, with the generator as the fallback.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use slot_engine::{Constraints, FinderConfig, SlotFinder, TimeOfDay};
//!
//! let finder = SlotFinder::new(FinderConfig::default()).unwrap();
//! let now = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
//! let constraints = Constraints::starting("2026-03-17")
//!     .with_duration(30)
//!     .with_time_of_day(TimeOfDay::Morning);
//!
//! let slots = finder.generate(&constraints, now).unwrap();
//! assert_eq!(slots.len(), 4);
//! assert_eq!(slots[0].score, 10);
//! assert!(slots.iter().all(|s| s.duration_minutes() == 30));
//! ```
//!
//! ## Modules
//!
//! - [`finder`]: constraints → ranked candidate slots
//! - [`constraints`]: input schema, date and duration normalization
//! - [`slot`]: output schema and ranking
//! - [`pipeline`]: real availability first, generator as fallback
//! - [`availability`]: free/busy-backed real availability source
//! - [`freebusy`]: busy interval merging and free window computation
//! - [`collaborators`]: parser, availability and enrichment seams
//! - [`booking`]: event drafts for a chosen slot
//! - [`config`]: TOML configuration
//! - [`error`]: Error types

pub mod availability;
pub mod booking;
pub mod collaborators;
pub mod config;
pub mod constraints;
pub mod error;
pub mod finder;
pub mod freebusy;
pub mod pipeline;
pub mod slot;

pub use availability::FreeBusyAvailability;
pub use collaborators::{
    AvailabilitySource, CalendarSession, ConstraintParser, DetailEnricher, MeetingDetails,
    Participant,
};
pub use config::{EngineConfig, FinderConfig};
pub use constraints::{Constraints, DurationPolicy, TimeOfDay};
pub use error::SlotError;
pub use finder::{CandidateSpread, IndexSpread, SeededSpread, SlotFinder};
pub use pipeline::{Offer, SlotOrigin, SlotPipeline};
pub use slot::{rank_by_score, Slot};
