//! Real-first slot lookup with the generator as safety net.
//!
//! A search asks the real-availability source first. A non-empty answer is
//! offered as-is; an empty answer, an error, or no configured source at all
//! falls through to [`SlotFinder`]. The two are never blended.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{AvailabilitySource, CalendarSession, Participant};
use crate::constraints::Constraints;
use crate::error::Result;
use crate::finder::SlotFinder;
use crate::slot::Slot;

/// Where an offered batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotOrigin {
    /// Real free/busy data.
    Real,
    /// The constraint-driven generator.
    Generated,
}

impl fmt::Display for SlotOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotOrigin::Real => write!(f, "real"),
            SlotOrigin::Generated => write!(f, "generated"),
        }
    }
}

/// One batch of slots offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub origin: SlotOrigin,
    pub slots: Vec<Slot>,
}

/// Composes an optional real-availability source with the generator.
pub struct SlotPipeline {
    real: Option<Box<dyn AvailabilitySource>>,
    finder: SlotFinder,
}

impl SlotPipeline {
    /// A pipeline that only generates.
    pub fn new(finder: SlotFinder) -> Self {
        Self { real: None, finder }
    }

    pub fn with_real_source(mut self, source: impl AvailabilitySource + 'static) -> Self {
        self.real = Some(Box::new(source));
        self
    }

    pub fn finder(&self) -> &SlotFinder {
        &self.finder
    }

    pub fn has_real_source(&self) -> bool {
        self.real.is_some()
    }

    /// Offer slots for a meeting between the session's organizer and `attendee`.
    ///
    /// # Errors
    /// Only generator errors surface; a failing real source is logged and
    /// bypassed.
    pub fn offer(
        &self,
        session: &CalendarSession,
        attendee: &Participant,
        constraints: &Constraints,
        now: DateTime<Utc>,
    ) -> Result<Offer> {
        if let Some(real) = &self.real {
            match real.find_slots(session, attendee, constraints, now) {
                Ok(slots) if !slots.is_empty() => {
                    info!(count = slots.len(), origin = %SlotOrigin::Real, "offering slots");
                    return Ok(Offer {
                        origin: SlotOrigin::Real,
                        slots,
                    });
                }
                Ok(_) => info!("real availability found nothing, generating candidates"),
                Err(e) => warn!(error = %e, "real availability failed, generating candidates"),
            }
        }

        let slots = self.finder.generate(constraints, now)?;
        info!(count = slots.len(), origin = %SlotOrigin::Generated, "offering slots");
        Ok(Offer {
            origin: SlotOrigin::Generated,
            slots,
        })
    }
}
