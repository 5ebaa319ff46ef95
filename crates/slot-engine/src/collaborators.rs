//! Seams for the systems around the engine.
//!
//! Constraint parsing, real free/busy lookups and detail enrichment live
//! outside this crate. They plug in through the traits here, and each has a
//! documented fallback so a failing collaborator never blocks scheduling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constraints::Constraints;
use crate::error::{Result, SlotError};
use crate::slot::Slot;

/// Someone taking part in a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl Participant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }
}

/// An organizer's connection to their calendar provider.
///
/// Created closed. The caller opens it with an access token once sign-in
/// completes and closes it on sign-out; lookups made through a closed session
/// fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSession {
    account: Participant,
    access_token: Option<String>,
}

impl CalendarSession {
    pub fn new(account: Participant) -> Self {
        Self {
            account,
            access_token: None,
        }
    }

    pub fn open(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    pub fn close(&mut self) {
        self.access_token = None;
    }

    pub fn is_open(&self) -> bool {
        self.access_token.is_some()
    }

    /// The signed-in organizer.
    pub fn account(&self) -> &Participant {
        &self.account
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Fail with [`SlotError::Provider`] unless the session is open.
    pub fn require_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SlotError::Provider(format!(
                "calendar session for {} is not open",
                self.account.email
            )))
        }
    }
}

/// Turns a free-text request into constraints.
pub trait ConstraintParser: Send + Sync {
    /// `reference` is the moment relative phrases ("tomorrow", "next week")
    /// are resolved against.
    fn parse(&self, text: &str, reference: DateTime<Utc>) -> Result<Constraints>;
}

/// Parse `text`, substituting [`Constraints::fallback`] if the parser fails.
///
/// The original text is kept as the constraints' `context` either way.
pub fn parse_or_default<P: ConstraintParser + ?Sized>(
    parser: &P,
    text: &str,
    reference: DateTime<Utc>,
) -> Constraints {
    let mut constraints = match parser.parse(text, reference) {
        Ok(constraints) => constraints,
        Err(e) => {
            warn!(error = %e, "constraint parsing failed, using defaults");
            Constraints::fallback(reference)
        }
    };
    if constraints.context.is_none() {
        constraints.context = Some(text.to_string());
    }
    constraints
}

/// Reads the structured JSON a language model returns for a request.
///
/// Accepts the bare object or one wrapped in a Markdown code fence.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConstraintParser;

impl ConstraintParser for JsonConstraintParser {
    fn parse(&self, text: &str, _reference: DateTime<Utc>) -> Result<Constraints> {
        let body = strip_code_fence(text.trim());
        if body.is_empty() {
            return Err(SlotError::Parse("empty response".to_string()));
        }
        serde_json::from_str(body).map_err(|e| SlotError::Parse(e.to_string()))
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Supplies real free/busy-backed slots for an organizer and an attendee.
pub trait AvailabilitySource: Send + Sync {
    /// Slots both people are free for. The organizer is the session's account.
    ///
    /// An empty result means nothing suitable was found.
    fn find_slots(
        &self,
        session: &CalendarSession,
        attendee: &Participant,
        constraints: &Constraints,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>>;
}

/// Human-facing description of a booked meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub title: String,
    pub description: String,
    pub location: String,
}

impl MeetingDetails {
    pub fn fallback(organizer: &Participant, attendee: &Participant) -> Self {
        Self {
            title: format!("Meeting: {} & {}", organizer.name, attendee.name),
            description: "Discussing project items.".to_string(),
            location: "Google Meet".to_string(),
        }
    }
}

/// Writes the title, description and location for a chosen slot.
pub trait DetailEnricher: Send + Sync {
    fn enrich(
        &self,
        organizer: &Participant,
        attendee: &Participant,
        slot: &Slot,
        context: &str,
    ) -> Result<MeetingDetails>;
}

/// Enrich a slot, substituting [`MeetingDetails::fallback`] on failure.
pub fn enrich_or_fallback<E: DetailEnricher + ?Sized>(
    enricher: &E,
    organizer: &Participant,
    attendee: &Participant,
    slot: &Slot,
    context: &str,
) -> MeetingDetails {
    enricher
        .enrich(organizer, attendee, slot, context)
        .unwrap_or_else(|e| {
            warn!(error = %e, slot = %slot.id, "detail enrichment failed, using defaults");
            MeetingDetails::fallback(organizer, attendee)
        })
}
