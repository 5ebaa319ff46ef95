//! Tests for the real-first, generator-fallback slot pipeline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use slot_engine::config::{AvailabilityConfig, FinderConfig};
use slot_engine::error::Result;
use slot_engine::{
    AvailabilitySource, CalendarSession, Constraints, FreeBusyAvailability, Participant, Slot,
    SlotError, SlotFinder, SlotOrigin, SlotPipeline,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap()
}

fn session() -> CalendarSession {
    let mut session = CalendarSession::new(Participant::new(
        "u1",
        "Alex",
        "alex@example.com",
        "Project Manager",
    ));
    session.open("token");
    session
}

fn attendee() -> Participant {
    Participant::new("u2", "Jason", "jason@example.com", "Sales Lead")
}

fn finder() -> SlotFinder {
    SlotFinder::new(FinderConfig::default()).unwrap()
}

fn real_slot(id: &str, day: u32) -> Slot {
    let start = Utc.with_ymd_and_hms(2026, 3, day, 14, 0, 0).unwrap();
    Slot {
        id: id.to_string(),
        start,
        end: start + Duration::minutes(60),
        reason: "Both calendars clear.".to_string(),
        score: 10,
    }
}

/// A source that always answers with a fixed result.
struct Canned(std::result::Result<Vec<Slot>, String>);

impl AvailabilitySource for Canned {
    fn find_slots(
        &self,
        _session: &CalendarSession,
        _attendee: &Participant,
        _constraints: &Constraints,
        _now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        self.0.clone().map_err(SlotError::Provider)
    }
}

// ── Composition ─────────────────────────────────────────────────────────────

#[test]
fn non_empty_real_result_replaces_generated_slots() {
    let real = vec![real_slot("real-a", 18), real_slot("real-b", 19)];
    let pipeline = SlotPipeline::new(finder()).with_real_source(Canned(Ok(real.clone())));

    let offer = pipeline
        .offer(&session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Real);
    assert_eq!(offer.slots, real);
}

#[test]
fn empty_real_result_falls_back_to_generator() {
    let constraints = Constraints::starting("2026-03-17");
    let pipeline = SlotPipeline::new(finder()).with_real_source(Canned(Ok(vec![])));

    let offer = pipeline
        .offer(&session(), &attendee(), &constraints, now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Generated);
    assert_eq!(offer.slots, finder().generate(&constraints, now()).unwrap());
}

#[test]
fn failing_real_source_falls_back_to_generator() {
    let constraints = Constraints::starting("2026-03-17");
    let pipeline =
        SlotPipeline::new(finder()).with_real_source(Canned(Err("quota exceeded".to_string())));

    let offer = pipeline
        .offer(&session(), &attendee(), &constraints, now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Generated);
    assert_eq!(offer.slots, finder().generate(&constraints, now()).unwrap());
}

#[test]
fn pipeline_without_real_source_generates() {
    let pipeline = SlotPipeline::new(finder());
    assert!(!pipeline.has_real_source());

    let offer = pipeline
        .offer(&session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Generated);
    assert_eq!(offer.slots.len(), 4);
}

#[test]
fn closed_session_falls_back_to_generator() {
    let source = FreeBusyAvailability::new(finder(), AvailabilityConfig::default())
        .unwrap()
        .with_calendar("alex@example.com", vec![])
        .with_calendar("jason@example.com", vec![]);
    let pipeline = SlotPipeline::new(finder()).with_real_source(source);
    let mut session = session();
    session.close();

    let offer = pipeline
        .offer(&session, &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Generated);
}

#[test]
fn free_busy_source_wins_when_it_finds_time() {
    let source = FreeBusyAvailability::new(finder(), AvailabilityConfig::default())
        .unwrap()
        .with_calendar("alex@example.com", vec![])
        .with_calendar("jason@example.com", vec![]);
    let pipeline = SlotPipeline::new(finder()).with_real_source(source);

    let offer = pipeline
        .offer(&session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(offer.origin, SlotOrigin::Real);
    assert_eq!(
        offer.slots[1].start,
        Utc.with_ymd_and_hms(2026, 3, 18, 9, 0, 0).unwrap()
    );
}

#[test]
fn invalid_constraints_surface_after_fallback() {
    let pipeline = SlotPipeline::new(finder()).with_real_source(Canned(Ok(vec![])));
    let constraints = Constraints::starting("2026-03-17").with_duration(0);

    let err = pipeline
        .offer(&session(), &attendee(), &constraints, now())
        .unwrap_err();

    assert!(matches!(err, SlotError::InvalidConstraint(_)));
}

#[test]
fn offer_serializes_origin_in_lowercase() {
    let offer = SlotPipeline::new(finder())
        .offer(&session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    let json = serde_json::to_value(&offer).unwrap();

    assert_eq!(json["origin"], "generated");
    assert_eq!(json["slots"].as_array().map(Vec::len), Some(4));
}
