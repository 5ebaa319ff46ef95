//! Tests for the free/busy-backed real availability source.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use slot_engine::config::{AvailabilityConfig, FinderConfig};
use slot_engine::freebusy::BusyInterval;
use slot_engine::{
    AvailabilitySource, CalendarSession, Constraints, FreeBusyAvailability, Participant,
    SlotError, SlotFinder, TimeOfDay,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

const ORGANIZER: &str = "alex@example.com";
const ATTENDEE: &str = "jason@example.com";

/// Monday 2026-03-16, 08:00 UTC.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap()
}

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

fn busy(day: u32, sh: u32, sm: u32, eh: u32, em: u32) -> BusyInterval {
    BusyInterval::new(at(day, sh, sm), at(day, eh, em))
}

fn organizer() -> Participant {
    Participant::new("u1", "Alex", ORGANIZER, "Project Manager")
}

fn attendee() -> Participant {
    Participant::new("u2", "Jason", ATTENDEE, "Sales Lead")
}

fn open_session() -> CalendarSession {
    let mut session = CalendarSession::new(organizer());
    session.open("token");
    session
}

fn source(
    organizer_busy: Vec<BusyInterval>,
    attendee_busy: Vec<BusyInterval>,
) -> FreeBusyAvailability {
    let finder = SlotFinder::new(FinderConfig::default()).unwrap();
    FreeBusyAvailability::new(finder, AvailabilityConfig::default())
        .unwrap()
        .with_calendar(ORGANIZER, organizer_busy)
        .with_calendar(ATTENDEE, attendee_busy)
}

fn starts(slots: &[slot_engine::Slot]) -> Vec<DateTime<Utc>> {
    slots.iter().map(|s| s.start).collect()
}

// ── Lookups ─────────────────────────────────────────────────────────────────

#[test]
fn clear_calendars_offer_the_start_of_each_working_day() {
    let slots = source(vec![], vec![])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(
        starts(&slots),
        vec![at(17, 9, 0), at(18, 9, 0), at(19, 9, 0), at(20, 9, 0)]
    );
    let scores: Vec<i64> = slots.iter().map(|s| s.score).collect();
    assert_eq!(scores, [10, 9, 8, 7]);
    assert!(slots.iter().all(|s| s.duration_minutes() == 60));
}

#[test]
fn both_calendars_are_respected() {
    // Organizer busy 09:00-11:00, attendee busy 11:30-13:00 on Tuesday.
    // The 11:00-11:30 gap is too short for an hour, so Tuesday opens at 13:00.
    let slots = source(vec![busy(17, 9, 0, 11, 0)], vec![busy(17, 11, 30, 13, 0)])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(
        starts(&slots),
        vec![at(17, 13, 0), at(18, 9, 0), at(19, 9, 0), at(20, 9, 0)]
    );
}

#[test]
fn short_meeting_fits_a_short_gap() {
    let constraints = Constraints::starting("2026-03-17").with_duration(30);

    let slots = source(vec![busy(17, 9, 0, 11, 0)], vec![busy(17, 11, 30, 13, 0)])
        .find_slots(&open_session(), &attendee(), &constraints, now())
        .unwrap();

    assert_eq!(slots[0].start, at(17, 11, 0));
    assert_eq!(slots[0].end, at(17, 11, 30));
    assert_eq!(slots[1].start, at(17, 13, 0));
}

#[test]
fn starts_are_rounded_up_to_the_hour() {
    let slots = source(vec![busy(17, 0, 0, 10, 20)], vec![])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(slots[0].start, at(17, 11, 0));
}

#[test]
fn afternoon_preference_limits_start_hours() {
    let constraints = Constraints::starting("2026-03-17").with_time_of_day(TimeOfDay::Afternoon);

    let slots = source(vec![], vec![])
        .find_slots(&open_session(), &attendee(), &constraints, now())
        .unwrap();

    assert!(!slots.is_empty());
    assert!(slots.iter().all(|s| (13..=16).contains(&s.start.hour())));
    assert_eq!(slots[0].start, at(17, 13, 0));
}

#[test]
fn weekends_are_skipped() {
    // Friday start with a five-day lookahead reaches into the next week.
    let slots = source(vec![], vec![])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-20"), now())
        .unwrap();

    assert_eq!(starts(&slots), vec![at(20, 9, 0), at(23, 9, 0), at(24, 9, 0)]);
}

#[test]
fn past_start_searches_from_now() {
    let slots = source(vec![], vec![])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-06"), now())
        .unwrap();

    assert_eq!(slots[0].start, at(16, 9, 0));
    assert!(slots.iter().all(|s| s.start > now()));
}

#[test]
fn fully_booked_calendars_find_nothing() {
    let all_week: Vec<BusyInterval> = (17..=21).map(|d| busy(d, 0, 0, 23, 59)).collect();

    let slots = source(all_week, vec![])
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert!(slots.is_empty());
}

#[test]
fn add_busy_extends_a_calendar() {
    let mut source = source(vec![], vec![]);
    source.add_busy(ATTENDEE, busy(17, 9, 0, 12, 0));

    let slots = source
        .find_slots(&open_session(), &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap();

    assert_eq!(slots[0].start, at(17, 12, 0));
}

// ── Failures ────────────────────────────────────────────────────────────────

#[test]
fn closed_session_is_a_provider_error() {
    let mut session = open_session();
    session.close();

    let err = source(vec![], vec![])
        .find_slots(&session, &attendee(), &Constraints::starting("2026-03-17"), now())
        .unwrap_err();

    assert!(matches!(err, SlotError::Provider(_)), "got {:?}", err);
}

#[test]
fn unknown_attendee_is_a_provider_error() {
    let stranger = Participant::new("u9", "Pat", "pat@example.com", "");

    let err = source(vec![], vec![])
        .find_slots(&open_session(), &stranger, &Constraints::starting("2026-03-17"), now())
        .unwrap_err();

    assert!(matches!(err, SlotError::Provider(_)));
}

#[test]
fn lookahead_past_the_last_representable_date_is_invalid() {
    let constraints = Constraints::starting("+262142-12-30");

    let err = source(vec![], vec![])
        .find_slots(&open_session(), &attendee(), &constraints, now())
        .unwrap_err();

    assert!(matches!(err, SlotError::InvalidConstraint(_)), "got {:?}", err);
}

#[test]
fn invalid_workday_hours_are_rejected() {
    let finder = SlotFinder::new(FinderConfig::default()).unwrap();
    let config = AvailabilityConfig {
        workday_start_hour: 17,
        workday_end_hour: 9,
        ..AvailabilityConfig::default()
    };
    assert!(FreeBusyAvailability::new(finder, config).is_err());
}
