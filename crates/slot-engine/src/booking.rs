//! Provider-neutral event drafts for a chosen slot.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::collaborators::{MeetingDetails, Participant};
use crate::slot::Slot;

/// Minutes before the meeting that the email reminder goes out.
pub const EMAIL_REMINDER_MINUTES: u32 = 24 * 60;
/// Minutes before the meeting that the popup reminder fires.
pub const POPUP_REMINDER_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: ReminderMethod,
    pub minutes: u32,
}

/// An instant plus the zone it should be displayed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: DateTime<Utc>,
    pub time_zone: String,
}

/// Everything needed to create the calendar event for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Attendee emails, in invitation order.
    pub attendees: Vec<String>,
    pub reminders: Vec<Reminder>,
}

impl EventDraft {
    pub fn new(slot: &Slot, details: &MeetingDetails, attendees: &[Participant], tz: Tz) -> Self {
        let time = |date_time| EventTime {
            date_time,
            time_zone: tz.name().to_string(),
        };
        Self {
            summary: details.title.clone(),
            location: details.location.clone(),
            description: details.description.clone(),
            start: time(slot.start),
            end: time(slot.end),
            attendees: attendees.iter().map(|p| p.email.clone()).collect(),
            reminders: vec![
                Reminder {
                    method: ReminderMethod::Email,
                    minutes: EMAIL_REMINDER_MINUTES,
                },
                Reminder {
                    method: ReminderMethod::Popup,
                    minutes: POPUP_REMINDER_MINUTES,
                },
            ],
        }
    }
}
