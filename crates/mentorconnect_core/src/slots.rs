//! crates/mentorconnect_core/src/slots.rs
//!
//! Hourly booking slots and the availability check.
//!
//! Every session is exactly one hour long and starts on the hour, so two
//! sessions conflict iff they share mentor, date and start time.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use uuid::Uuid;

use crate::domain::Session;
use crate::ports::{PortError, PortResult};

/// Hour of the first bookable slot.
pub const OPENING_HOUR: u32 = 9;
/// Every slot ends by this hour, so the last one starts an hour earlier.
pub const CLOSING_HOUR: u32 = 20;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub available: bool,
}

fn on_the_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// The fixed candidate windows, 09:00-10:00 through 19:00-20:00.
pub fn candidate_slots() -> Vec<(NaiveTime, NaiveTime)> {
    (OPENING_HOUR..CLOSING_HOUR)
        .map(|hour| (on_the_hour(hour), on_the_hour(hour + 1)))
        .collect()
}

/// Start times held by the mentor's pending or confirmed sessions on `date`.
pub fn occupied_start_times(
    sessions: &[Session],
    mentor_id: Uuid,
    date: NaiveDate,
) -> BTreeSet<NaiveTime> {
    sessions
        .iter()
        .filter(|s| s.mentor_id == mentor_id && s.date == date && s.status.is_active())
        .map(|s| s.start_time)
        .collect()
}

/// A slot is in the past if its date is before today, or it is today and its
/// hour is not strictly after the current hour.
pub fn is_past(date: NaiveDate, start: NaiveTime, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    date < today || (date == today && start.hour() <= now.hour())
}

pub fn is_slot_open(
    date: NaiveDate,
    start: NaiveTime,
    occupied: &BTreeSet<NaiveTime>,
    now: DateTime<Utc>,
) -> bool {
    !occupied.contains(&start) && !is_past(date, start, now)
}

pub fn availability(
    date: NaiveDate,
    occupied: &BTreeSet<NaiveTime>,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    candidate_slots()
        .into_iter()
        .map(|(start, end)| Slot {
            start,
            end,
            available: is_slot_open(date, start, occupied, now),
        })
        .collect()
}

//=========================================================================================
// Parsing & validation
//=========================================================================================

pub fn parse_date(raw: &str) -> PortResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| PortError::Validation(format!("'{raw}' is not a YYYY-MM-DD date")))
}

pub fn parse_time(raw: &str) -> PortResult<NaiveTime> {
    let raw = raw.trim();
    // chrono accepts single-digit hours; the wire format does not.
    if raw.len() != 5 {
        return Err(PortError::Validation(format!("'{raw}' is not an HH:MM time")));
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| PortError::Validation(format!("'{raw}' is not an HH:MM time")))
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Checks that `start..end` is one of the candidate windows.
pub fn validate_window(start: NaiveTime, end: NaiveTime) -> PortResult<()> {
    if start.minute() != 0 || start.second() != 0 {
        return Err(PortError::Validation(
            "Sessions must start on the hour".to_string(),
        ));
    }
    if start.hour() < OPENING_HOUR || start.hour() >= CLOSING_HOUR {
        return Err(PortError::Validation(format!(
            "Sessions must start between {OPENING_HOUR:02}:00 and {:02}:00",
            CLOSING_HOUR - 1
        )));
    }
    if end.signed_duration_since(start) != Duration::hours(1) {
        return Err(PortError::Validation(
            "Sessions must last exactly one hour".to_string(),
        ));
    }
    Ok(())
}
