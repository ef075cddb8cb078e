use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Booking;
use meridian_core::repository::CalendarEvent;

/// A booking's occupied time, reduced to what the detector needs.
#[derive(Debug, Clone)]
pub struct BookingInterval {
    pub booking_id: Uuid,
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&Booking> for BookingInterval {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            label: booking.item.kind().as_str().to_string(),
            start: booking.start,
            end: booking.end,
        }
    }
}

/// An existing calendar commitment, reduced to what the detector needs.
#[derive(Debug, Clone)]
pub struct EventInterval {
    pub event_id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&CalendarEvent> for EventInterval {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            start: event.start,
            end: event.end,
        }
    }
}

/// One overlapping (booking, event) combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictPair {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub message: String,
}

/// Reports every (booking, event) pair whose half-open intervals overlap.
///
/// Overlap is strict: `booking.start < event.end && booking.end > event.start`.
/// Touching endpoints are not a conflict; a flight landing exactly when an
/// event starts does not collide with it.
///
/// All instants must already be normalized to UTC. Comparing a calendar-naive
/// local time against a UTC-stored one here would silently shift conflicts by
/// the zone offset, so callers convert before building the intervals.
///
/// Pairwise O(n*m); bookings per trip and events per user are both small.
pub fn detect_conflicts(
    bookings: &[BookingInterval],
    events: &[EventInterval],
) -> Vec<ConflictPair> {
    let mut conflicts = Vec::new();

    for booking in bookings {
        for event in events {
            let overlapping = booking.start < event.end && booking.end > event.start;
            if overlapping {
                conflicts.push(ConflictPair {
                    booking_id: booking.booking_id,
                    event_id: event.event_id,
                    message: format!(
                        "Booking \"{}\" conflicts with event \"{}\" ({})",
                        booking.label,
                        event.title,
                        event.start.format("%Y-%m-%d")
                    ),
                });
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn booking(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingInterval {
        BookingInterval {
            booking_id: Uuid::new_v4(),
            label: "FLIGHT".to_string(),
            start,
            end,
        }
    }

    fn event(start: DateTime<Utc>, end: DateTime<Utc>) -> EventInterval {
        EventInterval {
            event_id: Uuid::new_v4(),
            title: "Board meeting".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_overlap_detected() {
        // Flight 08:00-11:00 against an event 09:00-10:00 on the same day
        let b = booking(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 11, 0));
        let e = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));

        let conflicts = detect_conflicts(&[b.clone()], &[e.clone()]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].booking_id, b.booking_id);
        assert_eq!(conflicts[0].event_id, e.event_id);
        assert!(conflicts[0].message.contains("Board meeting"));
    }

    #[test]
    fn test_touching_endpoints_are_not_a_conflict() {
        // Flight lands exactly when the event starts
        let b = booking(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 9, 0));
        let e = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));
        assert!(detect_conflicts(&[b], &[e]).is_empty());

        // Event ends exactly when the flight departs
        let b = booking(at(2025, 1, 10, 10, 0), at(2025, 1, 10, 12, 0));
        let e = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));
        assert!(detect_conflicts(&[b], &[e]).is_empty());
    }

    #[test]
    fn test_containment_counts_both_ways() {
        let outer_booking = booking(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 18, 0));
        let inner_event = event(at(2025, 1, 10, 12, 0), at(2025, 1, 10, 13, 0));
        assert_eq!(detect_conflicts(&[outer_booking], &[inner_event]).len(), 1);

        let inner_booking = booking(at(2025, 1, 10, 12, 0), at(2025, 1, 10, 13, 0));
        let outer_event = event(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 18, 0));
        assert_eq!(detect_conflicts(&[inner_booking], &[outer_event]).len(), 1);
    }

    #[test]
    fn test_one_pair_per_overlapping_combination() {
        let b1 = booking(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 11, 0));
        let b2 = booking(at(2025, 1, 10, 9, 30), at(2025, 1, 10, 10, 30));
        let e1 = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));
        let e2 = event(at(2025, 1, 11, 9, 0), at(2025, 1, 11, 10, 0));

        // b1 and b2 both overlap e1; nothing overlaps e2
        let conflicts = detect_conflicts(&[b1, b2], &[e1, e2]);
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn test_zero_duration_placeholder_never_conflicts() {
        // Draft assembly creates [start, start) placeholders for activities
        // with no known duration; under the strict test they overlap nothing.
        let b = booking(at(2025, 1, 10, 9, 30), at(2025, 1, 10, 9, 30));
        let e = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));
        assert!(detect_conflicts(&[b], &[e]).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let b = booking(at(2025, 1, 10, 8, 0), at(2025, 1, 10, 11, 0));
        let e = event(at(2025, 1, 10, 9, 0), at(2025, 1, 10, 10, 0));
        assert!(detect_conflicts(&[], &[e]).is_empty());
        assert!(detect_conflicts(&[b], &[]).is_empty());
    }
}
