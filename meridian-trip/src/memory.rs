use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{Booking, BookingKind, BookingStatus, Trip, TripStatus};
use crate::repository::{CheckoutCommit, TripStore};
use meridian_core::payment::PaymentMethod;
use meridian_core::repository::{CalendarEvent, CalendarStore, NewCalendarEvent, PaymentMethodStore};
use meridian_core::StoreError;

#[derive(Default)]
struct State {
    trips: HashMap<Uuid, Trip>,
    bookings: HashMap<Uuid, Booking>,
    events: HashMap<Uuid, CalendarEvent>,
    payment_methods: Vec<PaymentMethod>,
}

/// In-memory trip/calendar/payment store backing tests and local runs.
///
/// `finalize_checkout` applies its writes as one all-or-nothing swap, so the
/// rollback-on-failure behavior of the real transaction can be exercised; the
/// `fail_*` hooks inject that failure.
pub struct MemoryStore {
    state: Mutex<State>,
    fail_finalize: AtomicBool,
    fail_booking_kind: Mutex<Option<BookingKind>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            fail_finalize: AtomicBool::new(false),
            fail_booking_kind: Mutex::new(None),
        }
    }

    pub fn add_payment_method(&self, method: PaymentMethod) {
        let mut state = self.state.lock().unwrap();
        state.payment_methods.push(method);
        // First-listed wins on fallback, so keep defaults in front
        state
            .payment_methods
            .sort_by_key(|m| std::cmp::Reverse(m.is_default));
    }

    /// Makes the next `finalize_checkout` fail after staging its writes,
    /// leaving the store untouched. One-shot.
    pub fn fail_next_finalize(&self) {
        self.fail_finalize.store(true, Ordering::SeqCst);
    }

    /// Makes `add_booking` fail for one category. One-shot.
    pub fn fail_next_booking_of(&self, kind: BookingKind) {
        *self.fail_booking_kind.lock().unwrap() = Some(kind);
    }

    fn assemble(state: &State, trip: &Trip) -> Trip {
        let mut assembled = trip.clone();
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.trip_id == trip.id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start);
        assembled.bookings = bookings;
        assembled
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn create_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.trips.get(&id).map(|t| Self::assemble(&state, t)))
    }

    async fn list_trips(&self, user_id: Uuid) -> Result<Vec<Trip>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut trips: Vec<Trip> = state
            .trips
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| Self::assemble(&state, t))
            .collect();
        trips.sort_by_key(|t| std::cmp::Reverse(t.updated_at));
        Ok(trips)
    }

    async fn delete_trip(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.trips.remove(&id);
        state.bookings.retain(|_, b| b.trip_id != id);
        Ok(())
    }

    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let trip = state.trips.get_mut(&id).ok_or("trip not found")?;
        trip.update_status(status);
        Ok(())
    }

    async fn add_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        {
            let mut fail_kind = self.fail_booking_kind.lock().unwrap();
            if *fail_kind == Some(booking.item.kind()) {
                *fail_kind = None;
                return Err("injected booking insert failure".into());
            }
        }
        let mut state = self.state.lock().unwrap();
        if !state.trips.contains_key(&booking.trip_id) {
            return Err("trip not found".into());
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.bookings.get(&id).cloned())
    }

    async fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.bookings.remove(&id);
        Ok(())
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let booking = state.bookings.get_mut(&id).ok_or("booking not found")?;
        booking.update_status(status);
        Ok(())
    }

    async fn finalize_checkout(
        &self,
        trip_id: Uuid,
        payment_method_id: Uuid,
        event: Option<NewCalendarEvent>,
    ) -> Result<CheckoutCommit, StoreError> {
        let mut state = self.state.lock().unwrap();

        // Re-read inside the "transaction" rather than trusting the caller
        let current = state.trips.get(&trip_id).ok_or("trip not found")?;
        match current.status {
            TripStatus::Draft => {}
            TripStatus::Confirmed => {
                let trip = Self::assemble(&state, current);
                return Ok(CheckoutCommit::AlreadyConfirmed { trip });
            }
            status => {
                return Err(format!("cannot check out a {} trip", status.as_str()).into());
            }
        }

        // Stage every write, then swap; an injected failure discards the
        // staged state exactly like a rolled-back transaction
        let mut staged_trip = current.clone();
        staged_trip.payment_method_id = Some(payment_method_id);
        staged_trip.update_status(TripStatus::Confirmed);

        if self.fail_finalize.swap(false, Ordering::SeqCst) {
            return Err("injected commit failure".into());
        }

        state.trips.insert(trip_id, staged_trip);
        let now = Utc::now();
        for booking in state.bookings.values_mut() {
            if booking.trip_id == trip_id {
                booking.status = BookingStatus::Confirmed;
                booking.updated_at = now;
            }
        }
        if let Some(new_event) = event {
            let id = Uuid::new_v4();
            state.events.insert(
                id,
                CalendarEvent {
                    id,
                    user_id: new_event.user_id,
                    title: new_event.title,
                    start: new_event.start,
                    end: new_event.end,
                    is_all_day: new_event.is_all_day,
                    description: new_event.description,
                },
            );
        }

        let trip = state.trips.get(&trip_id).ok_or("trip not found")?;
        let trip = Self::assemble(&state, trip);
        Ok(CheckoutCommit::Confirmed { trip })
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn list_events(&self, user_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut events: Vec<CalendarEvent> = state
            .events
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.events.get(&id).cloned())
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = Uuid::new_v4();
        let stored = CalendarEvent {
            id,
            user_id: event.user_id,
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            is_all_day: event.is_all_day,
            description: event.description.clone(),
        };
        state.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.events.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PaymentMethodStore for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentMethod>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payment_methods
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}
