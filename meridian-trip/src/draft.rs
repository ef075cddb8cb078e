use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::intent::{HeuristicRules, TripIntent};
use crate::models::{Booking, BookingKind, ItemRef, Trip};
use crate::repository::TripStore;
use meridian_core::search::{
    ActivityOption, ActivitySearch, FlightOption, FlightSearch, HotelOption, HotelSearch,
};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Store error: {0}")]
    Store(String),
}

/// Per-category result of one draft assembly. A failed category carries its
/// error text instead of aborting the sibling categories.
#[derive(Debug, Clone, Serialize)]
pub struct DraftItem {
    pub category: BookingKind,
    pub booking: Option<Booking>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftOutcome {
    /// None when no category returned a candidate; nothing was created.
    pub trip: Option<Trip>,
    pub items: Vec<DraftItem>,
}

/// Turns a loosely-specified trip intent into a DRAFT trip with one
/// PENDING_APPROVAL booking per inventory category that had a candidate.
pub struct DraftService {
    trips: Arc<dyn TripStore>,
    flights: Arc<dyn FlightSearch>,
    hotels: Arc<dyn HotelSearch>,
    activities: Arc<dyn ActivitySearch>,
    rules: HeuristicRules,
}

impl DraftService {
    pub fn new(
        trips: Arc<dyn TripStore>,
        flights: Arc<dyn FlightSearch>,
        hotels: Arc<dyn HotelSearch>,
        activities: Arc<dyn ActivitySearch>,
        rules: HeuristicRules,
    ) -> Self {
        Self {
            trips,
            flights,
            hotels,
            activities,
            rules,
        }
    }

    pub async fn assemble_draft(
        &self,
        intent: TripIntent,
        acting_user_id: Uuid,
    ) -> Result<DraftOutcome, DraftError> {
        // Three independent reads; a failed search degrades to an empty
        // category instead of failing the draft
        let flight_query = intent.flight_query(&self.rules);
        let hotel_query = intent.hotel_query(&self.rules);
        let activity_query = intent.activity_query(&self.rules);
        let (flights, hotels, activities) = tokio::join!(
            self.flights.search_flights(&flight_query),
            self.hotels.search_hotels(&hotel_query),
            self.activities.search_activities(&activity_query),
        );

        let flights = flights.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Flight search failed during draft assembly");
            Vec::new()
        });
        let hotels = hotels.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Hotel search failed during draft assembly");
            Vec::new()
        });
        let activities = activities.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Activity search failed during draft assembly");
            Vec::new()
        });

        if flights.is_empty() && hotels.is_empty() && activities.is_empty() {
            return Ok(DraftOutcome {
                trip: None,
                items: Vec::new(),
            });
        }

        let mut trip = Trip::new(
            acting_user_id,
            format!(
                "Draft: {}-{}",
                intent.origin.as_deref().unwrap_or_default(),
                intent.destination.as_deref().unwrap_or_default()
            ),
        );
        trip.start_date = intent.start();
        trip.end_date = intent.end();

        self.trips
            .create_trip(&trip)
            .await
            .map_err(|e| DraftError::Store(e.to_string()))?;
        tracing::info!(trip_id = %trip.id, "Draft trip created from intent");

        // First candidate per category, each attempted independently
        let mut items = Vec::new();
        if let Some(flight) = flights.first() {
            items.push(
                self.try_add(BookingKind::Flight, flight_booking(&trip, flight))
                    .await,
            );
        }
        if let Some(hotel) = hotels.first() {
            items.push(
                self.try_add(BookingKind::Hotel, hotel_booking(&trip, hotel, &intent))
                    .await,
            );
        }
        if let Some(activity) = activities.first() {
            items.push(
                self.try_add(
                    BookingKind::Activity,
                    activity_booking(&trip, activity, &intent),
                )
                .await,
            );
        }

        let trip = self
            .trips
            .get_trip(trip.id)
            .await
            .map_err(|e| DraftError::Store(e.to_string()))?
            .unwrap_or(trip);

        Ok(DraftOutcome {
            trip: Some(trip),
            items,
        })
    }

    async fn try_add(&self, category: BookingKind, booking: Option<Booking>) -> DraftItem {
        let Some(booking) = booking else {
            // Candidate had no usable interval (e.g. no start date at all)
            return DraftItem {
                category,
                booking: None,
                error: Some("could not derive a booking interval".to_string()),
            };
        };

        match self.trips.add_booking(&booking).await {
            Ok(()) => DraftItem {
                category,
                booking: Some(booking),
                error: None,
            },
            Err(e) => {
                tracing::warn!(category = category.as_str(), error = %e, "Draft booking creation failed");
                DraftItem {
                    category,
                    booking: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn flight_booking(trip: &Trip, option: &FlightOption) -> Option<Booking> {
    let details = serde_json::json!({
        "item_id": option.flight_id,
        "provider": option.airline,
        "flight_number": option.flight_number,
        "origin": option.origin,
        "destination": option.destination,
    });
    Some(Booking::new(
        trip.id,
        ItemRef::Flight(option.flight_id),
        option.price_amount,
        details,
        option.departure,
        option.arrival,
    ))
}

fn hotel_booking(trip: &Trip, option: &HotelOption, intent: &TripIntent) -> Option<Booking> {
    let start = intent.start().or(trip.start_date)?;
    // Default to one night when the intent has no end date
    let end = intent
        .end()
        .filter(|e| *e > start)
        .unwrap_or(start + Duration::days(1));
    let nights = nights_between(start, end);

    let details = serde_json::json!({
        "item_id": option.hotel_id,
        "hotel_name": option.name,
        "room_type": "Standard",
        "guests": intent.num_travelers.unwrap_or(1),
        "nights": nights,
    });
    Some(Booking::new(
        trip.id,
        ItemRef::Hotel(option.hotel_id),
        option.price_per_night * nights,
        details,
        start,
        end,
    ))
}

fn activity_booking(trip: &Trip, option: &ActivityOption, intent: &TripIntent) -> Option<Booking> {
    let start = intent.start().or(trip.start_date)?;
    // Known duration makes a real interval; otherwise a zero-duration
    // placeholder at the start date
    let end = match option.duration_minutes {
        Some(minutes) if minutes > 0 => start + Duration::minutes(minutes),
        _ => start,
    };

    let details = serde_json::json!({
        "item_id": option.activity_id,
        "activity_name": option.name,
        "ticket_qty": intent.num_travelers.unwrap_or(1),
    });
    Some(Booking::new(
        trip.id,
        ItemRef::Activity(option.activity_id),
        option.price_amount,
        details,
        start,
        end,
    ))
}

fn nights_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let nights = (end - start).num_hours() as f64 / 24.0;
    (nights.round() as i64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use meridian_core::search::{ActivityQuery, FlightQuery, HotelQuery};
    use meridian_core::StoreError;

    struct StubFlights(Vec<FlightOption>);
    struct StubHotels(Vec<HotelOption>);
    struct StubActivities(Vec<ActivityOption>);
    struct BrokenHotels;

    #[async_trait]
    impl FlightSearch for StubFlights {
        async fn search_flights(&self, _q: &FlightQuery) -> Result<Vec<FlightOption>, StoreError> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl HotelSearch for StubHotels {
        async fn search_hotels(&self, _q: &HotelQuery) -> Result<Vec<HotelOption>, StoreError> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl HotelSearch for BrokenHotels {
        async fn search_hotels(&self, _q: &HotelQuery) -> Result<Vec<HotelOption>, StoreError> {
            Err("hotel inventory unavailable".into())
        }
    }

    #[async_trait]
    impl ActivitySearch for StubActivities {
        async fn search_activities(
            &self,
            _q: &ActivityQuery,
        ) -> Result<Vec<ActivityOption>, StoreError> {
            Ok(self.0.clone())
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn a_flight() -> FlightOption {
        FlightOption {
            flight_id: Uuid::new_v4(),
            airline: "Garuda Indonesia".to_string(),
            flight_number: "GA402".to_string(),
            origin: "CGK".to_string(),
            destination: "DPS".to_string(),
            departure: at(2025, 1, 10, 8),
            arrival: at(2025, 1, 10, 11),
            price_amount: 1_500_000,
        }
    }

    fn a_hotel() -> HotelOption {
        HotelOption {
            hotel_id: Uuid::new_v4(),
            name: "Ubud Garden Resort".to_string(),
            location: "Bali".to_string(),
            price_per_night: 800_000,
            rating: Some(4.5),
        }
    }

    fn an_activity() -> ActivityOption {
        ActivityOption {
            activity_id: Uuid::new_v4(),
            name: "Mount Batur sunrise trek".to_string(),
            location: "Bali".to_string(),
            price_amount: 350_000,
            duration_minutes: None,
        }
    }

    fn intent() -> TripIntent {
        TripIntent {
            origin: Some("Jakarta".to_string()),
            destination: Some("Bali".to_string()),
            start_date: Some("2025-01-10".to_string()),
            end_date: Some("2025-01-12".to_string()),
            num_travelers: Some(2),
            budget: Some(100_000_000.0),
            hotel_requirements: None,
            activity_type: Some("hiking".to_string()),
        }
    }

    fn service(
        store: Arc<MemoryStore>,
        flights: Vec<FlightOption>,
        hotels: Vec<HotelOption>,
        activities: Vec<ActivityOption>,
    ) -> DraftService {
        DraftService::new(
            store,
            Arc::new(StubFlights(flights)),
            Arc::new(StubHotels(hotels)),
            Arc::new(StubActivities(activities)),
            HeuristicRules::default(),
        )
    }

    #[tokio::test]
    async fn test_draft_creates_one_booking_per_category() {
        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let svc = service(
            store.clone(),
            vec![a_flight()],
            vec![a_hotel()],
            vec![an_activity()],
        );

        let outcome = svc.assemble_draft(intent(), user).await.unwrap();
        let trip = outcome.trip.unwrap();

        assert_eq!(trip.user_id, user);
        assert_eq!(trip.name, "Draft: Jakarta-Bali");
        assert_eq!(trip.status, crate::models::TripStatus::Draft);
        assert_eq!(trip.bookings.len(), 3);
        assert!(trip
            .bookings
            .iter()
            .all(|b| b.status == crate::models::BookingStatus::PendingApproval));
        assert_eq!(outcome.items.len(), 3);
        assert!(outcome.items.iter().all(|i| i.error.is_none()));
    }

    #[tokio::test]
    async fn test_flight_interval_comes_from_the_flight_itself() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store, vec![a_flight()], vec![], vec![]);

        let outcome = svc.assemble_draft(intent(), Uuid::new_v4()).await.unwrap();
        let trip = outcome.trip.unwrap();
        let booking = &trip.bookings[0];

        assert_eq!(booking.item.kind(), BookingKind::Flight);
        assert_eq!(booking.start, at(2025, 1, 10, 8));
        assert_eq!(booking.end, at(2025, 1, 10, 11));
        assert_eq!(booking.total_amount, 1_500_000);
    }

    #[tokio::test]
    async fn test_hotel_total_is_per_night_times_nights() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store, vec![], vec![a_hotel()], vec![]);

        // 2 nights: Jan 10 -> Jan 12
        let outcome = svc.assemble_draft(intent(), Uuid::new_v4()).await.unwrap();
        let trip = outcome.trip.unwrap();
        let booking = &trip.bookings[0];

        assert_eq!(booking.item.kind(), BookingKind::Hotel);
        assert_eq!(booking.total_amount, 1_600_000);
        assert_eq!(booking.details["nights"], 2);
    }

    #[tokio::test]
    async fn test_hotel_defaults_to_one_night_without_end_date() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store, vec![], vec![a_hotel()], vec![]);

        let mut one_day = intent();
        one_day.end_date = None;
        let outcome = svc.assemble_draft(one_day, Uuid::new_v4()).await.unwrap();
        let booking = &outcome.trip.unwrap().bookings[0];

        assert_eq!(booking.total_amount, 800_000);
        assert_eq!(booking.end, booking.start + Duration::days(1));
    }

    #[tokio::test]
    async fn test_activity_without_duration_is_zero_length_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store, vec![], vec![], vec![an_activity()]);

        let outcome = svc.assemble_draft(intent(), Uuid::new_v4()).await.unwrap();
        let booking = &outcome.trip.unwrap().bookings[0];

        assert_eq!(booking.item.kind(), BookingKind::Activity);
        assert_eq!(booking.start, booking.end);
    }

    #[tokio::test]
    async fn test_failing_search_degrades_to_empty_category() {
        let store = Arc::new(MemoryStore::new());
        let svc = DraftService::new(
            store,
            Arc::new(StubFlights(vec![a_flight()])),
            Arc::new(BrokenHotels),
            Arc::new(StubActivities(vec![])),
            HeuristicRules::default(),
        );

        let outcome = svc.assemble_draft(intent(), Uuid::new_v4()).await.unwrap();
        let trip = outcome.trip.unwrap();

        // The flight made it; the broken hotel search cost nothing else
        assert_eq!(trip.bookings.len(), 1);
        assert_eq!(trip.bookings[0].item.kind(), BookingKind::Flight);
    }

    #[tokio::test]
    async fn test_failing_booking_creation_does_not_abort_siblings() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_booking_of(BookingKind::Hotel);
        let svc = service(
            store.clone(),
            vec![a_flight()],
            vec![a_hotel()],
            vec![an_activity()],
        );

        let outcome = svc.assemble_draft(intent(), Uuid::new_v4()).await.unwrap();
        let trip = outcome.trip.unwrap();

        assert_eq!(trip.bookings.len(), 2);
        let failed: Vec<_> = outcome.items.iter().filter(|i| i.error.is_some()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].category, BookingKind::Hotel);
    }

    #[tokio::test]
    async fn test_no_candidates_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), vec![], vec![], vec![]);

        let user = Uuid::new_v4();
        let outcome = svc.assemble_draft(intent(), user).await.unwrap();

        assert!(outcome.trip.is_none());
        assert!(outcome.items.is_empty());
        assert!(store.list_trips(user).await.unwrap().is_empty());
    }
}
