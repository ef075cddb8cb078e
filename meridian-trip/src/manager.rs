use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, ItemRef, Trip, TripStatus};
use crate::repository::TripStore;

#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: entity does not belong to the acting user")]
    Forbidden,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    #[serde(flatten)]
    pub item: ItemRef,
    pub total_amount: i64,
    #[serde(default)]
    pub details: serde_json::Value,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Governs the Trip/Booking lifecycle against the store. Every mutating
/// operation takes the acting user explicitly and checks ownership before
/// touching anything.
pub struct TripManager {
    trips: Arc<dyn TripStore>,
}

impl TripManager {
    pub fn new(trips: Arc<dyn TripStore>) -> Self {
        Self { trips }
    }

    pub async fn create_trip(
        &self,
        acting_user_id: Uuid,
        params: NewTrip,
    ) -> Result<Trip, TripError> {
        if params.name.trim().is_empty() {
            return Err(TripError::Validation("trip name is required".to_string()));
        }
        if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
            if end <= start {
                return Err(TripError::Validation(
                    "end date must be after start date".to_string(),
                ));
            }
        }

        let mut trip = Trip::new(acting_user_id, params.name);
        trip.description = params.description;
        trip.start_date = params.start_date;
        trip.end_date = params.end_date;

        self.trips
            .create_trip(&trip)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;

        tracing::info!(trip_id = %trip.id, "Trip draft created");
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: Uuid, acting_user_id: Uuid) -> Result<Trip, TripError> {
        let trip = self.resolve_owned(trip_id, acting_user_id).await?;
        Ok(trip)
    }

    pub async fn list_trips(&self, acting_user_id: Uuid) -> Result<Vec<Trip>, TripError> {
        self.trips
            .list_trips(acting_user_id)
            .await
            .map_err(|e| TripError::Store(e.to_string()))
    }

    /// Trips are deletable only while DRAFT.
    pub async fn delete_trip(&self, trip_id: Uuid, acting_user_id: Uuid) -> Result<(), TripError> {
        let trip = self.resolve_owned(trip_id, acting_user_id).await?;

        if !trip.is_mutable() {
            return Err(TripError::InvalidState(format!(
                "cannot delete a {} trip",
                trip.status.as_str()
            )));
        }

        self.trips
            .delete_trip(trip_id)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;
        tracing::info!(trip_id = %trip_id, "Trip draft deleted");
        Ok(())
    }

    /// Adds a PENDING_APPROVAL booking to a DRAFT trip.
    pub async fn add_booking(
        &self,
        trip_id: Uuid,
        acting_user_id: Uuid,
        params: NewBooking,
    ) -> Result<Booking, TripError> {
        if params.end < params.start {
            return Err(TripError::Validation(
                "booking end must not precede its start".to_string(),
            ));
        }
        if params.total_amount < 0 {
            return Err(TripError::Validation(
                "booking amount must not be negative".to_string(),
            ));
        }

        let trip = self.resolve_owned(trip_id, acting_user_id).await?;
        if !trip.is_mutable() {
            return Err(TripError::InvalidState(format!(
                "cannot add bookings to a {} trip",
                trip.status.as_str()
            )));
        }

        let booking = Booking::new(
            trip_id,
            params.item,
            params.total_amount,
            params.details,
            params.start,
            params.end,
        );
        self.trips
            .add_booking(&booking)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;

        tracing::info!(trip_id = %trip_id, booking_id = %booking.id, kind = booking.item.kind().as_str(), "Booking added");
        Ok(booking)
    }

    /// Removes a booking from its trip; allowed only while the trip is DRAFT.
    pub async fn remove_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(), TripError> {
        let (trip, _booking) = self.resolve_owned_booking(booking_id, acting_user_id).await?;

        if !trip.is_mutable() {
            return Err(TripError::InvalidState(format!(
                "cannot remove bookings from a {} trip",
                trip.status.as_str()
            )));
        }

        self.trips
            .remove_booking(booking_id)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;
        Ok(())
    }

    /// PENDING_APPROVAL -> REJECTED, the review-stage veto of one item.
    pub async fn reject_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(), TripError> {
        let (_trip, booking) = self.resolve_owned_booking(booking_id, acting_user_id).await?;

        if booking.status != BookingStatus::PendingApproval {
            return Err(TripError::InvalidState(format!(
                "cannot reject a {} booking",
                booking.status.as_str()
            )));
        }

        self.trips
            .update_booking_status(booking_id, BookingStatus::Rejected)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;
        Ok(())
    }

    /// CONFIRMED -> COMPLETED, driven externally once the trip's dates pass.
    pub async fn complete_trip(
        &self,
        trip_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(), TripError> {
        let trip = self.resolve_owned(trip_id, acting_user_id).await?;

        if trip.status != TripStatus::Confirmed {
            return Err(TripError::InvalidState(format!(
                "cannot complete a {} trip",
                trip.status.as_str()
            )));
        }

        self.trips
            .update_trip_status(trip_id, TripStatus::Completed)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?;
        Ok(())
    }

    async fn resolve_owned(&self, trip_id: Uuid, acting_user_id: Uuid) -> Result<Trip, TripError> {
        let trip = self
            .trips
            .get_trip(trip_id)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?
            .ok_or_else(|| TripError::NotFound(format!("trip {}", trip_id)))?;

        if trip.user_id != acting_user_id {
            return Err(TripError::Forbidden);
        }
        Ok(trip)
    }

    async fn resolve_owned_booking(
        &self,
        booking_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<(Trip, Booking), TripError> {
        let booking = self
            .trips
            .get_booking(booking_id)
            .await
            .map_err(|e| TripError::Store(e.to_string()))?
            .ok_or_else(|| TripError::NotFound(format!("booking {}", booking_id)))?;

        let trip = self.resolve_owned(booking.trip_id, acting_user_id).await?;
        Ok((trip, booking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::TripStore as _;
    use chrono::{TimeZone, Utc};

    fn manager() -> (TripManager, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        (TripManager::new(store.clone()), store, Uuid::new_v4())
    }

    fn new_trip(name: &str) -> NewTrip {
        NewTrip {
            name: name.to_string(),
            description: None,
            start_date: None,
            end_date: None,
        }
    }

    fn a_booking() -> NewBooking {
        NewBooking {
            item: ItemRef::Hotel(Uuid::new_v4()),
            total_amount: 800_000,
            details: serde_json::json!({}),
            start: Utc.with_ymd_and_hms(2025, 1, 10, 14, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 12, 10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_trip_lifecycle() {
        let (mgr, store, user) = manager();

        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();
        assert_eq!(trip.status, TripStatus::Draft);

        let booking = mgr.add_booking(trip.id, user, a_booking()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::PendingApproval);

        // Draft -> Confirmed happens only through checkout's transaction
        store
            .update_trip_status(trip.id, TripStatus::Confirmed)
            .await
            .unwrap();

        // Confirmed -> Completed
        mgr.complete_trip(trip.id, user).await.unwrap();
        let done = mgr.get_trip(trip.id, user).await.unwrap();
        assert_eq!(done.status, TripStatus::Completed);
    }

    #[tokio::test]
    async fn test_confirmed_trip_bookings_are_frozen() {
        let (mgr, store, user) = manager();
        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();
        let booking = mgr.add_booking(trip.id, user, a_booking()).await.unwrap();

        store
            .update_trip_status(trip.id, TripStatus::Confirmed)
            .await
            .unwrap();

        let add = mgr.add_booking(trip.id, user, a_booking()).await;
        assert!(matches!(add, Err(TripError::InvalidState(_))));

        let remove = mgr.remove_booking(booking.id, user).await;
        assert!(matches!(remove, Err(TripError::InvalidState(_))));

        let delete = mgr.delete_trip(trip.id, user).await;
        assert!(matches!(delete, Err(TripError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_ownership_is_checked_on_every_mutation() {
        let (mgr, _store, user) = manager();
        let stranger = Uuid::new_v4();
        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();
        let booking = mgr.add_booking(trip.id, user, a_booking()).await.unwrap();

        assert!(matches!(mgr.get_trip(trip.id, stranger).await, Err(TripError::Forbidden)));
        assert!(matches!(
            mgr.add_booking(trip.id, stranger, a_booking()).await,
            Err(TripError::Forbidden)
        ));
        assert!(matches!(
            mgr.remove_booking(booking.id, stranger).await,
            Err(TripError::Forbidden)
        ));
        assert!(matches!(mgr.delete_trip(trip.id, stranger).await, Err(TripError::Forbidden)));
    }

    #[tokio::test]
    async fn test_reject_booking_only_from_pending() {
        let (mgr, store, user) = manager();
        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();
        let booking = mgr.add_booking(trip.id, user, a_booking()).await.unwrap();

        mgr.reject_booking(booking.id, user).await.unwrap();
        let rejected = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);

        // Rejecting twice is an invalid transition
        let again = mgr.reject_booking(booking.id, user).await;
        assert!(matches!(again, Err(TripError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_input() {
        let (mgr, _store, user) = manager();

        assert!(matches!(
            mgr.create_trip(user, new_trip("  ")).await,
            Err(TripError::Validation(_))
        ));

        let backwards = NewTrip {
            name: "Backwards".to_string(),
            description: None,
            start_date: Some(Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()),
        };
        assert!(matches!(
            mgr.create_trip(user, backwards).await,
            Err(TripError::Validation(_))
        ));

        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();
        let mut inverted = a_booking();
        std::mem::swap(&mut inverted.start, &mut inverted.end);
        assert!(matches!(
            mgr.add_booking(trip.id, user, inverted).await,
            Err(TripError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_draft_trip_removes_it() {
        let (mgr, _store, user) = manager();
        let trip = mgr.create_trip(user, new_trip("Short-lived")).await.unwrap();

        mgr.delete_trip(trip.id, user).await.unwrap();
        assert!(matches!(
            mgr.get_trip(trip.id, user).await,
            Err(TripError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_requires_confirmed() {
        let (mgr, _store, user) = manager();
        let trip = mgr.create_trip(user, new_trip("Bali getaway")).await.unwrap();

        let result = mgr.complete_trip(trip.id, user).await;
        assert!(matches!(result, Err(TripError::InvalidState(_))));
    }
}
