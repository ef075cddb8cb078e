use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Trip, TripStatus};
use meridian_core::repository::NewCalendarEvent;
use meridian_core::StoreError;

/// Outcome of the atomic checkout transaction.
#[derive(Debug, Clone)]
pub enum CheckoutCommit {
    /// The trip and all its bookings moved to CONFIRMED in this transaction.
    Confirmed { trip: Trip },
    /// The re-read inside the transaction found the trip already CONFIRMED;
    /// nothing was written. Lets a lost race or a retry commit as a no-op.
    AlreadyConfirmed { trip: Trip },
}

impl CheckoutCommit {
    pub fn trip(&self) -> &Trip {
        match self {
            CheckoutCommit::Confirmed { trip } | CheckoutCommit::AlreadyConfirmed { trip } => trip,
        }
    }
}

/// Repository trait for trips and the bookings inside them.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn create_trip(&self, trip: &Trip) -> Result<(), StoreError>;

    /// Fetches the trip with its bookings attached.
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError>;

    async fn list_trips(&self, user_id: Uuid) -> Result<Vec<Trip>, StoreError>;

    async fn delete_trip(&self, id: Uuid) -> Result<(), StoreError>;

    /// Plain status write, used by the non-checkout transitions
    /// (e.g. CONFIRMED -> COMPLETED). Checkout never goes through this.
    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), StoreError>;

    async fn add_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn remove_booking(&self, id: Uuid) -> Result<(), StoreError>;

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), StoreError>;

    /// The single transaction behind checkout: set the trip CONFIRMED with
    /// the resolved payment method, set every booking in it CONFIRMED, and
    /// insert the confirmation calendar event when one is given. The trip's
    /// status is re-read inside the transaction; an already-CONFIRMED trip
    /// commits nothing and reports [`CheckoutCommit::AlreadyConfirmed`].
    /// Any failure rolls back all three effects together.
    async fn finalize_checkout(
        &self,
        trip_id: Uuid,
        payment_method_id: Uuid,
        event: Option<NewCalendarEvent>,
    ) -> Result<CheckoutCommit, StoreError>;
}
