use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::repository::NewCalendarEvent;
use meridian_core::StoreError;
use meridian_trip::models::{Booking, BookingStatus, ItemRef, Trip, TripStatus};
use meridian_trip::repository::{CheckoutCommit, TripStore};

pub struct PostgresTripStore {
    pool: PgPool,
}

impl PostgresTripStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    status: String,
    payment_method_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Uuid,
    booking_type: String,
    flight_id: Option<Uuid>,
    hotel_id: Option<Uuid>,
    activity_id: Option<Uuid>,
    total_amount: i64,
    details: serde_json::Value,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TripRow {
    fn into_trip(self, bookings: Vec<Booking>) -> Result<Trip, StoreError> {
        let status = TripStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown trip status: {}", self.status))?;
        Ok(Trip {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            status,
            payment_method_id: self.payment_method_id,
            bookings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StoreError> {
        // The schema CHECK guarantees exactly one reference matching the
        // discriminant; anything else is a corrupted row
        let item = match (
            self.booking_type.as_str(),
            self.flight_id,
            self.hotel_id,
            self.activity_id,
        ) {
            ("FLIGHT", Some(id), None, None) => ItemRef::Flight(id),
            ("HOTEL", None, Some(id), None) => ItemRef::Hotel(id),
            ("ACTIVITY", None, None, Some(id)) => ItemRef::Activity(id),
            _ => {
                return Err(format!(
                    "booking {} violates the item-reference invariant",
                    self.id
                )
                .into())
            }
        };
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown booking status: {}", self.status))?;
        Ok(Booking {
            id: self.id,
            trip_id: self.trip_id,
            item,
            total_amount: self.total_amount,
            details: self.details,
            start: self.start_date,
            end: self.end_date,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn item_columns(item: &ItemRef) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
    match item {
        ItemRef::Flight(id) => (Some(*id), None, None),
        ItemRef::Hotel(id) => (None, Some(*id), None),
        ItemRef::Activity(id) => (None, None, Some(*id)),
    }
}

const TRIP_COLUMNS: &str = "id, user_id, name, description, start_date, end_date, status, payment_method_id, created_at, updated_at";
const BOOKING_COLUMNS: &str = "id, trip_id, booking_type, flight_id, hotel_id, activity_id, total_amount, details, start_date, end_date, status, created_at, updated_at";

impl PostgresTripStore {
    async fn bookings_for(&self, trip_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE trip_id = $1 ORDER BY start_date ASC",
            BOOKING_COLUMNS
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }
}

#[async_trait]
impl TripStore for PostgresTripStore {
    async fn create_trip(&self, trip: &Trip) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, user_id, name, description, start_date, end_date, status, payment_method_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(trip.id)
        .bind(trip.user_id)
        .bind(&trip.name)
        .bind(&trip.description)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.status.as_str())
        .bind(trip.payment_method_id)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => {
                let bookings = self.bookings_for(id).await?;
                Ok(Some(row.into_trip(bookings)?))
            }
            None => Ok(None),
        }
    }

    async fn list_trips(&self, user_id: Uuid) -> Result<Vec<Trip>, StoreError> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trips WHERE user_id = $1 ORDER BY updated_at DESC",
            TRIP_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut trips = Vec::with_capacity(rows.len());
        for row in rows {
            let bookings = self.bookings_for(row.id).await?;
            trips.push(row.into_trip(bookings)?);
        }
        Ok(trips)
    }

    async fn delete_trip(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM bookings WHERE trip_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE trips SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let (flight_id, hotel_id, activity_id) = item_columns(&booking.item);
        sqlx::query(
            r#"
            INSERT INTO bookings (id, trip_id, booking_type, flight_id, hotel_id, activity_id, total_amount, details, start_date, end_date, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(booking.trip_id)
        .bind(booking.item.kind().as_str())
        .bind(flight_id)
        .bind(hotel_id)
        .bind(activity_id)
        .bind(booking.total_amount)
        .bind(&booking.details)
        .bind(booking.start)
        .bind(booking.end)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn remove_booking(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn finalize_checkout(
        &self,
        trip_id: Uuid,
        payment_method_id: Uuid,
        event: Option<NewCalendarEvent>,
    ) -> Result<CheckoutCommit, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Re-read the status inside the transaction; the row lock makes
        // concurrent finalizers serialize here
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM trips WHERE id = $1 FOR UPDATE")
                .bind(trip_id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = match status {
            Some((status,)) => status,
            None => return Err(format!("trip {} not found", trip_id).into()),
        };

        match status.as_str() {
            "DRAFT" => {}
            "CONFIRMED" => {
                // A concurrent attempt (or an unkeyed retry) already
                // committed; release the lock and report the no-op
                tx.rollback().await?;
                let trip = self
                    .get_trip(trip_id)
                    .await?
                    .ok_or("trip vanished after no-op commit")?;
                return Ok(CheckoutCommit::AlreadyConfirmed { trip });
            }
            other => {
                return Err(format!("cannot check out a {} trip", other).into());
            }
        }

        sqlx::query(
            "UPDATE trips SET status = 'CONFIRMED', payment_method_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(payment_method_id)
        .bind(trip_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE bookings SET status = 'CONFIRMED', updated_at = NOW() WHERE trip_id = $1",
        )
        .bind(trip_id)
        .execute(&mut *tx)
        .await?;

        if let Some(event) = event {
            sqlx::query(
                r#"
                INSERT INTO calendar_events (id, user_id, title, start_at, end_at, is_all_day, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(event.user_id)
            .bind(&event.title)
            .bind(event.start)
            .bind(event.end)
            .bind(event.is_all_day)
            .bind(&event.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let trip = self
            .get_trip(trip_id)
            .await?
            .ok_or("trip vanished after commit")?;
        Ok(CheckoutCommit::Confirmed { trip })
    }
}
