use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::search::{
    ActivityOption, ActivityQuery, ActivitySearch, FlightOption, FlightQuery, FlightSearch,
    HotelOption, HotelQuery, HotelSearch,
};
use meridian_core::StoreError;

const RESULTS_PER_CATEGORY: i64 = 5;

/// Postgres-backed search over the three inventory tables. One struct
/// implements all three collaborators; they share a pool and nothing else.
pub struct PostgresInventory {
    pool: PgPool,
}

impl PostgresInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    flight_number: String,
    origin_code: String,
    dest_code: String,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    price: i64,
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    location: String,
    price_per_night: i64,
    rating: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    name: String,
    location: String,
    price: i64,
    duration_minutes: Option<i64>,
}

#[async_trait]
impl FlightSearch for PostgresInventory {
    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<FlightOption>, StoreError> {
        let (min_price, max_price) = match query.price {
            Some(band) => (Some(band.min), Some(band.max)),
            None => (None, None),
        };

        let rows: Vec<FlightRow> = sqlx::query_as(
            r#"
            SELECT id, airline, flight_number, origin_code, dest_code, departure, arrival, price
            FROM flights
            WHERE departure >= NOW()
              AND available_seats > 0
              AND ($1::text IS NULL OR origin_code ILIKE $1)
              AND ($2::text IS NULL OR dest_code ILIKE $2)
              AND ($3::date IS NULL OR departure::date = $3)
              AND ($4::bigint IS NULL OR price >= $4)
              AND ($5::bigint IS NULL OR price <= $5)
            ORDER BY departure ASC
            LIMIT $6
            "#,
        )
        .bind(query.origin.as_deref())
        .bind(query.destination.as_deref())
        .bind(query.date)
        .bind(min_price)
        .bind(max_price)
        .bind(RESULTS_PER_CATEGORY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FlightOption {
                flight_id: row.id,
                airline: row.airline,
                flight_number: row.flight_number,
                origin: row.origin_code,
                destination: row.dest_code,
                departure: row.departure,
                arrival: row.arrival,
                price_amount: row.price,
            })
            .collect())
    }
}

#[async_trait]
impl HotelSearch for PostgresInventory {
    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<HotelOption>, StoreError> {
        let (min_price, max_price) = match query.price_per_night {
            Some(band) => (Some(band.min), Some(band.max)),
            None => (None, None),
        };
        let location = query.location.as_deref().map(|l| format!("%{}%", l));

        let rows: Vec<HotelRow> = sqlx::query_as(
            r#"
            SELECT id, name, location, price_per_night, rating
            FROM hotels
            WHERE ($1::text IS NULL OR location ILIKE $1)
              AND ($2::bigint IS NULL OR price_per_night >= $2)
              AND ($3::bigint IS NULL OR price_per_night <= $3)
            ORDER BY rating DESC NULLS LAST
            LIMIT $4
            "#,
        )
        .bind(location)
        .bind(min_price)
        .bind(max_price)
        .bind(RESULTS_PER_CATEGORY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HotelOption {
                hotel_id: row.id,
                name: row.name,
                location: row.location,
                price_per_night: row.price_per_night,
                rating: row.rating,
            })
            .collect())
    }
}

#[async_trait]
impl ActivitySearch for PostgresInventory {
    async fn search_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityOption>, StoreError> {
        let (min_price, max_price) = match query.price {
            Some(band) => (Some(band.min), Some(band.max)),
            None => (None, None),
        };
        let location = query.location.as_deref().map(|l| format!("%{}%", l));

        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT id, name, location, price, duration_minutes
            FROM activities
            WHERE ($1::text IS NULL OR location ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::bigint IS NULL OR price >= $3)
              AND ($4::bigint IS NULL OR price <= $4)
            ORDER BY price ASC
            LIMIT $5
            "#,
        )
        .bind(location)
        .bind(query.category.as_deref())
        .bind(min_price)
        .bind(max_price)
        .bind(RESULTS_PER_CATEGORY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ActivityOption {
                activity_id: row.id,
                name: row.name,
                location: row.location,
                price_amount: row.price,
                duration_minutes: row.duration_minutes,
            })
            .collect())
    }
}
