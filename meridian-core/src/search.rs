use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreError;

/// Inclusive price window applied to one inventory category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBand {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub price: Option<PriceBand>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelQuery {
    pub location: Option<String>,
    pub price_per_night: Option<PriceBand>,
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub location: Option<String>,
    pub price: Option<PriceBand>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOption {
    pub flight_id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub price_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelOption {
    pub hotel_id: Uuid,
    pub name: String,
    pub location: String,
    pub price_per_night: i64,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOption {
    pub activity_id: Uuid,
    pub name: String,
    pub location: String,
    pub price_amount: i64,
    pub duration_minutes: Option<i64>,
}

/// Search collaborator for flight inventory.
#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search_flights(&self, query: &FlightQuery) -> Result<Vec<FlightOption>, StoreError>;
}

/// Search collaborator for hotel inventory.
#[async_trait]
pub trait HotelSearch: Send + Sync {
    async fn search_hotels(&self, query: &HotelQuery) -> Result<Vec<HotelOption>, StoreError>;
}

/// Search collaborator for activity inventory.
#[async_trait]
pub trait ActivitySearch: Send + Sync {
    async fn search_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityOption>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_query_deserialization() {
        let json = r#"
            {
                "origin": "CGK",
                "destination": "DPS",
                "date": "2025-01-10",
                "price": { "min": 500000, "max": 3000000 }
            }
        "#;
        let query: FlightQuery = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(query.origin.as_deref(), Some("CGK"));
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(query.price.unwrap().max, 3000000);
    }
}
