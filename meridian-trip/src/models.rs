use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trip status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Draft,
    Confirmed,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "DRAFT",
            TripStatus::Confirmed => "CONFIRMED",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(TripStatus::Draft),
            "CONFIRMED" => Some(TripStatus::Confirmed),
            "COMPLETED" => Some(TripStatus::Completed),
            "CANCELLED" => Some(TripStatus::Cancelled),
            _ => None,
        }
    }
}

/// Booking status. A booking can only be CONFIRMED through its trip's
/// checkout; there is no per-booking confirm path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingApproval,
    Confirmed,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingApproval => "PENDING_APPROVAL",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_APPROVAL" => Some(BookingStatus::PendingApproval),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "REJECTED" => Some(BookingStatus::Rejected),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    Flight,
    Hotel,
    Activity,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Flight => "FLIGHT",
            BookingKind::Hotel => "HOTEL",
            BookingKind::Activity => "ACTIVITY",
        }
    }
}

/// Reference to the inventory item a booking was made from. Exactly one
/// reference exists and it always matches the booking's category; the enum
/// makes any other combination unrepresentable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "item_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemRef {
    Flight(Uuid),
    Hotel(Uuid),
    Activity(Uuid),
}

impl ItemRef {
    pub fn kind(&self) -> BookingKind {
        match self {
            ItemRef::Flight(_) => BookingKind::Flight,
            ItemRef::Hotel(_) => BookingKind::Hotel,
            ItemRef::Activity(_) => BookingKind::Activity,
        }
    }

    pub fn item_id(&self) -> Uuid {
        match self {
            ItemRef::Flight(id) | ItemRef::Hotel(id) | ItemRef::Activity(id) => *id,
        }
    }
}

/// One reserved item inside a trip. The occupied time is the half-open
/// interval `[start, end)`; both instants are UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    #[serde(flatten)]
    pub item: ItemRef,
    pub total_amount: i64,
    /// Opaque structured details; stored and returned, never interpreted here.
    pub details: serde_json::Value,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        trip_id: Uuid,
        item: ItemRef,
        total_amount: i64,
        details: serde_json::Value,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trip_id,
            item,
            total_amount,
            details,
            start,
            end,
            status: BookingStatus::PendingApproval,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

/// A multi-item trip. DRAFT trips are mutable; checkout moves the trip and
/// every booking in it to CONFIRMED in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: TripStatus,
    pub payment_method_id: Option<Uuid>,
    pub bookings: Vec<Booking>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(user_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            start_date: None,
            end_date: None,
            status: TripStatus::Draft,
            payment_method_id: None,
            bookings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: TripStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// Bookings may be added or removed only while the trip is a draft.
    pub fn is_mutable(&self) -> bool {
        self.status == TripStatus::Draft
    }

    /// Both dates set, as the range the confirmation calendar event spans.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn total_amount(&self) -> i64 {
        self.bookings.iter().map(|b| b.total_amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in ["DRAFT", "CONFIRMED", "COMPLETED", "CANCELLED"] {
            assert_eq!(TripStatus::parse(status).unwrap().as_str(), status);
        }
        assert!(TripStatus::parse("PROPOSED").is_none());
    }

    #[test]
    fn test_item_ref_serialization() {
        let id = Uuid::new_v4();
        let item = ItemRef::Flight(id);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "FLIGHT");
        assert_eq!(json["item_id"], serde_json::json!(id));

        let back: ItemRef = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), BookingKind::Flight);
        assert_eq!(back.item_id(), id);
    }

    #[test]
    fn test_trip_totals_and_mutability() {
        let mut trip = Trip::new(Uuid::new_v4(), "Bali getaway".to_string());
        assert!(trip.is_mutable());
        assert_eq!(trip.total_amount(), 0);

        trip.bookings.push(Booking::new(
            trip.id,
            ItemRef::Hotel(Uuid::new_v4()),
            1_500_000,
            serde_json::json!({}),
            Utc::now(),
            Utc::now(),
        ));
        trip.bookings.push(Booking::new(
            trip.id,
            ItemRef::Flight(Uuid::new_v4()),
            2_500_000,
            serde_json::json!({}),
            Utc::now(),
            Utc::now(),
        ));
        assert_eq!(trip.total_amount(), 4_000_000);

        trip.update_status(TripStatus::Confirmed);
        assert!(!trip.is_mutable());
    }
}
