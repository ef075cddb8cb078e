use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payment::PaymentMethod;
use crate::StoreError;

/// A calendar commitment. Independent of any trip, but it is the surface the
/// conflict detector checks against, and confirming a trip writes one.
///
/// The interval is half-open `[start, end)`; both instants are UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub description: Option<String>,
}

/// Insert form of [`CalendarEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub user_id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub description: Option<String>,
}

/// Repository trait for a user's calendar events.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn list_events(&self, user_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError>;

    async fn get_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError>;

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, StoreError>;

    async fn delete_event(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Repository trait for saved payment methods. Read-only: checkout selects
/// a method, it never creates or mutates one.
#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentMethod>, StoreError>;
}
