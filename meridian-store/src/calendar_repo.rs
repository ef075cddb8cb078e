use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::repository::{CalendarEvent, CalendarStore, NewCalendarEvent};
use meridian_core::StoreError;

pub struct PostgresCalendarStore {
    pool: PgPool,
}

impl PostgresCalendarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    is_all_day: bool,
    description: Option<String>,
}

impl EventRow {
    fn into_event(self) -> CalendarEvent {
        CalendarEvent {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            start: self.start_at,
            end: self.end_at,
            is_all_day: self.is_all_day,
            description: self.description,
        }
    }
}

const EVENT_COLUMNS: &str = "id, user_id, title, start_at, end_at, is_all_day, description";

#[async_trait]
impl CalendarStore for PostgresCalendarStore {
    async fn list_events(&self, user_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM calendar_events WHERE user_id = $1 ORDER BY start_at ASC",
            EVENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventRow::into_event).collect())
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<CalendarEvent>, StoreError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {} FROM calendar_events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EventRow::into_event))
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO calendar_events (id, user_id, title, start_at, end_at, is_all_day, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(event.user_id)
        .bind(&event.title)
        .bind(event.start)
        .bind(event.end)
        .bind(event.is_all_day)
        .bind(&event.description)
        .execute(&self.pool)
        .await?;

        Ok(CalendarEvent {
            id,
            user_id: event.user_id,
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            is_all_day: event.is_all_day,
            description: event.description.clone(),
        })
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
