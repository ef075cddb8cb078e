use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use meridian_core::payment::PaymentMethod;
use meridian_core::repository::PaymentMethodStore;
use meridian_core::StoreError;

pub struct PostgresPaymentMethodStore {
    pool: PgPool,
}

impl PostgresPaymentMethodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentMethodRow {
    id: Uuid,
    user_id: Uuid,
    brand: String,
    last4: String,
    is_default: bool,
}

#[async_trait]
impl PaymentMethodStore for PostgresPaymentMethodStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentMethod>, StoreError> {
        // Default first so the checkout fallback picks it up
        let rows: Vec<PaymentMethodRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, brand, last4, is_default
            FROM payment_methods
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PaymentMethod {
                id: row.id,
                user_id: row.user_id,
                brand: row.brand,
                last4: row.last4,
                is_default: row.is_default,
            })
            .collect())
    }
}
