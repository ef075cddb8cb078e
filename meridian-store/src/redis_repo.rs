use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::info;

use meridian_core::idempotency::{IdempotencyRecord, IdempotencyStore};
use meridian_core::StoreError;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

/// Redis-backed idempotency ledger. Records are JSON values keyed
/// `idem:{key}`; `create` is SET NX so the first writer wins and an existing
/// record is never overwritten.
pub struct RedisIdempotencyStore {
    redis: RedisClient,
}

impl RedisIdempotencyStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    fn storage_key(key: &str) -> String {
        format!("idem:{}", key)
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn find(&self, key: &str) -> Result<Option<IdempotencyRecord>, StoreError> {
        let mut conn = self.redis.connection().await?;
        let raw: Option<String> = conn.get(Self::storage_key(key)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        key: &str,
        metadata: serde_json::Value,
    ) -> Result<IdempotencyRecord, StoreError> {
        let mut conn = self.redis.connection().await?;
        let record = IdempotencyRecord::new(key.to_string(), metadata);
        let payload = serde_json::to_string(&record)?;

        // SET NX: only set if the key does not exist
        let written: Option<String> = redis::cmd("SET")
            .arg(Self::storage_key(key))
            .arg(&payload)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        if written.is_some() {
            info!("Idempotency record created: {}", key);
            return Ok(record);
        }

        // Lost the race; hand back whoever got there first
        let existing: Option<String> = conn.get(Self::storage_key(key)).await?;
        match existing {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            // The record disappeared between SET NX and GET; treat ours as
            // authoritative rather than failing the guarded operation
            None => Ok(record),
        }
    }

    async fn mark_used(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.connection().await?;
        let raw: Option<String> = conn.get(Self::storage_key(key)).await?;
        let Some(raw) = raw else {
            return Ok(());
        };

        let mut record: IdempotencyRecord = serde_json::from_str(&raw)?;
        if record.used {
            return Ok(());
        }
        record.used = true;
        let payload = serde_json::to_string(&record)?;
        conn.set::<_, _, ()>(Self::storage_key(key), payload).await?;
        Ok(())
    }
}
