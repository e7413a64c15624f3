//! # Storage
//!
//! Key-value storage behind the [`Store`] trait. Production runs on Redis, tests on
//! [`MemoryStore`]. Nothing holds a global client: the store lives in
//! [`State`](crate::state::State) and is handed to whoever needs it.
//!
//! ## Keys
//!
//! - `activeGame:<id>`: JSON [`ActiveGame`](crate::games::ActiveGame), expires after an hour
//! - `completedGame:<id>`: JSON [`CompletedGame`](crate::games::CompletedGame)
//! - `seededGame:<id>`: JSON [`SeededGame`](crate::seeds::SeededGame)
//! - `user:<id>`: JSON [`User`](crate::users::User)
//! - `userEmail:<email>`: user id, so logins never scan the keyspace
//! - `refreshToken:<token>`: user id, expires with the token
//!
//! ## Record Shape
//!
//! Values are read through [`load`], which deserializes into the record type. A value
//! that does not fit the type is reported as [`StoreError::Malformed`] and never
//! reaches handler logic.
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Malformed record at {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// `ttl` of `None` keeps the value until deleted.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Writes only when `key` holds nothing. Returns whether the write happened.
    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

pub async fn load<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })
}

pub async fn save<T: Serialize + Sync>(
    store: &dyn Store,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(value)?, ttl).await
}

pub async fn init_redis(redis_url: &str) -> Result<RedisStore, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(RedisStore { connection_manager })
}

#[derive(Clone)]
pub struct RedisStore {
    connection_manager: ConnectionManager,
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection_manager.clone();

        Ok(connection.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut connection = self.connection_manager.clone();

        match ttl {
            Some(ttl) => connection.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
            None => connection.set::<_, _, ()>(key, value).await?,
        }

        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let mut connection = self.connection_manager.clone();

        let mut command = redis::cmd("SET");
        command.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            command.arg("EX").arg(ttl.as_secs().max(1));
        }

        let reply: Option<String> = command.query_async(&mut connection).await?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut connection = self.connection_manager.clone();
        connection.del::<_, ()>(key).await?;

        Ok(())
    }
}

/// In-process store honoring TTLs, for tests and offline runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();

        self.entries
            .lock()
            .values()
            .filter(|(_, expires)| expires.is_none_or(|at| at > now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().insert(key.to_string(), (value, expires));

        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let taken = entries
            .get(key)
            .is_some_and(|(_, expires)| expires.is_none_or(|at| at > now));
        if taken {
            return Ok(false);
        }

        entries.insert(key.to_string(), (value, ttl.map(|ttl| now + ttl)));

        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Record {
        id: String,
        steps: u32,
    }

    #[tokio::test]
    async fn test_memory_round_trip_and_delete() {
        let store = MemoryStore::new();
        let record = Record {
            id: "a".to_string(),
            steps: 3,
        };

        save(&store, "record:a", &record, None).await.unwrap();
        assert_eq!(load::<Record>(&store, "record:a").await.unwrap(), Some(record));

        store.delete("record:a").await.unwrap();
        assert_eq!(load::<Record>(&store, "record:a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set("session", "x".to_string(), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("session").await.unwrap().as_deref(), Some("x"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("session").await.unwrap(), None);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_if_absent_respects_live_keys() {
        let store = MemoryStore::new();

        let ttl = Some(Duration::from_secs(5));

        assert!(store.set_if_absent("claim", "a".to_string(), ttl).await.unwrap());
        assert!(!store.set_if_absent("claim", "b".to_string(), None).await.unwrap());
        assert_eq!(store.get("claim").await.unwrap().as_deref(), Some("a"));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(store.set_if_absent("claim", "c".to_string(), None).await.unwrap());
        assert_eq!(store.get("claim").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_malformed_record_is_rejected() {
        let store = MemoryStore::new();
        store
            .set("record:b", r#"{"id": 7}"#.to_string(), None)
            .await
            .unwrap();

        let result = load::<Record>(&store, "record:b").await;

        assert!(matches!(result, Err(StoreError::Malformed { key, .. }) if key == "record:b"));
    }
}
