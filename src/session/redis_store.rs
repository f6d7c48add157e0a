//! Redis session storage.
//!
//! The layout is shared with the edge proxy, which reads the `signature` and
//! `groups` keys directly to validate cookies and partition its cache.

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::SessionKeys;
use super::store::{SessionRecord, SessionStore};
use crate::SessionError;

/// Redis-backed session storage.
///
/// Wraps a [`ConnectionManager`], which multiplexes one connection and
/// reconnects on failure; clones are cheap and share that connection.
///
/// # Example
///
/// ```rust,ignore
/// use shared_session::{RedisSessionStore, SessionConfig, SessionInterface};
///
/// let store = RedisSessionStore::connect("redis://127.0.0.1:6379/12").await?;
/// let sessions = SessionInterface::try_new(store, SessionConfig::new("fishes"))?;
/// ```
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: ConnectionManager,
}

impl RedisSessionStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the URL is invalid or the server
    /// cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        log::info!(target: "shared_session::redis", "msg=\"connected to redis\"");

        Ok(Self { connection })
    }

    /// Wraps a connection manager the application already owns.
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, keys: &SessionKeys) -> Result<Option<Vec<u8>>, SessionError> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(&keys.data).await?;
        Ok(value)
    }

    async fn save(
        &self,
        keys: &SessionKeys,
        record: &SessionRecord,
        ttl_secs: u64,
    ) -> Result<(), SessionError> {
        // SETEX rejects a zero expiry
        if ttl_secs == 0 {
            return Err(SessionError::Configuration(
                "session TTL must be at least one second".to_owned(),
            ));
        }

        let mut conn = self.connection.clone();
        let mut pipe = redis::pipe();

        pipe.atomic()
            .set_ex(&keys.data, &record.data, ttl_secs)
            .ignore()
            .set_ex(&keys.signature, &record.signature, ttl_secs)
            .ignore()
            .del(&keys.groups)
            .ignore();

        if !record.groups.is_empty() {
            let members: Vec<&str> = record.groups.iter().map(String::as_str).collect();
            let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
            pipe.sadd(&keys.groups, members)
                .ignore()
                .expire(&keys.groups, ttl)
                .ignore();
        }

        pipe.query_async::<()>(&mut conn).await.map_err(|e| {
            log::error!(target: "shared_session::redis", "msg=\"session save failed\" error=\"{e}\"");
            SessionError::from(e)
        })
    }

    async fn delete(&self, keys: &SessionKeys) -> Result<(), SessionError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(keys.all().to_vec()).await?;
        Ok(())
    }

    async fn signature(&self, keys: &SessionKeys) -> Result<Option<String>, SessionError> {
        let mut conn = self.connection.clone();
        let signature: Option<String> = conn.get(&keys.signature).await?;
        Ok(signature)
    }

    async fn groups(&self, keys: &SessionKeys) -> Result<BTreeSet<String>, SessionError> {
        let mut conn = self.connection.clone();
        let groups: BTreeSet<String> = conn.smembers(&keys.groups).await?;
        Ok(groups)
    }
}
