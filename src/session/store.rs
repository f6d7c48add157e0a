//! Session store trait.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::SessionKeys;
use crate::SessionError;

/// Everything written for a session on save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionRecord {
    /// Serialized session mapping.
    pub data: String,
    /// Detached cookie signature; empty when signing is disabled.
    pub signature: String,
    pub groups: BTreeSet<String>,
}

/// Storage backend for sessions.
///
/// Implementations:
/// - [`RedisSessionStore`](super::RedisSessionStore): shared with the proxy
/// - [`InMemorySessionStore`](super::InMemorySessionStore): single process, tests
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the raw data payload, if present and not expired.
    async fn load(&self, keys: &SessionKeys) -> Result<Option<Vec<u8>>, SessionError>;

    /// Writes the record in one atomic step.
    ///
    /// Data and signature are set with `ttl_secs`; the groups set is deleted
    /// and, when non-empty, rewritten with the same TTL.
    async fn save(
        &self,
        keys: &SessionKeys,
        record: &SessionRecord,
        ttl_secs: u64,
    ) -> Result<(), SessionError>;

    /// Deletes all three keys.
    async fn delete(&self, keys: &SessionKeys) -> Result<(), SessionError>;

    /// Reads the stored signature.
    async fn signature(&self, keys: &SessionKeys) -> Result<Option<String>, SessionError>;

    /// Reads the stored group set. Missing keys read as empty.
    async fn groups(&self, keys: &SessionKeys) -> Result<BTreeSet<String>, SessionError>;
}
