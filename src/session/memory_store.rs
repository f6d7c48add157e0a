//! In-memory session storage.
//!
//! Mirrors the Redis key layout (string entries for data and signature, a set
//! entry for groups, per-key expiry) so behavior can be checked without a
//! server. Suitable for development, testing, and single-instance deployments.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::store::{SessionRecord, SessionStore};
use super::SessionKeys;
use crate::SessionError;

#[derive(Debug, Clone)]
enum StoredValue {
    String(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// In-memory session storage.
///
/// Entries live in a `HashMap` protected by a `RwLock`; clones share the
/// same map. Expired entries are invisible to reads and removed by
/// [`prune_expired`](Self::prune_expired).
///
/// # Note
///
/// Sessions are lost when the process restarts, and an edge proxy cannot
/// read them. Use [`RedisSessionStore`](super::RedisSessionStore) for that.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .map(|guard| guard.values().filter(|entry| entry.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Utc::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|(_, entry)| entry.is_live(now))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Remaining time to live of a key in whole seconds, like Redis `TTL`.
    ///
    /// `None` for missing keys or keys without expiry.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        let now = Utc::now();
        let guard = self.entries.read().ok()?;
        let entry = guard.get(key).filter(|entry| entry.is_live(now))?;
        entry
            .expires_at
            .map(|expires_at| (expires_at - now).num_seconds())
    }

    /// Removes expired entries.
    ///
    /// Returns the number of keys pruned.
    #[allow(clippy::significant_drop_tightening)]
    pub fn prune_expired(&self) -> Result<u64, SessionError> {
        let mut entries = self.write()?;

        let now = Utc::now();
        let before_count = entries.len();

        entries.retain(|_, entry| entry.is_live(now));

        let pruned = before_count.saturating_sub(entries.len());
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>, SessionError> {
        self.entries
            .read()
            .map_err(|_| SessionError::Store("Lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>, SessionError> {
        self.entries
            .write()
            .map_err(|_| SessionError::Store("Lock poisoned".to_owned()))
    }

    fn live_entry(&self, key: &str) -> Result<Option<Entry>, SessionError> {
        let now = Utc::now();
        Ok(self
            .read()?
            .get(key)
            .filter(|entry| entry.is_live(now))
            .cloned())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, keys: &SessionKeys) -> Result<Option<Vec<u8>>, SessionError> {
        Ok(match self.live_entry(&keys.data)? {
            Some(Entry {
                value: StoredValue::String(data),
                ..
            }) => Some(data.into_bytes()),
            _ => None,
        })
    }

    async fn save(
        &self,
        keys: &SessionKeys,
        record: &SessionRecord,
        ttl_secs: u64,
    ) -> Result<(), SessionError> {
        if ttl_secs == 0 {
            return Err(SessionError::Configuration(
                "session TTL must be at least one second".to_owned(),
            ));
        }
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires_at = Some(Utc::now() + Duration::seconds(ttl));

        // one write lock for the whole record, matching MULTI/EXEC
        let mut entries = self.write()?;

        entries.insert(
            keys.data.clone(),
            Entry {
                value: StoredValue::String(record.data.clone()),
                expires_at,
            },
        );
        entries.insert(
            keys.signature.clone(),
            Entry {
                value: StoredValue::String(record.signature.clone()),
                expires_at,
            },
        );
        entries.remove(&keys.groups);
        if !record.groups.is_empty() {
            entries.insert(
                keys.groups.clone(),
                Entry {
                    value: StoredValue::Set(record.groups.clone()),
                    expires_at,
                },
            );
        }
        drop(entries);

        Ok(())
    }

    async fn delete(&self, keys: &SessionKeys) -> Result<(), SessionError> {
        let mut entries = self.write()?;
        for key in keys.all() {
            entries.remove(key);
        }
        drop(entries);
        Ok(())
    }

    async fn signature(&self, keys: &SessionKeys) -> Result<Option<String>, SessionError> {
        Ok(match self.live_entry(&keys.signature)? {
            Some(Entry {
                value: StoredValue::String(signature),
                ..
            }) => Some(signature),
            _ => None,
        })
    }

    async fn groups(&self, keys: &SessionKeys) -> Result<BTreeSet<String>, SessionError> {
        Ok(match self.live_entry(&keys.groups)? {
            Some(Entry {
                value: StoredValue::Set(groups),
                ..
            }) => groups,
            _ => BTreeSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(groups: &[&str]) -> SessionRecord {
        SessionRecord {
            data: r#"{"username":"joe@gmail.com"}"#.to_owned(),
            signature: "deadbeef".to_owned(),
            groups: groups.iter().map(|g| (*g).to_owned()).collect(),
        }
    }

    #[tokio::test]
    async fn test_save_writes_three_keys() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        store.save(&keys, &record(&["one", "three"]), 60).await.unwrap();

        assert_eq!(
            store.keys(),
            vec![
                "prefix:data:sid".to_owned(),
                "prefix:groups:sid".to_owned(),
                "prefix:signature:sid".to_owned(),
            ]
        );
        assert_eq!(
            store.load(&keys).await.unwrap(),
            Some(br#"{"username":"joe@gmail.com"}"#.to_vec())
        );
        assert_eq!(
            store.signature(&keys).await.unwrap(),
            Some("deadbeef".to_owned())
        );
        let groups: Vec<_> = store.groups(&keys).await.unwrap().into_iter().collect();
        assert_eq!(groups, vec!["one".to_owned(), "three".to_owned()]);
    }

    #[tokio::test]
    async fn test_keys_share_ttl() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        store.save(&keys, &record(&["one"]), 3600).await.unwrap();

        for key in keys.all() {
            let ttl = store.ttl(key).unwrap();
            assert!((3598..=3600).contains(&ttl), "ttl for {key} was {ttl}");
        }
    }

    #[tokio::test]
    async fn test_save_rewrites_groups() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        store.save(&keys, &record(&["one", "two"]), 60).await.unwrap();
        store.save(&keys, &record(&["three"]), 60).await.unwrap();

        let groups: Vec<_> = store.groups(&keys).await.unwrap().into_iter().collect();
        assert_eq!(groups, vec!["three".to_owned()]);
    }

    #[tokio::test]
    async fn test_save_without_groups_leaves_groups_key_deleted() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        store.save(&keys, &record(&["one"]), 60).await.unwrap();
        store.save(&keys, &record(&[]), 60).await.unwrap();

        assert!(store.groups(&keys).await.unwrap().is_empty());
        assert!(store.ttl(&keys.groups).is_none());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_all_keys() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");
        let other = SessionKeys::new("prefix", "other");

        store.save(&keys, &record(&["one"]), 60).await.unwrap();
        store.save(&other, &record(&[]), 60).await.unwrap();

        store.delete(&keys).await.unwrap();

        assert!(store.load(&keys).await.unwrap().is_none());
        assert!(store.signature(&keys).await.unwrap().is_none());
        assert!(store.groups(&keys).await.unwrap().is_empty());
        assert!(store.load(&other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_nonexistent() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "nonexistent");

        assert!(store.load(&keys).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible_and_pruned() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        store.save(&keys, &record(&["one"]), 1).await.unwrap();
        assert_eq!(store.len(), 3);

        std::thread::sleep(std::time::Duration::from_millis(1100));

        assert!(store.load(&keys).await.unwrap().is_none());
        assert!(store.groups(&keys).await.unwrap().is_empty());
        assert!(store.is_empty());

        let pruned = store.prune_expired().unwrap();
        assert_eq!(pruned, 3);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_rejected() {
        let store = InMemorySessionStore::new();
        let keys = SessionKeys::new("prefix", "sid");

        let result = store.save(&keys, &record(&["one"]), 0).await;

        assert!(matches!(result, Err(SessionError::Configuration(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = InMemorySessionStore::new();
        let clone = store.clone();
        let keys = SessionKeys::new("prefix", "sid");

        clone.save(&keys, &record(&[]), 60).await.unwrap();

        assert!(store.load(&keys).await.unwrap().is_some());
    }
}
