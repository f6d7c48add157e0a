mod interface;
mod keys;
mod memory_store;
#[cfg(feature = "redis_store")]
mod redis_store;
mod store;

use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use interface::SessionInterface;
pub use keys::SessionKeys;
pub use memory_store::InMemorySessionStore;
#[cfg(feature = "redis_store")]
pub use redis_store::RedisSessionStore;
pub use store::{SessionRecord, SessionStore};

use crate::SessionError;

/// Session entry whose members are mirrored into the `groups` set.
pub const GROUPS_KEY: &str = "groups";

/// Payload entry carrying the permanent flag between requests.
pub const PERMANENT_KEY: &str = "_permanent";

/// Generates a new session id (random UUID v4).
pub fn generate_sid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory session state for one request.
///
/// Any mutation sets the `modified` flag. The id is replaced by
/// [`regenerate`](Self::regenerate) and cleared by [`destroy`](Self::destroy);
/// in both cases the old id is remembered so its stored keys can be purged.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    sid: Option<String>,
    data: Map<String, Value>,
    permanent: bool,
    modified: bool,
    retired: Vec<String>,
}

impl Session {
    pub fn new(sid: impl Into<String>, permanent: bool) -> Self {
        Self::with_data(sid, Map::new(), permanent)
    }

    pub fn with_data(sid: impl Into<String>, data: Map<String, Value>, permanent: bool) -> Self {
        Self {
            sid: Some(sid.into()),
            data,
            permanent,
            modified: false,
            retired: Vec::new(),
        }
    }

    /// Rebuilds a session from a stored payload.
    ///
    /// The `_permanent` entry is lifted out of the data; `default_permanent`
    /// applies only when it is missing.
    pub fn restore(
        sid: impl Into<String>,
        mut data: Map<String, Value>,
        default_permanent: bool,
    ) -> Self {
        let permanent = match data.remove(PERMANENT_KEY) {
            Some(Value::Bool(permanent)) => permanent,
            _ => default_permanent,
        };
        Self::with_data(sid, data, permanent)
    }

    /// Creates an empty session with a freshly generated id.
    pub fn fresh(permanent: bool) -> Self {
        Self::new(generate_sid(), permanent)
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn set_permanent(&mut self, permanent: bool) {
        self.permanent = permanent;
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Reads and deserializes an entry.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        self.data
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(SessionError::from)
    }

    /// Serializes and stores an entry, returning the previous value.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<Value>, SessionError> {
        let value = serde_json::to_value(value)?;
        self.modified = true;
        Ok(self.data.insert(key.into(), value))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.modified = true;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Group tokens held under the `"groups"` entry.
    ///
    /// Non-string members are ignored and duplicates collapse.
    pub fn groups(&self) -> BTreeSet<String> {
        match self.data.get(GROUPS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(ToOwned::to_owned))
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    pub fn set_groups<I, G>(&mut self, groups: I)
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        let groups: BTreeSet<String> = groups.into_iter().map(Into::into).collect();
        let items = groups.into_iter().map(Value::String).collect();
        self.data.insert(GROUPS_KEY.to_owned(), Value::Array(items));
        self.modified = true;
    }

    /// Replaces the session id, keeping the data.
    ///
    /// Returns the previous id, if any.
    pub fn regenerate(&mut self) -> Option<String> {
        let previous = self.sid.replace(generate_sid());
        if let Some(ref old) = previous {
            self.retired.push(old.clone());
        }
        self.modified = true;
        previous
    }

    /// Clears the session id. Saving a destroyed session removes the cookie.
    pub fn destroy(&mut self) -> Option<String> {
        let previous = self.sid.take();
        if let Some(ref old) = previous {
            self.retired.push(old.clone());
        }
        previous
    }

    /// Serializes the data together with the permanent flag.
    pub fn to_json(&self) -> Result<String, SessionError> {
        let mut payload = self.data.clone();
        payload.insert(PERMANENT_KEY.to_owned(), Value::Bool(self.permanent));
        serde_json::to_string(&payload).map_err(SessionError::from)
    }

    pub(crate) fn take_retired(&mut self) -> Vec<String> {
        std::mem::take(&mut self.retired)
    }
}
