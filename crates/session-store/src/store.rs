//! In-memory stand-in for the collaborator-side session cache.
//!
//! Keys are opaque session identifiers; values are the primitive trees
//! produced by [`crate::sanitize::sanitize`]. The clock is an explicit
//! parameter so expiry is testable without sleeping.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Default lifetime of a stored batch.
pub const DEFAULT_TTL_SECONDS: i64 = 1800;

struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl_seconds(DEFAULT_TTL_SECONDS)
    }
}

impl SessionStore {
    pub fn with_ttl_seconds(seconds: i64) -> Self {
        Self {
            ttl: Duration::seconds(seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a sanitized batch under `session_id`, resetting its expiry.
    pub fn put(&self, session_id: &str, value: Value, now: DateTime<Utc>) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(
            session_id.to_string(),
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Read a stored batch. Expired entries read as absent and are dropped.
    pub fn get(&self, session_id: &str, now: DateTime<Utc>) -> Option<Value> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match entries.get(session_id) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(session_id);
                None
            }
            None => None,
        }
    }

    pub fn remove(&self, session_id: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(session_id);
    }

    /// Drop every entry whose expiry has passed.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|_, entry| now < entry.expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
    }

    #[test]
    fn test_get_before_expiry_returns_value() {
        let store = SessionStore::default();
        store.put("s1", json!([{"entity_id": "1234"}]), at(0));
        assert_eq!(
            store.get("s1", at(DEFAULT_TTL_SECONDS - 1)),
            Some(json!([{"entity_id": "1234"}]))
        );
    }

    #[test]
    fn test_get_at_expiry_returns_none_and_drops_entry() {
        let store = SessionStore::default();
        store.put("s1", json!([]), at(0));
        assert_eq!(store.get("s1", at(DEFAULT_TTL_SECONDS)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_resets_expiry() {
        let store = SessionStore::with_ttl_seconds(60);
        store.put("s1", json!(1), at(0));
        store.put("s1", json!(2), at(50));
        assert_eq!(store.get("s1", at(100)), Some(json!(2)));
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let store = SessionStore::with_ttl_seconds(60);
        store.put("old", json!(1), at(0));
        store.put("new", json!(2), at(100));
        store.purge_expired(at(90));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("new", at(110)), Some(json!(2)));
    }

    #[test]
    fn test_unknown_key_is_absent() {
        let store = SessionStore::default();
        assert_eq!(store.get("missing", at(0)), None);
    }
}
