use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Response cache keyed by request path (query string included).
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<DashMap<String, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.value().clone();
        serde_json::from_value(value).ok()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops `prefix` and everything below it: `/api/bookings` also clears
    /// `/api/bookings/client` and `/api/bookings?x=1`, but not `/api/bookingsx`.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !covers(prefix, key));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn covers(prefix: &str, key: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
