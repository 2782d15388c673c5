use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

pub const TTL_SECS: u64 = 15 * 60;

pub const ALL_USERS_KEY: &str = "all_users";
pub const ALL_TASKS_KEY: &str = "all_tasks";

/// In-process response cache for the hot list endpoints. Writes to an
/// entity delete its key; readers repopulate on the next miss. Entries
/// expire after TTL_SECS so a stale key never outlives restarts of the
/// write path.
pub struct Cache {
    entries: Mutex<HashMap<String, (Instant, Value)>>,
    ttl: Duration,
}

impl Cache {
    pub fn new() -> Cache {
        Cache::with_ttl(Duration::from_secs(TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Cache {
        Cache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    pub fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }
}

impl Default for Cache {
    fn default() -> Cache {
        Cache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_what_set_stored() {
        let cache = Cache::new();
        cache.set("k", json!([1, 2, 3]));
        assert_eq!(cache.get("k"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn delete_removes_the_key() {
        let cache = Cache::new();
        cache.set("k", json!("v"));
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn expired_entries_miss() {
        let cache = Cache::with_ttl(Duration::from_secs(0));
        cache.set("k", json!("v"));
        assert_eq!(cache.get("k"), None);
    }
}
