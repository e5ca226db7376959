//! In-memory agent store.
//!
//! The store is the single shared mutable resource of the registry. It is
//! constructed once and handed to every request handler; nothing else holds
//! writable access to the records, and readers only ever see cloned
//! snapshots.

use dashmap::DashMap;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{AgentInfo, RegisterRequest, unix_timestamp};

/// Concurrency-safe keyed collection of [`AgentInfo`] records.
///
/// Backed by a sharded concurrent map: operations on a single key are
/// atomic, reads of unrelated keys do not block on unrelated writes, and a
/// record can never be observed half-updated. Conflicting writes to the same
/// name resolve last-write-wins by completion order. There is no expiry:
/// a record lives until it is explicitly removed or the process exits.
#[derive(Debug, Default)]
pub struct AgentStore {
    agents: DashMap<String, AgentInfo>,
}

impl AgentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert or fully replace the record keyed by the request
    /// name.
    ///
    /// `registered_at` is stamped from the server clock here; any prior
    /// record for the name is discarded wholesale and returned.
    pub fn put(&self, request: RegisterRequest) -> RegistryResult<(AgentInfo, Option<AgentInfo>)> {
        request.validate()?;
        let info = request.into_record(unix_timestamp());
        let previous = self.agents.insert(info.name.clone(), info.clone());
        Ok((info, previous))
    }

    /// Delete the record for `name`, returning it.
    pub fn remove(&self, name: &str) -> RegistryResult<AgentInfo> {
        self.agents
            .remove(name)
            .map(|(_, info)| info)
            .ok_or_else(|| RegistryError::agent_not_found(name))
    }

    /// Look up the record for `name`.
    pub fn get(&self, name: &str) -> RegistryResult<AgentInfo> {
        self.agents
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::agent_not_found(name))
    }

    /// Snapshot of all current records, in unspecified order.
    pub fn list(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request(name: &str) -> RegisterRequest {
        RegisterRequest::new(name, format!("{name} description"), format!("http://{name}:8080"))
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let store = AgentStore::new();
        let before = unix_timestamp();

        let (stored, previous) = store
            .put(request("weather_agent").with_capability("weather_info"))
            .unwrap();
        assert!(previous.is_none());

        let fetched = store.get("weather_agent").unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.description, "weather_agent description");
        assert_eq!(fetched.capabilities, vec!["weather_info"]);
        assert!(fetched.registered_at >= before);
    }

    #[test]
    fn test_put_replaces_wholesale() {
        let store = AgentStore::new();
        store
            .put(request("agent").with_capability("old_capability"))
            .unwrap();

        let (stored, previous) = store
            .put(RegisterRequest::new("agent", "new description", "http://new:9090"))
            .unwrap();

        let previous = previous.unwrap();
        assert_eq!(previous.capabilities, vec!["old_capability"]);

        let fetched = store.get("agent").unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.description, "new description");
        assert_eq!(fetched.url, "http://new:9090");
        // Prior capabilities are discarded, not merged.
        assert!(fetched.capabilities.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_refreshes_timestamp() {
        let store = AgentStore::new();
        let (first, _) = store.put(request("agent")).unwrap();
        let (second, _) = store.put(request("agent")).unwrap();
        assert!(second.registered_at >= first.registered_at);
    }

    #[test]
    fn test_put_rejects_invalid_request_without_mutation() {
        let store = AgentStore::new();
        let err = store
            .put(RegisterRequest::new("", "desc", "http://x"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRegistration { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_not_found_and_store_unchanged() {
        let store = AgentStore::new();
        store.put(request("agent")).unwrap();

        let err = store.remove("no_such_agent").unwrap_err();
        assert!(matches!(err, RegistryError::AgentNotFound { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_returns_record() {
        let store = AgentStore::new();
        store.put(request("agent")).unwrap();

        let removed = store.remove("agent").unwrap();
        assert_eq!(removed.name, "agent");
        assert!(store.is_empty());
        assert!(store.get("agent").is_err());
    }

    #[test]
    fn test_list_returns_all_distinct_names() {
        let store = AgentStore::new();
        assert!(store.list().is_empty());

        for i in 0..5 {
            store.put(request(&format!("agent_{i}"))).unwrap();
        }

        let mut names: Vec<String> = store.list().into_iter().map(|a| a.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_concurrent_puts_with_distinct_names() {
        let store = Arc::new(AgentStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.put(request(&format!("agent_{i}"))).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 16);
        assert_eq!(store.list().len(), 16);
    }

    #[test]
    fn test_concurrent_puts_same_name_last_write_wins() {
        let store = Arc::new(AgentStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .put(RegisterRequest::new(
                            "agent",
                            format!("writer {i}"),
                            format!("http://host:{i}"),
                        ))
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Whichever writer finished last, the record is one of the written
        // values in full, never a mix.
        assert_eq!(store.len(), 1);
        let info = store.get("agent").unwrap();
        let writer: usize = info.description.trim_start_matches("writer ").parse().unwrap();
        assert_eq!(info.url, format!("http://host:{writer}"));
    }
}
