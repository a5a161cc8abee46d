// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process [`CounterStore`] backed by a `DashMap`.
//!
//! Entries expire lazily: an expired entry is treated as absent by every
//! operation and removed when observed. Atomicity of `set_if_absent`,
//! `delete_if_equals`, and `increment` comes from DashMap's per-shard
//! entry locking.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use amora_core::{AmoraError, CounterStore};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process shared counter store.
///
/// Single-process deployments use this directly; multi-instance
/// deployments swap in a store backed by an external key/value service
/// behind the same trait.
#[derive(Default)]
pub struct MemoryStore {
    map: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries. Test and diagnostics helper; expired
    /// entries that have not been observed yet still count.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every entry, live or expired. Simulates a cache restart.
    pub fn clear(&self) {
        self.map.clear();
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AmoraError> {
        if let Some(entry) = self.map.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Drop the expired entry if it is still the one we observed.
        self.map.remove_if(key, |_, e| e.is_expired());
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), AmoraError> {
        self.map.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, AmoraError> {
        match self.map.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(CacheEntry::new(value, Some(ttl)));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value, Some(ttl)));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, AmoraError> {
        match self.map.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, AmoraError> {
        let removed = self
            .map
            .remove_if(key, |_, e| !e.is_expired() && e.value == expected);
        Ok(removed.is_some())
    }

    async fn increment(&self, key: &str) -> Result<i64, AmoraError> {
        match self.map.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(CacheEntry::new("1", None));
                    return Ok(1);
                }
                let current: i64 = occupied.get().value.parse().map_err(|_| {
                    AmoraError::Cache {
                        message: format!(
                            "counter {key} holds non-integer value {:?}",
                            occupied.get().value
                        ),
                    }
                })?;
                let next = current + 1;
                occupied.get_mut().value = next.to_string();
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new("1", None));
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AmoraError> {
        match self.map.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, AmoraError> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(store.exists("k").await.unwrap());

        assert!(store.delete("k").await.unwrap());
        assert!(store.get("k").await.unwrap().is_none());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set("short", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(store.exists("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get("short").await.unwrap().is_none());
        assert!(!store.exists("short").await.unwrap());
    }

    #[tokio::test]
    async fn set_if_absent_only_wins_once() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        assert!(store.set_if_absent("lock", "a", ttl).await.unwrap());
        assert!(!store.set_if_absent("lock", "b", ttl).await.unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn set_if_absent_reclaims_expired_entry() {
        let store = MemoryStore::new();
        assert!(store
            .set_if_absent("lock", "a", Duration::from_millis(20))
            .await
            .unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store
            .set_if_absent("lock", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn delete_if_equals_checks_the_value() {
        let store = MemoryStore::new();
        store.set("lock", "token-a", None).await.unwrap();

        assert!(!store.delete_if_equals("lock", "token-b").await.unwrap());
        assert!(store.exists("lock").await.unwrap());

        assert!(store.delete_if_equals("lock", "token-a").await.unwrap());
        assert!(!store.exists("lock").await.unwrap());
    }

    #[tokio::test]
    async fn increment_starts_at_one_and_counts_up() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("n").await.unwrap(), 1);
        assert_eq!(store.increment("n").await.unwrap(), 2);
        assert_eq!(store.increment("n").await.unwrap(), 3);
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn increment_restarts_after_expiry() {
        let store = MemoryStore::new();
        store.increment("n").await.unwrap();
        store
            .expire("n", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.increment("n").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn expire_on_missing_key_reports_false() {
        let store = MemoryStore::new();
        assert!(!store.expire("nope", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    store.increment("shared").await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get("shared").await.unwrap().as_deref(), Some("250"));
    }
}
