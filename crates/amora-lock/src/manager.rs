// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-process mutual exclusion on named resources.
//!
//! A lock is a store entry `lock:<resource>` holding a random token with
//! TTL = hold timeout. Acquisition is set-if-absent retried at a fixed
//! poll interval until the wait timeout; release is compare-and-delete on
//! the token, so a slow caller whose lock already expired can never
//! release someone else's lock. Locks self-expire, so a crashed holder
//! cannot wedge a resource.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use amora_config::LockConfig;
use amora_core::{AmoraError, CounterStore};

/// Proof of lock ownership. Only the holder of the token may release.
#[derive(Debug, Clone)]
pub struct LockToken {
    full_key: String,
    token: String,
}

impl LockToken {
    /// The full store key, including the `lock:` prefix.
    pub fn key(&self) -> &str {
        &self.full_key
    }
}

/// Distributed lock manager over a shared counter store.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn CounterStore>,
    config: LockConfig,
}

impl LockManager {
    pub fn new(store: Arc<dyn CounterStore>, config: LockConfig) -> Self {
        Self { store, config }
    }

    fn full_key(resource: &str) -> String {
        format!("lock:{resource}")
    }

    /// Acquire `resource` with the configured hold and wait timeouts.
    pub async fn acquire(&self, resource: &str) -> Result<LockToken, AmoraError> {
        self.acquire_with(
            resource,
            Duration::from_secs(self.config.hold_timeout_secs),
            Duration::from_secs(self.config.wait_timeout_secs),
        )
        .await
    }

    /// Acquire `resource` with explicit timeouts.
    ///
    /// Polls set-if-absent until `wait` elapses. A store failure during
    /// acquisition fails closed as the contention error; proceeding
    /// without mutual exclusion is never an option, the durable store's
    /// uniqueness constraints remain the last-resort backstop.
    pub async fn acquire_with(
        &self,
        resource: &str,
        hold: Duration,
        wait: Duration,
    ) -> Result<LockToken, AmoraError> {
        let full_key = Self::full_key(resource);
        let token = Uuid::new_v4().to_string();
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        let deadline = Instant::now() + wait;

        loop {
            match self.store.set_if_absent(&full_key, &token, hold).await {
                Ok(true) => {
                    debug!(resource, "lock acquired");
                    return Ok(LockToken { full_key, token });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(resource, error = %e, "lock store unavailable, failing closed");
                    return Err(AmoraError::LockTimeout {
                        key: resource.to_string(),
                        wait,
                    });
                }
            }
            if Instant::now() + poll > deadline {
                return Err(AmoraError::LockTimeout {
                    key: resource.to_string(),
                    wait,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Release a held lock. Returns `false` if the lock was no longer
    /// owned by `token` (it expired and may have been re-acquired).
    pub async fn release(&self, token: &LockToken) -> Result<bool, AmoraError> {
        let released = self
            .store
            .delete_if_equals(&token.full_key, &token.token)
            .await?;
        if released {
            debug!(key = %token.full_key, "lock released");
        }
        Ok(released)
    }

    /// Whether `resource` is currently locked by anyone.
    pub async fn is_locked(&self, resource: &str) -> Result<bool, AmoraError> {
        self.store.exists(&Self::full_key(resource)).await
    }

    /// Run `op` while holding the lock on `resource`.
    ///
    /// The release runs on every exit path, success or error. A release
    /// that finds the token no longer owned (self-expired hold timeout)
    /// or a store failure during release is logged, not propagated: the
    /// TTL guarantees the entry cannot outlive the hold timeout either way.
    pub async fn with_lock<T, F, Fut>(&self, resource: &str, op: F) -> Result<T, AmoraError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AmoraError>>,
    {
        let token = self.acquire(resource).await?;
        let result = op().await;
        match self.release(&token).await {
            Ok(true) => {}
            Ok(false) => warn!(resource, "lock expired before release"),
            Err(e) => warn!(resource, error = %e, "failed to release lock, TTL will evict it"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use amora_cache::MemoryStore;

    fn manager(hold_secs: u64, wait_secs: u64) -> (LockManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = LockConfig {
            hold_timeout_secs: hold_secs,
            wait_timeout_secs: wait_secs,
            poll_interval_ms: 10,
        };
        (LockManager::new(store.clone() as Arc<dyn CounterStore>, config), store)
    }

    #[tokio::test]
    async fn acquire_and_release() {
        let (locks, _store) = manager(10, 1);
        let token = locks.acquire("match:1:2").await.unwrap();
        assert!(locks.is_locked("match:1:2").await.unwrap());

        assert!(locks.release(&token).await.unwrap());
        assert!(!locks.is_locked("match:1:2").await.unwrap());
    }

    #[tokio::test]
    async fn contended_acquire_times_out() {
        let (locks, _store) = manager(10, 1);
        let _held = locks.acquire("match:1:2").await.unwrap();

        let started = Instant::now();
        let err = locks
            .acquire_with(
                "match:1:2",
                Duration::from_secs(10),
                Duration::from_millis(100),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AmoraError::LockTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn unrelated_resources_do_not_block() {
        let (locks, _store) = manager(10, 1);
        let _held = locks.acquire("match:1:2").await.unwrap();

        // A different pair acquires on the first poll, no waiting.
        let started = Instant::now();
        let other = locks.acquire("match:1:3").await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
        locks.release(&other).await.unwrap();
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired_but_not_released_by_old_holder() {
        let (locks, _store) = manager(10, 1);
        let stale = locks
            .acquire_with(
                "match:1:2",
                Duration::from_millis(20),
                Duration::from_millis(100),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Hold timeout elapsed; a second caller takes the lock over.
        let fresh = locks.acquire("match:1:2").await.unwrap();

        // The stale holder's compare-and-delete must not release it.
        assert!(!locks.release(&stale).await.unwrap());
        assert!(locks.is_locked("match:1:2").await.unwrap());

        assert!(locks.release(&fresh).await.unwrap());
    }

    #[tokio::test]
    async fn with_lock_releases_on_success_and_error() {
        let (locks, _store) = manager(10, 1);

        let value = locks
            .with_lock("match:1:2", || async { Ok::<_, AmoraError>(41 + 1) })
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert!(!locks.is_locked("match:1:2").await.unwrap());

        let err = locks
            .with_lock("match:1:2", || async {
                Err::<(), _>(AmoraError::Internal("boom".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AmoraError::Internal(_)));
        // Released on the error path too.
        assert!(!locks.is_locked("match:1:2").await.unwrap());
    }

    #[tokio::test]
    async fn with_lock_serializes_critical_sections() {
        let (locks, _store) = manager(10, 2);
        let locks = Arc::new(locks);
        let counter = Arc::new(tokio::sync::Mutex::new(0_i32));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                locks
                    .with_lock("match:1:2", || async {
                        let mut guard = counter.lock().await;
                        *guard += 1;
                        Ok::<_, AmoraError>(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(*counter.lock().await, 8);
        assert!(!locks.is_locked("match:1:2").await.unwrap());
    }
}
