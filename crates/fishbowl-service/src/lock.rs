//! Named mutual-exclusion leases for the feed operation.
//!
//! The feed transaction is the only place where concurrent workers contend
//! over shared mutable state (the spender's balance), so it is guarded by a
//! named lock keyed per spender: `feed:<spenderId>`.
//!
//! The manager implements the classic set-if-absent-with-expiry lease
//! protocol: a caller that sets the key owns the lease until it releases it
//! or the lease times out. Auto-expiry means a crashed or stalled holder can
//! never deadlock the key, and also means two holders can briefly overlap,
//! which is why the storage layer's uniqueness constraint, not this lock, is
//! the authoritative double-spend guard. Lease tokens fence stale holders: a
//! release with an outdated token is a no-op, never an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use fishbowl_core::UserId;

/// How long `acquire` will wait for a busy key before giving up.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a granted lease lives before it auto-expires.
pub const DEFAULT_LEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling interval while waiting for a busy key.
const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The key could not be acquired within the wait window.
    #[error("lock busy: {key}")]
    Busy {
        /// The contended key.
        key: String,
    },
}

/// The lock key for a spender's feed operations.
#[must_use]
pub fn feed_lock_key(spender_id: &UserId) -> String {
    format!("feed:{spender_id}")
}

struct Lease {
    token: u64,
    expires_at: Instant,
}

/// Lease-based named lock manager.
///
/// In-memory implementation of the set-if-absent-with-expiry primitive. A
/// clustered deployment swaps the lease table for shared storage with the
/// same atomic primitive; every contract here (bounded wait, auto-expiry,
/// token-fenced idempotent release) is chosen to survive that swap.
pub struct LeaseLockManager {
    leases: Mutex<HashMap<String, Lease>>,
    next_token: AtomicU64,
}

impl LeaseLockManager {
    /// Create an empty lock manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Acquire the named lock, waiting up to `wait_timeout`.
    ///
    /// The returned guard releases the lease on drop.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Busy` if the key is still held when the wait
    /// window closes. Nothing is mutated in that case.
    pub async fn acquire(
        self: &Arc<Self>,
        key: &str,
        wait_timeout: Duration,
        lease_timeout: Duration,
    ) -> Result<LockGuard, LockError> {
        let deadline = Instant::now() + wait_timeout;

        loop {
            if let Some(token) = self.try_set_if_absent(key, lease_timeout) {
                return Ok(LockGuard {
                    manager: Arc::clone(self),
                    key: key.to_string(),
                    token,
                    released: false,
                });
            }

            if Instant::now() >= deadline {
                return Err(LockError::Busy {
                    key: key.to_string(),
                });
            }

            tokio::time::sleep(ACQUIRE_POLL_INTERVAL).await;
        }
    }

    /// The atomic primitive: claim the key if it is absent or its current
    /// lease has expired. Returns the new lease token on success.
    fn try_set_if_absent(&self, key: &str, lease_timeout: Duration) -> Option<u64> {
        let mut leases = self
            .leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        if let Some(lease) = leases.get(key) {
            if lease.expires_at > now {
                return None;
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        leases.insert(
            key.to_string(),
            Lease {
                token,
                expires_at: now + lease_timeout,
            },
        );
        Some(token)
    }

    /// Release the lease identified by `token`. Idempotent: releasing twice,
    /// or releasing after the lease expired and was taken over, is a no-op.
    fn release(&self, key: &str, token: u64) {
        let mut leases = self
            .leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if leases.get(key).is_some_and(|lease| lease.token == token) {
            leases.remove(key);
        }
    }
}

impl Default for LeaseLockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A held lease. Releases on drop, so every exit path of the critical
/// section, success or error, gives the key back.
pub struct LockGuard {
    manager: Arc<LeaseLockManager>,
    key: String,
    token: u64,
    released: bool,
}

impl LockGuard {
    /// Release the lease explicitly. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.manager.release(&self.key, self.token);
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT_WAIT: Duration = Duration::from_millis(30);
    const LEASE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn held_key_reports_busy() {
        let locks = Arc::new(LeaseLockManager::new());
        let _guard = locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();

        let second = locks.acquire("feed:a", SHORT_WAIT, LEASE).await;
        assert!(matches!(second, Err(LockError::Busy { .. })));
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let locks = Arc::new(LeaseLockManager::new());
        let _a = locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
        let _b = locks.acquire("feed:b", SHORT_WAIT, LEASE).await.unwrap();
    }

    #[tokio::test]
    async fn release_allows_reacquire() {
        let locks = Arc::new(LeaseLockManager::new());
        let guard = locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
        guard.release();

        locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
    }

    #[tokio::test]
    async fn drop_releases() {
        let locks = Arc::new(LeaseLockManager::new());
        {
            let _guard = locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
        }
        locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
    }

    #[tokio::test]
    async fn expired_lease_can_be_taken_over() {
        let locks = Arc::new(LeaseLockManager::new());
        let stale = locks
            .acquire("feed:a", SHORT_WAIT, Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        // The lease expired; a new caller takes the key over.
        let fresh = locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();

        // The stale holder's release must not evict the new lease.
        stale.release();
        let third = locks.acquire("feed:a", SHORT_WAIT, LEASE).await;
        assert!(matches!(third, Err(LockError::Busy { .. })));

        fresh.release();
        locks.acquire("feed:a", SHORT_WAIT, LEASE).await.unwrap();
    }

    #[test]
    fn lock_key_convention() {
        let spender = UserId::generate();
        assert_eq!(feed_lock_key(&spender), format!("feed:{spender}"));
    }
}
