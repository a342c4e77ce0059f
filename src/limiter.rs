// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each identity (normally the caller IP) owns one [`RateRecord`]. The first
//! request opens a window of `window_secs`; up to `max_requests` requests are
//! counted inside it and the rest are refused until the window closes. A
//! periodic sweep drops records whose window has already closed.
//!
//! State lives behind the [`RateLimitStore`] trait so tests can hand each
//! limiter a fresh store, and the current time is always passed in.

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Per-identity counter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    pub identity: String,
    /// Requests counted inside the current window
    pub count: u32,
    /// When `count` resets to zero
    pub window_reset_at: DateTime<Utc>,
}

impl RateRecord {
    /// A record for the first request of a new window.
    pub fn opening(identity: &str, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            identity: identity.to_string(),
            count: 1,
            window_reset_at: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_reset_at
    }
}

/// Outcome of an atomic check-and-increment on an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Counted; carries the updated record
    Incremented(RateRecord),
    /// The window is still open and the limit is reached; nothing changed
    Exhausted(RateRecord),
    /// No live record for this identity (absent or its window closed)
    NoActiveWindow,
}

/// Storage for rate records.
///
/// Each method is a single atomic step with respect to one identity.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Current record for `identity`, expired or not.
    async fn get(&self, identity: &str) -> Option<RateRecord>;

    /// Store `record` if there is no record for its identity or the existing
    /// one has expired at `now`. Returns whether the record was stored.
    async fn set_if_absent_or_expired(&self, record: RateRecord, now: DateTime<Utc>) -> bool;

    /// Increment the live record for `identity` if its count is below `limit`.
    async fn increment_if_under_limit(
        &self,
        identity: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> IncrementOutcome;

    /// Remove every record whose window has closed at `now`. Returns how many
    /// were removed.
    async fn remove_expired(&self, now: DateTime<Utc>) -> usize;

    async fn len(&self) -> usize;
}

/// Process-local store guarded by a single lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRateStore {
    records: Arc<RwLock<HashMap<String, RateRecord>>>,
}

impl InMemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateStore {
    async fn get(&self, identity: &str) -> Option<RateRecord> {
        self.records.read().await.get(identity).cloned()
    }

    async fn set_if_absent_or_expired(&self, record: RateRecord, now: DateTime<Utc>) -> bool {
        let mut records = self.records.write().await;
        match records.get(&record.identity) {
            Some(existing) if !existing.is_expired(now) => false,
            _ => {
                records.insert(record.identity.clone(), record);
                true
            }
        }
    }

    async fn increment_if_under_limit(
        &self,
        identity: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> IncrementOutcome {
        let mut records = self.records.write().await;
        match records.get_mut(identity) {
            Some(record) if !record.is_expired(now) => {
                if record.count >= limit {
                    IncrementOutcome::Exhausted(record.clone())
                } else {
                    record.count += 1;
                    IncrementOutcome::Incremented(record.clone())
                }
            }
            _ => IncrementOutcome::NoActiveWindow,
        }
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// When the window resets
        reset_at: DateTime<Utc>,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    /// Create a rate limiter with a fresh in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryRateStore::new()))
    }

    pub fn with_store(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        let window = Duration::from_std(config.window_duration())
            .unwrap_or_else(|_| Duration::days(365));
        Self {
            config,
            window,
            store,
        }
    }

    /// Count one request for `identity` at `now`.
    ///
    /// Opening a window and incrementing an open one are each atomic in the
    /// store, so concurrent callers can never push the count past the limit.
    pub async fn check(&self, identity: &str, now: DateTime<Utc>) -> RateLimitResult {
        let limit = self.config.max_requests;
        loop {
            let opening = RateRecord::opening(identity, now, self.window);
            let reset_at = opening.window_reset_at;
            if self.store.set_if_absent_or_expired(opening, now).await {
                debug!(%identity, "Opened rate window");
                return RateLimitResult::Allowed {
                    remaining: limit.saturating_sub(1),
                    reset_at,
                };
            }

            match self.store.increment_if_under_limit(identity, limit, now).await {
                IncrementOutcome::Incremented(record) => {
                    return RateLimitResult::Allowed {
                        remaining: limit.saturating_sub(record.count),
                        reset_at: record.window_reset_at,
                    };
                }
                IncrementOutcome::Exhausted(record) => {
                    let retry_after = record.window_reset_at - now;
                    debug!(%identity, count = record.count, "Rate limit exceeded");
                    return RateLimitResult::Limited { retry_after };
                }
                // Swept or expired between the two steps; open a new window.
                IncrementOutcome::NoActiveWindow => continue,
            }
        }
    }

    pub async fn record(&self, identity: &str) -> Option<RateRecord> {
        self.store.get(identity).await
    }

    /// Drop expired records. Safe to run alongside request handling.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> usize {
        let removed = self.store.remove_expired(now).await;
        if removed > 0 {
            info!(removed, "Swept expired rate records");
        }
        removed
    }

    pub async fn tracked_identities(&self) -> usize {
        self.store.len().await
    }
}
