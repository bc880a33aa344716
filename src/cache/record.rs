//! Cache Record Module
//!
//! Defines the unit of storage held by the cache, with optional expiry.

use std::time::{Duration, Instant};

// == Record ==
/// A single cached key/value pair and its expiry metadata.
#[derive(Debug, Clone)]
pub struct Record<V> {
    /// The key, unique within a cache
    pub key: String,
    /// The caller's payload
    pub value: V,
    /// Absolute expiry instant, None = never expires
    pub expires_at: Option<Instant>,
}

impl<V> Record<V> {
    // == Constructor ==
    /// Creates a new record.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `value` - The payload
    /// * `expires_at` - Absolute expiry, usually from [`expiry_from_ttl`]
    pub fn new(key: String, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks whether the record has expired as of `now`.
    ///
    /// A record is expired once `now` reaches its expiry instant, so a record
    /// whose TTL has fully elapsed is never returned.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Checks whether the record has expired as of the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the record never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the record has expired
    /// - `Some(remaining)` if the record has a TTL and hasn't expired
    /// - `None` if the record has no TTL
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

// == Utility Functions ==
/// Computes the absolute expiry for a record written now.
///
/// A zero TTL means "never expires" and yields `None`, as does a TTL too
/// large to represent as an instant.
pub fn expiry_from_ttl(ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        return None;
    }
    Instant::now().checked_add(ttl)
}
