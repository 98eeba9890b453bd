//! Concurrent session registry with sliding expiration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use super::clock::{Clock, SystemClock};
use super::model::{Attachment, SessionEntry};

/// Process-wide map from session id to its attachments and deadline.
///
/// Backed by a sharded map, so operations on distinct sessions never wait on
/// each other and no lock is held across a request. Writes to the same key
/// are last-writer-wins: two concurrent upserts for one session may race and
/// the later one discards the earlier list.
#[derive(Debug)]
pub struct SessionRegistry {
    entries: DashMap<String, SessionEntry>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    /// Create a registry using the wall clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit time source.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Current time as seen by this registry.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Look up a session without refreshing it.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SessionEntry> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    fn deadline(&self) -> DateTime<Utc> {
        self.now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Replace the session's attachments and push its deadline to now + TTL.
    pub fn upsert(&self, id: &str, attachments: Vec<Attachment>) {
        let expires_at = self.deadline();

        self.entries.insert(
            id.to_string(),
            SessionEntry {
                attachments,
                expires_at,
            },
        );
    }

    /// Push an existing session's deadline to now + TTL without touching its
    /// attachments. Returns `false` when the session is not registered.
    pub fn touch(&self, id: &str) -> bool {
        let expires_at = self.deadline();
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of every entry.
    ///
    /// The returned values are owned, so callers can scan and mutate the
    /// registry without holding any shard lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, SessionEntry)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Unconditionally remove a session.
    pub fn remove(&self, id: &str) -> Option<SessionEntry> {
        self.entries.remove(id).map(|(_, entry)| entry)
    }

    /// Remove a session only if it is still expired at `now`.
    ///
    /// A session refreshed after a snapshot was taken survives.
    pub fn remove_expired(&self, id: &str, now: DateTime<Utc>) -> Option<SessionEntry> {
        self.entries
            .remove_if(id, |_, entry| entry.is_expired_at(now))
            .map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
