//! Keyed response cache with freshness windows.
//!
//! Each key moves through `Idle -> Loading -> Fresh -> Stale -> Refreshing`.
//! Stale data keeps being served while a refresh is in flight, a failed
//! refresh keeps the last good value, and entries nobody has looked at for
//! the retention window are dropped. All methods take `now` explicitly so
//! the state machine can be driven deterministically.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{FetchError, QueryKey};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_RETAIN_FOR: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Age at which a value stops being fresh
    pub stale_after: Duration,
    /// How long an unused entry survives
    pub retain_for: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            retain_for: DEFAULT_RETAIN_FOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Nothing cached, nothing in flight
    Idle,
    /// First fetch in flight
    Loading,
    Fresh,
    Stale,
    /// Stale value served while a new fetch is in flight
    Refreshing,
}

/// Handle for a fetch in flight. Completing with a ticket whose generation
/// has been superseded is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: Option<V>,
    /// Freshness clock; cleared by invalidation
    fetched_at: Option<Instant>,
    /// When `value` last changed; survives invalidation
    updated_at: Option<Instant>,
    error: Option<FetchError>,
    in_flight: Option<u64>,
    last_used: Instant,
}

impl<V> CacheEntry<V> {
    fn new(now: Instant) -> Self {
        Self {
            value: None,
            fetched_at: None,
            updated_at: None,
            error: None,
            in_flight: None,
            last_used: now,
        }
    }

    fn status(&self, now: Instant, policy: &CachePolicy) -> EntryStatus {
        match (&self.value, self.in_flight) {
            (None, None) => EntryStatus::Idle,
            (None, Some(_)) => EntryStatus::Loading,
            (Some(_), Some(_)) => EntryStatus::Refreshing,
            (Some(_), None) => match self.fetched_at {
                Some(at) if now.saturating_duration_since(at) < policy.stale_after => {
                    EntryStatus::Fresh
                }
                _ => EntryStatus::Stale,
            },
        }
    }
}

/// What a view of one key looks like.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<V> {
    /// False when there is no target to fetch for
    pub enabled: bool,
    pub status: EntryStatus,
    pub data: Option<V>,
    /// When `data` was last replaced by a successful fetch
    pub updated_at: Option<Instant>,
    pub error: Option<FetchError>,
}

impl<V> QueryState<V> {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            status: EntryStatus::Idle,
            data: None,
            updated_at: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == EntryStatus::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.status == EntryStatus::Refreshing
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.status, EntryStatus::Stale | EntryStatus::Refreshing)
    }

    /// Failure is only surfaced when there is nothing to show instead
    pub fn is_error(&self) -> bool {
        self.error.is_some() && self.data.is_none()
    }
}

#[derive(Debug)]
pub struct QueryCache<V> {
    entries: HashMap<QueryKey, CacheEntry<V>>,
    policy: CachePolicy,
    next_generation: u64,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            next_generation: 0,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, key: &QueryKey, now: Instant) -> EntryStatus {
        self.entries
            .get(key)
            .map(|e| e.status(now, &self.policy))
            .unwrap_or(EntryStatus::Idle)
    }

    /// True when a read at `now` should start a fetch
    pub fn needs_fetch(&self, key: &QueryKey, now: Instant) -> bool {
        matches!(self.status(key, now), EntryStatus::Idle | EntryStatus::Stale)
    }

    /// Current view of `key`; marks it used.
    pub fn state(&mut self, key: &QueryKey, now: Instant) -> QueryState<V> {
        let policy = self.policy;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = now;
                QueryState {
                    enabled: true,
                    status: entry.status(now, &policy),
                    data: entry.value.clone(),
                    updated_at: entry.updated_at,
                    error: entry.error.clone(),
                }
            }
            None => QueryState {
                enabled: true,
                status: EntryStatus::Idle,
                data: None,
                updated_at: None,
                error: None,
            },
        }
    }

    /// Mark a fetch as started. Returns `None` if one is already in flight.
    pub fn begin_fetch(&mut self, key: &QueryKey, now: Instant) -> Option<FetchTicket> {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(now));
        entry.last_used = now;
        if entry.in_flight.is_some() {
            return None;
        }

        self.next_generation += 1;
        entry.in_flight = Some(self.next_generation);
        Some(FetchTicket {
            key: key.clone(),
            generation: self.next_generation,
        })
    }

    /// Record a fetch result. Returns false if the ticket was superseded or
    /// the entry evicted; the result is then dropped.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<V, FetchError>,
        now: Instant,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            tracing::debug!("Dropping result for evicted key {}", ticket.key);
            return false;
        };
        if entry.in_flight != Some(ticket.generation) {
            tracing::debug!(
                "Dropping superseded result for {} (generation {})",
                ticket.key,
                ticket.generation
            );
            return false;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.value = Some(value);
                entry.fetched_at = Some(now);
                entry.updated_at = Some(now);
                entry.error = None;
            }
            Err(e) => {
                tracing::warn!("Fetch for {} failed: {}", ticket.key, e);
                entry.error = Some(e);
            }
        }
        true
    }

    /// Force the next read to refetch; any fetch in flight is superseded.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.fetched_at = None;
            entry.in_flight = None;
        }
    }

    /// Drop entries unused for the retention window. Returns how many went.
    pub fn collect_garbage(&mut self, now: Instant) -> usize {
        let retain_for = self.policy.retain_for;
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.in_flight.is_some()
                || now.saturating_duration_since(entry.last_used) < retain_for
        });
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!("Evicted {} unused cache entries", removed);
        }
        removed
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
