//! Time-driven pieces of the canvas: debounced field commits and the
//! overlay re-sync gate used while a panel animates open.
//!
//! Nothing here owns a timer. The controller asks a [`Clock`] for the
//! current instant and polls these structures from its frame tick, which
//! keeps the timing logic testable with a [`VirtualClock`].

use flowcanvas_core::NodeId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<Mutex<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, at: Duration) {
        *self.now.lock() = at;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Debounce slot: one per node field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebounceKey {
    pub node_id: NodeId,
    pub field: String,
}

impl DebounceKey {
    pub fn new(node_id: NodeId, field: impl Into<String>) -> Self {
        Self {
            node_id,
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Pending<V> {
    value: V,
    due: Duration,
    seq: u64,
}

/// Last-write-wins coalescing of values per key.
#[derive(Debug, Clone)]
pub struct Debouncer<V> {
    pending: HashMap<DebounceKey, Pending<V>>,
    seq: u64,
}

impl<V> Default for Debouncer<V> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            seq: 0,
        }
    }
}

impl<V> Debouncer<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, key: &DebounceKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Queue `value` under `key`, replacing any earlier value and restarting
    /// the delay. Returns whether an earlier value was superseded.
    pub fn schedule(&mut self, key: DebounceKey, value: V, now: Duration, delay: Duration) -> bool {
        self.seq += 1;
        self.pending
            .insert(
                key,
                Pending {
                    value,
                    due: now + delay,
                    seq: self.seq,
                },
            )
            .is_some()
    }

    pub fn cancel(&mut self, key: &DebounceKey) -> Option<V> {
        self.pending.remove(key).map(|p| p.value)
    }

    /// Drop every pending value belonging to `node_id`.
    pub fn cancel_node(&mut self, node_id: &NodeId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|key, _| &key.node_id != node_id);
        before - self.pending.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.due).min()
    }

    /// Remove and return every value whose delay has elapsed, oldest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<(DebounceKey, V)> {
        let due: Vec<DebounceKey> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= now)
            .map(|(k, _)| k.clone())
            .collect();
        self.take_keys(due)
    }

    /// Remove and return everything regardless of delay.
    pub fn flush(&mut self) -> Vec<(DebounceKey, V)> {
        let keys: Vec<DebounceKey> = self.pending.keys().cloned().collect();
        self.take_keys(keys)
    }

    fn take_keys(&mut self, keys: Vec<DebounceKey>) -> Vec<(DebounceKey, V)> {
        let mut taken: Vec<(u64, Duration, DebounceKey, V)> = keys
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|p| (p.seq, p.due, key, p.value))
            })
            .collect();
        taken.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        taken.into_iter().map(|(_, _, key, value)| (key, value)).collect()
    }
}

/// Suspends position-dependent recomputation while a panel animates open.
#[derive(Debug, Clone)]
pub struct ResyncGate {
    max_suspend: Duration,
    suspended_until: Option<Duration>,
}

impl ResyncGate {
    pub fn new(max_suspend: Duration) -> Self {
        Self {
            max_suspend,
            suspended_until: None,
        }
    }

    pub fn suspend(&mut self, now: Duration) {
        self.suspended_until = Some(now + self.max_suspend);
    }

    pub fn resume(&mut self) -> bool {
        self.suspended_until.take().is_some()
    }

    pub fn is_enabled(&self, now: Duration) -> bool {
        self.suspended_until.is_none_or(|until| now >= until)
    }

    /// Lift an expired suspension. Returns true when this call re-enabled
    /// tracking.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.suspended_until {
            Some(until) if now >= until => {
                self.suspended_until = None;
                true
            }
            _ => false,
        }
    }
}
