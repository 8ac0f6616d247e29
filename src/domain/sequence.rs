use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Proof that a request was issued for `key`; see [`RequestSequencer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    seq: u64,
}

/// Proof that a whole-collection reload was issued; see
/// [`RequestSequencer::begin_reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reload {
    generation: u64,
    issued_at: u64,
}

#[derive(Debug, Clone, Copy)]
struct Issued {
    seq: u64,
    at: u64,
}

#[derive(Debug)]
struct State<K> {
    latest: HashMap<K, Issued>,
    clock: u64,
    generation: u64,
}

/// Hands out monotonically increasing sequence numbers per entity so that a
/// response can be dropped when a newer request for the same entity has been
/// issued since. Last request issued wins, not last response received.
///
/// Reloads of the whole collection take part in the same ordering: a reload
/// response only covers entities with no request issued after the reload
/// itself was issued.
#[derive(Debug)]
pub struct RequestSequencer<K> {
    state: Mutex<State<K>>,
}

impl<K> Default for RequestSequencer<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                latest: HashMap::new(),
                clock: 0,
                generation: 0,
            }),
        }
    }
}

impl<K: Eq + Hash + Clone> RequestSequencer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn issue(&self, key: &K) -> Ticket<K> {
        let mut state = self.lock();
        state.clock += 1;
        let at = state.clock;
        let issued = state.latest.entry(key.clone()).or_insert(Issued { seq: 0, at });
        issued.seq += 1;
        issued.at = at;
        Ticket {
            key: key.clone(),
            seq: issued.seq,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.lock()
            .latest
            .get(&ticket.key)
            .is_some_and(|issued| issued.seq == ticket.seq)
    }

    /// Marks the start of a reload. Any reload or [`reset`](Self::reset)
    /// issued later supersedes this one.
    pub fn begin_reload(&self) -> Reload {
        let mut state = self.lock();
        state.generation += 1;
        Reload {
            generation: state.generation,
            issued_at: state.clock,
        }
    }

    /// Settles a reload whose response just arrived.
    ///
    /// Returns `None` when the reload was superseded and its response must be
    /// dropped. Otherwise invalidates every ticket issued before the reload
    /// and returns the keys with a request issued after it; for those keys
    /// the local state wins over the reload response.
    pub fn finish_reload(&self, reload: &Reload) -> Option<HashSet<K>> {
        let mut state = self.lock();
        if state.generation != reload.generation {
            return None;
        }
        let mut newer = HashSet::new();
        for (key, issued) in state.latest.iter_mut() {
            if issued.at > reload.issued_at {
                newer.insert(key.clone());
            } else {
                issued.seq += 1;
            }
        }
        Some(newer)
    }

    /// Invalidates every outstanding ticket and reload, e.g. when the
    /// session ends.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.generation += 1;
        for issued in state.latest.values_mut() {
            issued.seq += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_ticket_is_current() {
        let seq = RequestSequencer::new();
        let first = seq.issue(&"order-1");
        assert!(seq.is_current(&first));

        let second = seq.issue(&"order-1");
        assert!(!seq.is_current(&first));
        assert!(seq.is_current(&second));
    }

    #[test]
    fn keys_are_independent() {
        let seq = RequestSequencer::new();
        let a = seq.issue(&"a");
        let b = seq.issue(&"b");
        seq.issue(&"b");
        assert!(seq.is_current(&a));
        assert!(!seq.is_current(&b));
    }

    #[test]
    fn reset_invalidates_outstanding_tickets() {
        let seq = RequestSequencer::new();
        let a = seq.issue(&"a");
        seq.reset();
        assert!(!seq.is_current(&a));
        let again = seq.issue(&"a");
        assert!(seq.is_current(&again));
    }

    #[test]
    fn reload_supersedes_only_older_requests() {
        let seq = RequestSequencer::new();
        let before = seq.issue(&"a");
        let reload = seq.begin_reload();
        let after = seq.issue(&"b");

        let newer = seq.finish_reload(&reload).expect("reload is current");

        assert_eq!(newer, HashSet::from(["b"]));
        assert!(!seq.is_current(&before));
        assert!(seq.is_current(&after));
    }

    #[test]
    fn later_reload_or_reset_drops_an_earlier_reload() {
        let seq: RequestSequencer<&str> = RequestSequencer::new();
        let first = seq.begin_reload();
        let second = seq.begin_reload();
        assert_eq!(seq.finish_reload(&first), None);
        assert!(seq.finish_reload(&second).is_some());

        let third = seq.begin_reload();
        seq.reset();
        assert_eq!(seq.finish_reload(&third), None);
    }
}
