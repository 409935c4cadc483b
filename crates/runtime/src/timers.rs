use foundation::time::Millis;

/// Deterministic timer queue for cooperative choreography.
///
/// Key properties:
/// - Total ordering on `(due, id)`.
/// - Timers due at the same instant fire in insertion order.
/// - Cancelling one timer does not perturb the order of the rest.
/// - Every timer belongs to a [`Scope`], and a scope can be cancelled en masse.
///
/// Vec-backed with linear scans: a presentation keeps a few dozen timers
/// alive at most.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Cancellation group for timers and frame requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Key {
    due: Millis,
    id: TimerId,
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
struct Entry<A> {
    key: Key,
    scope: Scope,
    action: A,
}

#[derive(Debug)]
pub struct TimerQueue<A> {
    next_id: u64,
    entries: Vec<Entry<A>>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule(&mut self, due: Millis, scope: Scope, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            key: Key { due, id },
            scope,
            action,
        });
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key.id != id);
        self.entries.len() != before
    }

    /// Cancels every pending timer in `scope`, returning how many were dropped.
    pub fn cancel_scope(&mut self, scope: Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.scope != scope);
        before - self.entries.len()
    }

    pub fn pending_in_scope(&self, scope: Scope) -> usize {
        self.entries.iter().filter(|e| e.scope == scope).count()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.iter().map(|e| e.key).min().map(|k| k.due)
    }

    /// Pops the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, Scope, A)> {
        let mut best_idx: Option<usize> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.key.due > now {
                continue;
            }
            match best_idx {
                None => best_idx = Some(idx),
                Some(best) => {
                    if entry.key < self.entries[best].key {
                        best_idx = Some(idx);
                    }
                }
            }
        }

        let idx = best_idx?;
        let entry = self.entries.swap_remove(idx);
        Some((entry.key.due, entry.scope, entry.action))
    }
}

#[cfg(test)]
mod tests {
    use super::{Scope, TimerQueue};
    use foundation::time::Millis;

    const S: Scope = Scope(1);

    #[test]
    fn fires_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(1000), S, "late");
        q.schedule(Millis(500), S, "early");

        assert_eq!(q.pop_due(Millis(2000)).map(|t| t.2), Some("early"));
        assert_eq!(q.pop_due(Millis(2000)).map(|t| t.2), Some("late"));
        assert!(q.pop_due(Millis(2000)).is_none());
    }

    #[test]
    fn same_due_is_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(10), S, "a");
        q.schedule(Millis(10), S, "b");
        q.schedule(Millis(10), S, "c");

        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(Millis(10)).map(|t| t.2)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn not_yet_due_stays_queued() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(300), S, "x");
        assert!(q.pop_due(Millis(299)).is_none());
        assert_eq!(q.next_due(), Some(Millis(300)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancel_removes_single_timer() {
        let mut q = TimerQueue::new();
        let a = q.schedule(Millis(1), S, "a");
        q.schedule(Millis(2), S, "b");
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.pop_due(Millis(5)).map(|t| t.2), Some("b"));
    }

    #[test]
    fn cancel_scope_only_touches_that_scope() {
        let mut q = TimerQueue::new();
        q.schedule(Millis(1), Scope(1), "a");
        q.schedule(Millis(2), Scope(2), "b");
        q.schedule(Millis(3), Scope(1), "c");

        assert_eq!(q.cancel_scope(Scope(1)), 2);
        assert_eq!(q.pending_in_scope(Scope(2)), 1);
        assert_eq!(q.pop_due(Millis(5)).map(|t| t.2), Some("b"));
        assert!(q.is_empty());
    }
}
