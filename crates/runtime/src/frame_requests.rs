use crate::timers::Scope;

/// Cancellation handle returned by [`FrameRequests::request`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(pub u64);

/// Pending animation-frame callbacks.
///
/// A request fires on the next tick only. Requests made while a tick is being
/// dispatched land in the following tick, which is what keeps per-frame
/// animations from spinning within a single frame.
#[derive(Debug)]
pub struct FrameRequests<A> {
    next_id: u64,
    pending: Vec<(FrameHandle, Scope, A)>,
}

impl<A> Default for FrameRequests<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<A> FrameRequests<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn request(&mut self, scope: Scope, action: A) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.push((handle, scope, action));
        handle
    }

    /// Returns `true` if the request had not fired yet.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _, _)| *h != handle);
        self.pending.len() != before
    }

    pub fn cancel_scope(&mut self, scope: Scope) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(_, s, _)| *s != scope);
        before - self.pending.len()
    }

    /// Takes every request registered so far, in request order.
    pub fn take_ready(&mut self) -> Vec<(FrameHandle, Scope, A)> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameRequests;
    use crate::timers::Scope;

    #[test]
    fn cancelled_request_never_fires() {
        let mut f = FrameRequests::new();
        let a = f.request(Scope(0), "a");
        f.request(Scope(0), "b");
        assert!(f.cancel(a));

        let ready: Vec<_> = f.take_ready().into_iter().map(|(_, _, a)| a).collect();
        assert_eq!(ready, vec!["b"]);
        assert!(f.is_empty());
    }

    #[test]
    fn cancel_scope_drops_matching_requests() {
        let mut f = FrameRequests::new();
        f.request(Scope(1), "a");
        f.request(Scope(2), "b");
        assert_eq!(f.cancel_scope(Scope(1)), 1);
        assert_eq!(f.len(), 1);
    }
}
