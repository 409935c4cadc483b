use foundation::time::Millis;

use crate::frame::Tick;
use crate::frame_requests::{FrameHandle, FrameRequests};
use crate::timers::{Scope, TimerId, TimerQueue};

/// Single-threaded cooperative event loop over virtual time.
///
/// The host drives it one tick at a time:
///
/// 1. [`EventLoop::begin_tick`] with the host timestamp.
/// 2. [`EventLoop::pop_timer`] until it returns `None`. While a timer is being
///    handled the loop clock reads that timer's due time, so a chain of delays
///    (`marker` then `popup` 300 ms later) lands on the same instants no matter
///    how coarse the host ticks are.
/// 3. [`EventLoop::take_frames`] once, then handle each frame callback at the
///    tick timestamp.
///
/// Actions are plain data (`A`); the owner decides what they mean.
#[derive(Debug)]
pub struct EventLoop<A> {
    tick: Tick,
    target: Millis,
    next_scope: u64,
    timers: TimerQueue<A>,
    frames: FrameRequests<A>,
}

impl<A> Default for EventLoop<A> {
    fn default() -> Self {
        Self {
            tick: Tick::new(0, Millis::ZERO),
            target: Millis::ZERO,
            next_scope: 0,
            timers: TimerQueue::new(),
            frames: FrameRequests::new(),
        }
    }
}

impl<A> EventLoop<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.tick.now
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn new_scope(&mut self) -> Scope {
        let scope = Scope(self.next_scope);
        self.next_scope = self.next_scope.wrapping_add(1);
        scope
    }

    /// Schedules `action` to run `delay_ms` after the current loop time.
    pub fn schedule(&mut self, delay_ms: u64, scope: Scope, action: A) -> TimerId {
        self.timers.schedule(self.tick.now.after(delay_ms), scope, action)
    }

    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    pub fn request_frame(&mut self, scope: Scope, action: A) -> FrameHandle {
        self.frames.request(scope, action)
    }

    pub fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        self.frames.cancel(handle)
    }

    /// Cancels every timer and frame request in `scope`.
    pub fn cancel_scope(&mut self, scope: Scope) -> usize {
        let dropped = self.timers.cancel_scope(scope) + self.frames.cancel_scope(scope);
        if dropped > 0 {
            tracing::trace!(scope = scope.0, dropped, "cancelled scope");
        }
        dropped
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_in_scope(&self, scope: Scope) -> usize {
        self.timers.pending_in_scope(scope)
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.frames.is_empty()
    }

    /// Starts a tick at `now`. A timestamp earlier than the loop clock is
    /// clamped; time never runs backwards.
    pub fn begin_tick(&mut self, now: Millis) -> Tick {
        if now < self.tick.now {
            tracing::trace!(now = now.0, clock = self.tick.now.0, "clamped stale tick");
        }
        self.target = now.max(self.tick.now);
        self.tick = Tick::new(self.tick.index + 1, self.tick.now);
        Tick::new(self.tick.index, self.target)
    }

    /// Pops the next timer due within the current tick and moves the loop
    /// clock to its due time.
    pub fn pop_timer(&mut self) -> Option<(Scope, A)> {
        let (due, scope, action) = self.timers.pop_due(self.target)?;
        self.tick.now = self.tick.now.max(due);
        Some((scope, action))
    }

    /// Moves the clock to the tick timestamp and takes the frame callbacks
    /// requested before this point.
    pub fn take_frames(&mut self) -> Vec<(FrameHandle, Scope, A)> {
        self.tick.now = self.target;
        self.frames.take_ready()
    }
}
