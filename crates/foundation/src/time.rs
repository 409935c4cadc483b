/// Milliseconds on the presentation clock.
///
/// The clock is supplied by the host (animation-frame timestamps in a browser,
/// a manual counter in tests). Nothing in the workspace reads wall-clock time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn after(self, ms: u64) -> Self {
        Millis(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// A window of presentation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Millis,
    pub end: Millis,
}

impl TimeSpan {
    pub fn starting_at(start: Millis, duration_ms: u64) -> Self {
        Self {
            start,
            end: start.after(duration_ms),
        }
    }

    pub fn duration(&self) -> u64 {
        self.end.since(self.start)
    }

    /// Linear progress of `now` through the span, clamped to `[0, 1]`.
    ///
    /// A zero-length span is complete as soon as it starts.
    pub fn progress(&self, now: Millis) -> f64 {
        let duration = self.duration();
        if duration == 0 {
            return if now >= self.start { 1.0 } else { 0.0 };
        }
        (now.since(self.start) as f64 / duration as f64).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now: Millis) -> bool {
        now >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::{Millis, TimeSpan};

    #[test]
    fn since_saturates() {
        assert_eq!(Millis(10).since(Millis(4)), 6);
        assert_eq!(Millis(4).since(Millis(10)), 0);
    }

    #[test]
    fn progress_is_clamped() {
        let span = TimeSpan::starting_at(Millis(100), 200);
        assert_eq!(span.progress(Millis(50)), 0.0);
        assert_eq!(span.progress(Millis(200)), 0.5);
        assert_eq!(span.progress(Millis(900)), 1.0);
        assert!(span.is_complete(Millis(300)));
    }

    #[test]
    fn zero_length_span_completes_immediately() {
        let span = TimeSpan::starting_at(Millis(7), 0);
        assert_eq!(span.progress(Millis(7)), 1.0);
        assert!(span.is_complete(Millis(7)));
    }
}
