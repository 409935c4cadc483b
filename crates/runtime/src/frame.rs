use foundation::time::Millis;

/// One turn of the host's animation loop.
///
/// The host supplies `now`; the runtime only counts ticks. Keeping this small
/// and pure means a whole presentation run can be replayed from a list of
/// timestamps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tick {
    /// 0-based tick index.
    pub index: u64,
    /// Presentation time at this tick.
    pub now: Millis,
}

impl Tick {
    pub fn new(index: u64, now: Millis) -> Self {
        Self { index, now }
    }

    pub fn next(self, now: Millis) -> Self {
        Self::new(self.index + 1, now.max(self.now))
    }
}
