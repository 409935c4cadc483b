use foundation::handles::VisualHandle;

/// Deferred work queued on the presentation event loop.
///
/// Choreography actions carry the activation `epoch` they were scheduled
/// under; the dispatcher drops them if that activation is no longer current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    ShowMarker { epoch: u64, point: usize },
    ShowPopup { epoch: u64, point: usize },
    DrawPath { epoch: u64, path: usize },
    Pulse { epoch: u64, path: usize, remaining: u32 },
    /// End of an exit transition. Never guarded: it must run even after the
    /// owning chapter is gone.
    RemoveVisual(VisualHandle),
    ResumeTransition { generation: u64 },
    TransitionTimeout { generation: u64 },
    ChartFrame { run: u64 },
    ChartCollapse { hide: u64 },
}
