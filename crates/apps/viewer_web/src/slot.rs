use std::cell::{Cell, RefCell};

use story::{ChapterChanged, ChartSurface, MapSurface, Presentation};

/// What a call produced besides its own result.
#[derive(Debug)]
pub(crate) struct Flushed<R> {
    pub out: R,
    pub fetches: Vec<String>,
    pub events: Vec<ChapterChanged>,
}

/// The loaded story, shared by every exported entry point.
///
/// Page callbacks can re-enter while a call is still inside the story (a
/// zero-length `flyTo` fires `moveend` synchronously). A re-entrant settle
/// signal is parked and applied before the outer call returns; any other
/// re-entrant call is dropped with a warning.
pub(crate) struct StorySlot<M: MapSurface, C: ChartSurface> {
    story: RefCell<Option<Presentation<M, C>>>,
    settle_pending: Cell<bool>,
}

impl<M: MapSurface, C: ChartSurface> StorySlot<M, C> {
    pub const fn new() -> Self {
        Self {
            story: RefCell::new(None),
            settle_pending: Cell::new(false),
        }
    }

    /// Returns false when the slot is busy and the story was not installed.
    pub fn install(&self, story: Presentation<M, C>) -> bool {
        match self.story.try_borrow_mut() {
            Ok(mut slot) => {
                *slot = Some(story);
                self.settle_pending.set(false);
                true
            }
            Err(_) => false,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Presentation<M, C>) -> R) -> Option<Flushed<R>> {
        let Ok(mut slot) = self.story.try_borrow_mut() else {
            tracing::warn!("story busy; re-entrant call dropped");
            return None;
        };
        let story = slot.as_mut()?;
        let out = f(story);
        while self.settle_pending.take() {
            story.viewport_settled();
        }
        Some(Flushed {
            out,
            fetches: story.take_fetch_requests(),
            events: story.drain_events().into_iter().map(|e| e.payload).collect(),
        })
    }

    pub fn viewport_settled(&self) -> Option<Flushed<()>> {
        if self.story.try_borrow_mut().is_err() {
            tracing::debug!("viewport settled during a story call; deferred");
            self.settle_pending.set(true);
            return None;
        }
        self.with(|story| story.viewport_settled())
    }
}

#[cfg(test)]
mod tests {
    use super::StorySlot;
    use foundation::geo::{Camera, LonLat};
    use formats::{StatsTable, StoryConfig};
    use story::{
        Chapter, ChapterRegistry, MoveCompletion, Presentation, RecordingChart, RecordingMap,
        TransitionState,
    };

    fn slot() -> StorySlot<RecordingMap, RecordingChart> {
        let mut registry = ChapterRegistry::new();
        registry
            .register(Chapter::new("chapter1", Camera::new(LonLat::new(56.0, 26.0), 6.0)))
            .expect("register");
        let slot = StorySlot::new();
        assert!(slot.install(Presentation::new(
            StoryConfig::default(),
            registry,
            StatsTable::new(),
            RecordingMap::new(MoveCompletion::External),
            RecordingChart::default(),
        )));
        slot
    }

    #[test]
    fn settle_during_a_call_is_applied_before_it_returns() {
        let slot = slot();
        let flushed = slot
            .with(|story| {
                story.enter_chapter("chapter1").expect("registered");
                assert!(slot.viewport_settled().is_none());
            })
            .expect("loaded");

        assert_eq!(flushed.events.len(), 1);
        assert_eq!(flushed.events[0].chapter, "chapter1");
        let state = slot.with(|story| story.state()).expect("loaded").out;
        assert_eq!(state, TransitionState::Idle);
    }

    #[test]
    fn other_reentrant_calls_are_dropped() {
        let slot = slot();
        let inner = slot.with(|_| slot.with(|story| story.state()).is_none());
        assert_eq!(inner.map(|f| f.out), Some(true));
    }

    #[test]
    fn empty_slot_ignores_calls() {
        let slot: StorySlot<RecordingMap, RecordingChart> = StorySlot::new();
        assert!(slot.viewport_settled().is_none());
        assert!(slot.with(|story| story.now()).is_none());
    }
}
