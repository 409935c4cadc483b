use serde::Serialize;

use foundation::handles::VisualHandle;
use foundation::ids::ChapterId;
use foundation::time::Millis;
use formats::{StatsTable, StoryConfig, StoryManifest, Track};
use runtime::event_bus::{Event, EventBus};
use runtime::event_loop::EventLoop;
use runtime::metrics::Metrics;
use runtime::timers::Scope;

use crate::action::Action;
use crate::chapter::ChapterRegistry;
use crate::chart::{ChartBinding, ChartState};
use crate::choreography::{ChapterContext, LiveVisuals, Stage};
use crate::error::StoryError;
use crate::orchestrator::{Orchestrator, StepOutcome, TransitionState};
use crate::script::ChapterScript;
use crate::surface::{ChartSurface, ChartVisibility, MapSurface};
use crate::tracks::TrackStore;

/// Broadcast once per completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterChanged {
    pub chapter: String,
}

impl ChapterChanged {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The whole scrollytelling runtime: chapter registry, orchestrator, chart
/// binding and the event loop that drives them, bound to one map and one
/// chart surface.
///
/// The host feeds it step-entered events, camera completions, fetched track
/// payloads and clock ticks. Everything else happens inside [`tick`].
///
/// [`tick`]: Presentation::tick
pub struct Presentation<M: MapSurface, C: ChartSurface> {
    config: StoryConfig,
    registry: ChapterRegistry,
    stats: StatsTable,
    map: M,
    chart: C,
    event_loop: EventLoop<Action>,
    bus: EventBus<ChapterChanged>,
    metrics: Metrics,
    tracks: TrackStore,
    chart_binding: ChartBinding,
    orchestrator: Orchestrator,
    cleanup: Scope,
}

impl<M: MapSurface, C: ChartSurface> Presentation<M, C> {
    pub fn new(
        config: StoryConfig,
        registry: ChapterRegistry,
        stats: StatsTable,
        map: M,
        chart: C,
    ) -> Self {
        let mut event_loop = EventLoop::new();
        let cleanup = event_loop.new_scope();
        let chart_scope = event_loop.new_scope();
        tracing::info!(chapters = registry.len(), regions = stats.len(), "presentation ready");
        Self {
            config,
            registry,
            stats,
            map,
            chart,
            event_loop,
            bus: EventBus::new(),
            metrics: Metrics::new(),
            tracks: TrackStore::new(),
            chart_binding: ChartBinding::new(chart_scope),
            orchestrator: Orchestrator::new(),
            cleanup,
        }
    }

    pub fn from_manifest(
        manifest: &StoryManifest,
        stats: StatsTable,
        map: M,
        chart: C,
    ) -> Result<Self, StoryError> {
        let registry = ChapterRegistry::from_manifest(manifest)?;
        Ok(Self::new(manifest.config.clone(), registry, stats, map, chart))
    }

    /// Moves the clock to the host's current time before anything is
    /// scheduled, so the first transition's delays count from there.
    pub fn starting_at(mut self, now: Millis) -> Self {
        self.tick(now);
        self
    }

    /// A scroll step was entered.
    pub fn enter_chapter(&mut self, id: &str) -> Result<StepOutcome, StoryError> {
        let (orchestrator, registry, mut stage) = self.split();
        let outcome = orchestrator.request(ChapterId::new(id), registry, &mut stage);
        self.publish_settled();
        outcome
    }

    /// The map finished a camera move started with
    /// [`MoveCompletion::External`](crate::surface::MoveCompletion::External).
    pub fn viewport_settled(&mut self) {
        let (orchestrator, registry, mut stage) = self.split();
        orchestrator.viewport_settled(registry, &mut stage);
        self.publish_settled();
    }

    /// Delivers a fetched track payload, or the reason the fetch failed.
    pub fn track_loaded(&mut self, resource: &str, payload: Result<&str, &str>) {
        self.tracks.resolve(resource, payload);
        self.track_arrived(resource);
    }

    /// Seeds a track without going through the host fetch.
    pub fn insert_track(&mut self, resource: &str, track: Track) {
        self.tracks.insert(resource, track);
        self.track_arrived(resource);
    }

    /// Track resources the host should fetch and report back through
    /// [`track_loaded`](Self::track_loaded).
    pub fn take_fetch_requests(&mut self) -> Vec<String> {
        self.tracks.take_requests()
    }

    /// Advances the clock to `now`: due timers fire in order, then the frame
    /// callbacks requested before this tick.
    pub fn tick(&mut self, now: Millis) {
        self.event_loop.begin_tick(now);
        while let Some((_, action)) = self.event_loop.pop_timer() {
            self.dispatch(action);
        }
        for (_, _, action) in self.event_loop.take_frames() {
            self.dispatch(action);
        }
        self.publish_settled();
    }

    /// Ticks every `step_ms` until `end`, the way a display refresh would.
    pub fn run_until(&mut self, end: Millis, step_ms: u64) {
        let step = step_ms.max(1);
        let mut now = self.now();
        while now < end {
            now = now.after(step).min(end);
            self.tick(now);
        }
    }

    pub fn now(&self) -> Millis {
        self.event_loop.now()
    }

    pub fn current_chapter(&self) -> Option<&ChapterId> {
        self.orchestrator.current()
    }

    pub fn state(&self) -> TransitionState {
        self.orchestrator.state()
    }

    pub fn active(&self) -> Option<&ChapterContext> {
        self.orchestrator.active()
    }

    pub fn live_visuals(&self) -> Option<&LiveVisuals> {
        self.orchestrator.active().map(ChapterContext::live)
    }

    pub fn chart_state(&self) -> &ChartState {
        self.chart_binding.state()
    }

    pub fn chart_visibility(&self) -> ChartVisibility {
        self.chart_binding.visibility()
    }

    pub fn events(&self) -> &[Event<ChapterChanged>] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<ChapterChanged>> {
        self.bus.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChapterRegistry {
        &self.registry
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn chart(&self) -> &C {
        &self.chart
    }

    fn split(&mut self) -> (&mut Orchestrator, &mut ChapterRegistry, Stage<'_>) {
        let stage = Stage {
            map: &mut self.map,
            event_loop: &mut self.event_loop,
            tracks: &mut self.tracks,
            metrics: &mut self.metrics,
            config: &self.config,
            cleanup: self.cleanup,
        };
        (&mut self.orchestrator, &mut self.registry, stage)
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::ShowMarker { epoch, point } => {
                self.with_active(epoch, |ctx, script, stage| ctx.show_marker(script, point, stage));
            }
            Action::ShowPopup { epoch, point } => {
                self.with_active(epoch, |ctx, script, stage| ctx.show_popup(script, point, stage));
            }
            Action::DrawPath { epoch, path } => {
                self.with_active(epoch, |ctx, script, stage| ctx.draw_path(script, path, stage));
            }
            Action::Pulse {
                epoch,
                path,
                remaining,
            } => {
                self.with_active(epoch, |ctx, script, stage| {
                    ctx.pulse(script, path, remaining, stage)
                });
            }
            Action::RemoveVisual(VisualHandle::Marker(handle)) => self.map.remove_marker(handle),
            Action::RemoveVisual(VisualHandle::Popup(handle)) => self.map.remove_popup(handle),
            Action::ResumeTransition { generation } => {
                let (orchestrator, registry, mut stage) = self.split();
                orchestrator.resume(generation, registry, &mut stage);
                self.publish_settled();
            }
            Action::TransitionTimeout { generation } => {
                let (orchestrator, registry, mut stage) = self.split();
                orchestrator.timeout(generation, registry, &mut stage);
                self.publish_settled();
            }
            Action::ChartFrame { run } => {
                let now = self.event_loop.now();
                self.chart_binding.on_frame(
                    run,
                    now,
                    self.config.chart_width_px,
                    &mut self.chart,
                    &mut self.event_loop,
                );
            }
            Action::ChartCollapse { hide } => self.chart_binding.on_collapse(hide, &mut self.chart),
        }
    }

    /// Runs `f` against the active chapter only if `epoch` is still the
    /// current activation. Late callbacks from an earlier activation are
    /// dropped here.
    fn with_active(
        &mut self,
        epoch: u64,
        f: impl FnOnce(&mut ChapterContext, &ChapterScript, &mut Stage<'_>),
    ) {
        let (orchestrator, registry, mut stage) = self.split();
        let Some(ctx) = orchestrator.active_mut().filter(|ctx| ctx.epoch == epoch) else {
            tracing::trace!(epoch, "dropping callback from a stale activation");
            stage.metrics.inc("callbacks.stale");
            return;
        };
        let Some(chapter) = registry.get(&ctx.chapter) else {
            return;
        };
        f(ctx, &chapter.script, &mut stage);
    }

    fn track_arrived(&mut self, resource: &str) {
        let (orchestrator, registry, mut stage) = self.split();
        let Some(ctx) = orchestrator.active_mut() else {
            return;
        };
        if let Some(chapter) = registry.get(&ctx.chapter) {
            ctx.track_arrived(&chapter.script, resource, &mut stage);
        }
    }

    fn publish_settled(&mut self) {
        for chapter in self.orchestrator.take_settled() {
            let tick = self.event_loop.tick();
            self.bus.emit(
                tick,
                self.event_loop.now(),
                ChapterChanged {
                    chapter: chapter.to_string(),
                },
            );
            self.chart_binding.chapter_changed(
                chapter.as_str(),
                &self.stats,
                &self.config,
                &mut self.chart,
                &mut self.event_loop,
            );
        }
    }
}

impl<M: MapSurface + std::fmt::Debug, C: ChartSurface + std::fmt::Debug> std::fmt::Debug
    for Presentation<M, C>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("current", &self.orchestrator.current())
            .field("state", &self.orchestrator.state())
            .field("now", &self.event_loop.now())
            .field("map", &self.map)
            .field("chart", &self.chart)
            .finish_non_exhaustive()
    }
}
