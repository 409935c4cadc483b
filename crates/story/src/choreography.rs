use std::rc::Rc;

use foundation::ease::ease_in_out_cubic;
use foundation::handles::{MarkerHandle, PopupHandle, VisualHandle};
use foundation::ids::{ChapterId, LayerId};
use foundation::time::TimeSpan;
use formats::{StoryConfig, Track};
use runtime::event_loop::EventLoop;
use runtime::frame_requests::FrameHandle;
use runtime::metrics::Metrics;
use runtime::timers::Scope;

use crate::action::Action;
use crate::script::{ChapterScript, Trigger};
use crate::surface::MapSurface;
use crate::tracks::{TrackState, TrackStore};

/// Everything choreography may touch while it runs.
pub(crate) struct Stage<'a> {
    pub map: &'a mut dyn MapSurface,
    pub event_loop: &'a mut EventLoop<Action>,
    pub tracks: &'a mut TrackStore,
    pub metrics: &'a mut Metrics,
    pub config: &'a StoryConfig,
    /// Scope for exit-transition removals; never cancelled.
    pub cleanup: Scope,
}

/// Markers, popups and layers created by one chapter activation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LiveVisuals {
    pub markers: Vec<MarkerHandle>,
    pub popups: Vec<PopupHandle>,
    pub layers: Vec<LayerId>,
}

impl LiveVisuals {
    pub fn len(&self) -> usize {
        self.markers.len() + self.popups.len() + self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
enum PathPhase {
    AwaitingTrack,
    Drawing { track: Rc<Track>, span: TimeSpan },
    Pulsing,
    Done,
    Skipped,
}

#[derive(Debug)]
struct PathRun {
    layer: LayerId,
    phase: PathPhase,
    frame: Option<FrameHandle>,
}

/// One activation of a chapter: its live visual set, in-flight path
/// animations, and the scope all of its timers are scheduled in.
///
/// The same generic choreography runs every chapter; what differs is the
/// [`ChapterScript`] handed in.
#[derive(Debug)]
pub struct ChapterContext {
    pub chapter: ChapterId,
    /// Unique per activation; re-entering a chapter gets a new epoch.
    pub epoch: u64,
    pub scope: Scope,
    /// Set once the exit edge has run; a preempting transition must not
    /// run it again.
    pub(crate) exited: bool,
    live: LiveVisuals,
    paths: Vec<PathRun>,
}

impl ChapterContext {
    pub(crate) fn new(chapter: ChapterId, epoch: u64, scope: Scope) -> Self {
        Self {
            chapter,
            epoch,
            scope,
            exited: false,
            live: LiveVisuals::default(),
            paths: Vec::new(),
        }
    }

    pub fn live(&self) -> &LiveVisuals {
        &self.live
    }

    /// Schedules point entrances and starts every path animation.
    pub(crate) fn animate(&mut self, script: &ChapterScript, stage: &mut Stage<'_>) {
        tracing::debug!(
            chapter = %self.chapter,
            points = script.points.len(),
            paths = script.paths.len(),
            "animating chapter"
        );

        self.cancel_path_frames(stage);
        self.schedule_points(script, Trigger::OnEnter, stage);

        self.paths = (0..script.paths.len())
            .map(|i| PathRun {
                layer: LayerId::for_path(&self.chapter, i),
                phase: PathPhase::AwaitingTrack,
                frame: None,
            })
            .collect();
        for index in 0..script.paths.len() {
            self.start_path(script, index, stage);
        }
    }

    /// Tears down everything the last `animate` created.
    ///
    /// Markers and popups get their exit transition and are removed once it
    /// elapses; path layers go immediately. Safe to call with nothing live.
    pub(crate) fn clear(&mut self, stage: &mut Stage<'_>) {
        self.cancel_path_frames(stage);
        stage.event_loop.cancel_scope(self.scope);
        self.paths.clear();

        let fade_ms = stage.config.exit_fade_ms;
        let visuals = self
            .live
            .markers
            .drain(..)
            .map(VisualHandle::Marker)
            .chain(self.live.popups.drain(..).map(VisualHandle::Popup));
        for visual in visuals {
            stage.map.begin_exit(visual, fade_ms);
            stage
                .event_loop
                .schedule(fade_ms, stage.cleanup, Action::RemoveVisual(visual));
        }

        for layer in self.live.layers.drain(..) {
            if let Err(e) = stage.map.remove_layer(&layer) {
                tracing::warn!(chapter = %self.chapter, %layer, error = %e, "failed to remove layer");
                stage.metrics.inc("surface.errors");
            }
        }
    }

    pub(crate) fn show_marker(&mut self, script: &ChapterScript, point: usize, stage: &mut Stage<'_>) {
        let Some(spec) = script.points.get(point) else {
            return;
        };
        match stage.map.place_marker(spec) {
            Ok(handle) => {
                self.live.markers.push(handle);
                if spec.popup.is_some() {
                    stage.event_loop.schedule(
                        stage.config.marker_settle_ms,
                        self.scope,
                        Action::ShowPopup {
                            epoch: self.epoch,
                            point,
                        },
                    );
                }
            }
            Err(e) => {
                tracing::error!(chapter = %self.chapter, point, error = %e, "marker placement failed");
                stage.metrics.inc("surface.errors");
            }
        }
    }

    pub(crate) fn show_popup(&mut self, script: &ChapterScript, point: usize, stage: &mut Stage<'_>) {
        let Some(spec) = script.points.get(point) else {
            return;
        };
        let Some(popup) = &spec.popup else {
            return;
        };
        match stage.map.place_popup(spec.popup_anchor(), popup, spec.offset) {
            Ok(handle) => self.live.popups.push(handle),
            Err(e) => {
                tracing::error!(chapter = %self.chapter, point, error = %e, "popup placement failed");
                stage.metrics.inc("surface.errors");
            }
        }
    }

    /// Picks up paths that were waiting on `resource`.
    pub(crate) fn track_arrived(&mut self, script: &ChapterScript, resource: &str, stage: &mut Stage<'_>) {
        let waiting: Vec<usize> = self
            .paths
            .iter()
            .enumerate()
            .filter(|(i, run)| {
                matches!(run.phase, PathPhase::AwaitingTrack)
                    && script.paths.get(*i).is_some_and(|p| p.resource == resource)
            })
            .map(|(i, _)| i)
            .collect();

        for index in waiting {
            match stage.tracks.state(resource) {
                Some(TrackState::Ready(track)) => {
                    let track = Rc::clone(track);
                    self.begin_drawing(script, index, track, stage);
                }
                Some(TrackState::Failed(reason)) => {
                    tracing::warn!(
                        chapter = %self.chapter,
                        path = index,
                        resource,
                        %reason,
                        "skipping path animation"
                    );
                    stage.metrics.inc("tracks.failed");
                    self.paths[index].phase = PathPhase::Skipped;
                }
                Some(TrackState::Requested) | None => {}
            }
        }
    }

    /// One animation frame of path `index`.
    pub(crate) fn draw_path(&mut self, script: &ChapterScript, index: usize, stage: &mut Stage<'_>) {
        let (Some(run), Some(path)) = (self.paths.get_mut(index), script.paths.get(index)) else {
            return;
        };
        run.frame = None;
        let PathPhase::Drawing { track, span } = &run.phase else {
            return;
        };

        let t = span.progress(stage.event_loop.now());
        let n = track.len();
        let shown = ((ease_in_out_cubic(t) * n as f64).ceil() as usize).clamp(n.min(2), n);
        if let Err(e) = stage.map.set_line_coords(&run.layer, &track.coords[..shown]) {
            tracing::warn!(chapter = %self.chapter, path = index, error = %e, "path frame dropped");
            stage.metrics.inc("surface.errors");
        }

        if t < 1.0 {
            run.frame = Some(stage.event_loop.request_frame(
                self.scope,
                Action::DrawPath {
                    epoch: self.epoch,
                    path: index,
                },
            ));
            return;
        }

        let pulses = path.pulses.min(stage.config.max_pulses).min(u32::MAX / 2);
        if pulses == 0 {
            self.finish_path(script, index, stage);
            return;
        }

        run.phase = PathPhase::Pulsing;
        self.set_highlight(index, true, stage);
        stage.event_loop.schedule(
            stage.config.pulse_interval_ms,
            self.scope,
            Action::Pulse {
                epoch: self.epoch,
                path: index,
                remaining: pulses * 2 - 1,
            },
        );
    }

    /// One highlight toggle. `remaining` counts toggles left, ending on "off".
    pub(crate) fn pulse(
        &mut self,
        script: &ChapterScript,
        index: usize,
        remaining: u32,
        stage: &mut Stage<'_>,
    ) {
        if !matches!(self.paths.get(index).map(|r| &r.phase), Some(PathPhase::Pulsing)) {
            return;
        }
        self.set_highlight(index, remaining % 2 == 0, stage);

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.finish_path(script, index, stage);
            return;
        }
        stage.event_loop.schedule(
            stage.config.pulse_interval_ms,
            self.scope,
            Action::Pulse {
                epoch: self.epoch,
                path: index,
                remaining,
            },
        );
    }

    fn start_path(&mut self, script: &ChapterScript, index: usize, stage: &mut Stage<'_>) {
        let Some(path) = script.paths.get(index) else {
            return;
        };
        match stage.tracks.state(&path.resource) {
            Some(TrackState::Ready(track)) => {
                let track = Rc::clone(track);
                self.begin_drawing(script, index, track, stage);
            }
            Some(TrackState::Requested) => {
                self.paths[index].phase = PathPhase::AwaitingTrack;
            }
            // Earlier failures are retried on every activation.
            Some(TrackState::Failed(_)) | None => {
                self.paths[index].phase = PathPhase::AwaitingTrack;
                stage.tracks.request(&path.resource);
            }
        }
    }

    fn begin_drawing(
        &mut self,
        script: &ChapterScript,
        index: usize,
        track: Rc<Track>,
        stage: &mut Stage<'_>,
    ) {
        let Some(path) = script.paths.get(index) else {
            return;
        };
        let run = &mut self.paths[index];
        if let Some(frame) = run.frame.take() {
            stage.event_loop.cancel_frame(frame);
        }

        if !self.live.layers.contains(&run.layer) {
            if let Err(e) = stage.map.add_line_layer(&run.layer, &path.style) {
                tracing::error!(chapter = %self.chapter, path = index, error = %e, "could not add path layer");
                stage.metrics.inc("surface.errors");
                run.phase = PathPhase::Skipped;
                return;
            }
            self.live.layers.push(run.layer.clone());
        }

        run.phase = PathPhase::Drawing {
            track,
            span: TimeSpan::starting_at(stage.event_loop.now(), path.duration_ms),
        };
        run.frame = Some(stage.event_loop.request_frame(
            self.scope,
            Action::DrawPath {
                epoch: self.epoch,
                path: index,
            },
        ));
    }

    fn finish_path(&mut self, script: &ChapterScript, index: usize, stage: &mut Stage<'_>) {
        if let Some(run) = self.paths.get_mut(index) {
            run.phase = PathPhase::Done;
        }
        tracing::debug!(chapter = %self.chapter, path = index, "path complete");
        self.schedule_points(script, Trigger::AfterPath(index), stage);
    }

    fn schedule_points(&self, script: &ChapterScript, trigger: Trigger, stage: &mut Stage<'_>) {
        for (point, spec) in script.points.iter().enumerate() {
            if spec.trigger != trigger {
                continue;
            }
            stage.event_loop.schedule(
                spec.delay_ms,
                self.scope,
                Action::ShowMarker {
                    epoch: self.epoch,
                    point,
                },
            );
        }
    }

    fn set_highlight(&mut self, index: usize, on: bool, stage: &mut Stage<'_>) {
        let Some(run) = self.paths.get(index) else {
            return;
        };
        if let Err(e) = stage.map.set_line_highlight(&run.layer, on) {
            tracing::warn!(chapter = %self.chapter, path = index, error = %e, "highlight failed");
            stage.metrics.inc("surface.errors");
        }
    }

    fn cancel_path_frames(&mut self, stage: &mut Stage<'_>) {
        for run in &mut self.paths {
            if let Some(frame) = run.frame.take() {
                stage.event_loop.cancel_frame(frame);
            }
        }
    }
}
