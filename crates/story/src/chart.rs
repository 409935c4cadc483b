use foundation::ease::{ease_in_out_cubic, lerp};
use foundation::time::{Millis, TimeSpan};
use formats::{CATEGORY_COUNT, Category, CategoryVector, StatsTable, StoryConfig};
use runtime::event_loop::EventLoop;
use runtime::frame_requests::FrameHandle;
use runtime::timers::Scope;

use crate::action::Action;
use crate::surface::{ChartSurface, ChartVisibility};

/// One rendered bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: Category,
    pub value: f64,
    pub width_px: f64,
    /// `"Light: 100"`.
    pub label: String,
    pub percent: f64,
    /// `"33.3%"`.
    pub percent_label: String,
}

/// Derived bar geometry and text for one chart frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub location: String,
    pub total: f64,
    /// Non-zero categories only, in category order.
    pub bars: Vec<Bar>,
}

impl ChartLayout {
    /// Lays out `values` in a container `width_px` wide.
    ///
    /// Bars share the width equally; only the number of non-zero categories
    /// matters, never their magnitude.
    pub fn compute(values: &CategoryVector, location: &str, width_px: f64) -> Self {
        let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
        let nonzero = values.iter().filter(|v| **v > 0.0).count();
        let width = if nonzero == 0 {
            0.0
        } else {
            width_px / nonzero as f64
        };

        let bars = Category::ALL
            .iter()
            .filter(|c| values[c.index()] > 0.0)
            .map(|&category| {
                let value = values[category.index()];
                let percent = if total > 0.0 {
                    (value / total * 1000.0).round() / 10.0
                } else {
                    0.0
                };
                Bar {
                    category,
                    value,
                    width_px: width,
                    label: format!("{}: {:.0}", category.label(), value),
                    percent,
                    percent_label: format!("{percent:.1}%"),
                }
            })
            .collect();

        Self {
            location: location.to_string(),
            total,
            bars,
        }
    }
}

/// Values currently bound to the chart. Survives hide/show so the next bind
/// interpolates from wherever the chart last was.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub values: CategoryVector,
    pub location: String,
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            values: [0.0; CATEGORY_COUNT],
            location: String::new(),
        }
    }
}

#[derive(Debug)]
struct Run {
    id: u64,
    from: CategoryVector,
    to: CategoryVector,
    span: TimeSpan,
    frame: Option<FrameHandle>,
}

/// Turns chapter-changed notifications into chart updates.
#[derive(Debug)]
pub struct ChartBinding {
    scope: Scope,
    state: ChartState,
    run: Option<Run>,
    next_run: u64,
    visibility: ChartVisibility,
    hide_generation: u64,
}

impl ChartBinding {
    pub(crate) fn new(scope: Scope) -> Self {
        Self {
            scope,
            state: ChartState::default(),
            run: None,
            next_run: 0,
            visibility: ChartVisibility::Hidden,
            hide_generation: 0,
        }
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn visibility(&self) -> ChartVisibility {
        self.visibility
    }

    pub fn is_interpolating(&self) -> bool {
        self.run.is_some()
    }

    pub(crate) fn chapter_changed(
        &mut self,
        chapter: &str,
        stats: &StatsTable,
        config: &StoryConfig,
        chart: &mut dyn ChartSurface,
        event_loop: &mut EventLoop<Action>,
    ) {
        let region = (chapter != config.intro_chapter)
            .then(|| stats.get(chapter))
            .flatten();
        match region {
            Some(region) => {
                tracing::debug!(chapter, location = %region.location, "binding chart");
                self.show(chart);
                self.bind_values(
                    region.values(),
                    &region.location,
                    config.chart_ms,
                    config.chart_width_px,
                    chart,
                    event_loop,
                );
            }
            None => {
                tracing::debug!(chapter, "no statistics for chapter; hiding chart");
                self.hide(config.chart_fade_ms, chart, event_loop);
            }
        }
    }

    /// Starts interpolating towards `target`, cancelling any run in flight.
    pub(crate) fn bind_values(
        &mut self,
        target: CategoryVector,
        location: &str,
        duration_ms: u64,
        width_px: f64,
        chart: &mut dyn ChartSurface,
        event_loop: &mut EventLoop<Action>,
    ) {
        self.cancel_run(event_loop);
        self.state.location = location.to_string();

        if duration_ms == 0 {
            self.state.values = target;
            chart.render(&ChartLayout::compute(&target, location, width_px));
            return;
        }

        let id = self.next_run;
        self.next_run += 1;
        let frame = event_loop.request_frame(self.scope, Action::ChartFrame { run: id });
        self.run = Some(Run {
            id,
            from: self.state.values,
            to: target,
            span: TimeSpan::starting_at(event_loop.now(), duration_ms),
            frame: Some(frame),
        });
    }

    pub(crate) fn on_frame(
        &mut self,
        run_id: u64,
        now: Millis,
        width_px: f64,
        chart: &mut dyn ChartSurface,
        event_loop: &mut EventLoop<Action>,
    ) {
        let Some(run) = self.run.as_mut().filter(|r| r.id == run_id) else {
            tracing::trace!(run_id, "stale chart frame");
            return;
        };

        let t = run.span.progress(now);
        if t >= 1.0 {
            self.state.values = run.to;
            self.run = None;
        } else {
            let eased = ease_in_out_cubic(t);
            let mut values = [0.0; CATEGORY_COUNT];
            for (i, v) in values.iter_mut().enumerate() {
                *v = lerp(run.from[i], run.to[i], eased);
            }
            self.state.values = values;
            run.frame =
                Some(event_loop.request_frame(self.scope, Action::ChartFrame { run: run_id }));
        }

        chart.render(&ChartLayout::compute(
            &self.state.values,
            &self.state.location,
            width_px,
        ));
    }

    pub(crate) fn show(&mut self, chart: &mut dyn ChartSurface) {
        // Bumping the generation orphans any pending collapse.
        self.hide_generation += 1;
        if self.visibility != ChartVisibility::Visible {
            self.visibility = ChartVisibility::Visible;
            chart.set_visibility(ChartVisibility::Visible);
        }
    }

    /// Fades the chart out, then removes it from layout after `fade_ms`.
    pub(crate) fn hide(
        &mut self,
        fade_ms: u64,
        chart: &mut dyn ChartSurface,
        event_loop: &mut EventLoop<Action>,
    ) {
        self.cancel_run(event_loop);
        if self.visibility != ChartVisibility::Visible {
            return;
        }
        self.hide_generation += 1;
        self.visibility = ChartVisibility::FadingOut;
        chart.set_visibility(ChartVisibility::FadingOut);
        event_loop.schedule(
            fade_ms,
            self.scope,
            Action::ChartCollapse {
                hide: self.hide_generation,
            },
        );
    }

    pub(crate) fn on_collapse(&mut self, hide: u64, chart: &mut dyn ChartSurface) {
        if hide != self.hide_generation || self.visibility != ChartVisibility::FadingOut {
            return;
        }
        self.visibility = ChartVisibility::Hidden;
        chart.set_visibility(ChartVisibility::Hidden);
    }

    fn cancel_run(&mut self, event_loop: &mut EventLoop<Action>) {
        if let Some(run) = self.run.take()
            && let Some(frame) = run.frame
        {
            event_loop.cancel_frame(frame);
        }
    }
}
