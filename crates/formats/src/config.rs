use serde::{Deserialize, Serialize};

/// Timing and layout knobs for a presentation.
///
/// Every field has a default, so a manifest only needs to name what it
/// overrides: `"config": { "chart_ms": 500 }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoryConfig {
    /// Camera fly duration when entering a chapter.
    pub camera_ms: u64,
    /// Gap between a marker appearing and its popup appearing.
    pub marker_settle_ms: u64,
    /// Exit transition length for markers and popups.
    pub exit_fade_ms: u64,
    /// Half-period of a path highlight pulse.
    pub pulse_interval_ms: u64,
    /// Upper bound on highlight pulses after a path finishes drawing.
    pub max_pulses: u32,
    /// Chart value interpolation length.
    pub chart_ms: u64,
    /// Chart fade-out before it is removed from layout.
    pub chart_fade_ms: u64,
    /// Width of the chart bar container in CSS pixels.
    pub chart_width_px: f64,
    /// How long a transition must have run before a fast-path chapter may
    /// preempt it.
    pub fast_path_guard_ms: u64,
    /// Hard ceiling on a single transition; past it the transition is forced
    /// to settle.
    pub transition_timeout_ms: u64,
    /// Chapter that hides the chart.
    pub intro_chapter: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            camera_ms: 2000,
            marker_settle_ms: 300,
            exit_fade_ms: 400,
            pulse_interval_ms: 400,
            max_pulses: 3,
            chart_ms: 750,
            chart_fade_ms: 300,
            chart_width_px: 300.0,
            fast_path_guard_ms: 250,
            transition_timeout_ms: 8000,
            intro_chapter: "intro".to_string(),
        }
    }
}
