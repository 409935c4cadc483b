#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use foundation::geo::{Camera, LonLat};
use foundation::time::Millis;
use formats::{PointKind, RegionStats, StatsTable, StoryConfig};
use story::{
    AnnotationPoint, Chapter, ChapterHook, ChapterRegistry, ChapterScript, HookContext,
    HookError, HookOutcome, MoveCompletion, PathAnimation, Presentation, RecordingChart,
    RecordingMap,
};

pub type Rehearsal = Presentation<RecordingMap, RecordingChart>;

/// Shared log of hook invocations, `"<label> <chapter> @<ms>"`.
pub type HookLog = Rc<RefCell<Vec<String>>>;

#[derive(Debug)]
pub struct Recorder {
    pub log: HookLog,
    pub label: &'static str,
    pub outcome: Result<HookOutcome, HookError>,
}

impl ChapterHook for Recorder {
    fn run(&mut self, ctx: &mut HookContext<'_>) -> Result<HookOutcome, HookError> {
        self.log
            .borrow_mut()
            .push(format!("{} {} @{}", self.label, ctx.chapter, ctx.now.0));
        self.outcome.clone()
    }
}

pub fn recorder(log: &HookLog, label: &'static str, outcome: Result<HookOutcome, HookError>) -> Recorder {
    Recorder {
        log: Rc::clone(log),
        label,
        outcome,
    }
}

pub fn camera(lon: f64, lat: f64) -> Camera {
    Camera::new(LonLat::new(lon, lat), 6.0)
}

pub fn scripted_chapter() -> Chapter {
    Chapter::new("chapter3", camera(121.5, 20.5))
        .with_captions("Ship-to-ship transfers", "Jun 2023")
        .show_layer_while_active("sts-heatmap")
        .with_script(ChapterScript {
            points: vec![
                AnnotationPoint::new(LonLat::new(121.0, 20.0), PointKind::BlinkingPing)
                    .with_delay(500)
                    .with_popup("<b>Rendezvous</b>", None),
                AnnotationPoint::new(LonLat::new(122.0, 21.0), PointKind::VesselMarker)
                    .with_delay(1000)
                    .with_popup("<b>Tanker</b>", Some("img/tanker.jpg".to_string())),
            ],
            paths: vec![PathAnimation::new("tracks/chapter3.geojson", 1500)],
        })
}

pub fn registry() -> ChapterRegistry {
    let mut registry = ChapterRegistry::new();
    for chapter in [
        Chapter::new("intro", camera(54.0, 25.0)),
        Chapter::new("chapter1", camera(56.3, 26.6)).with_captions("AIS gaps", "Jan 2023"),
        Chapter::new("chapter2", camera(57.0, 24.0)).with_captions("Spoofing", "Feb 2023"),
        scripted_chapter(),
        Chapter::new("fast", camera(50.0, 20.0)).fast_path(),
    ] {
        registry.register(chapter).expect("unique ids");
    }
    registry
}

pub fn region(location: &str, values: [f64; 5]) -> RegionStats {
    RegionStats {
        location: location.to_string(),
        light: values[0],
        dark: values[1],
        sts: values[2],
        spoofing: values[3],
        detections: values[4],
    }
}

pub fn stats() -> StatsTable {
    let mut stats = StatsTable::new();
    stats.insert("chapter1", region("Test Region", [100.0, 0.0, 0.0, 0.0, 200.0]));
    stats.insert("chapter2", region("Gulf of Oman", [40.0, 25.0, 10.0, 5.0, 20.0]));
    stats
}

pub fn rehearsal(completion: MoveCompletion) -> Rehearsal {
    Presentation::new(
        StoryConfig::default(),
        registry(),
        stats(),
        RecordingMap::new(completion),
        RecordingChart::default(),
    )
}

pub fn advance(p: &mut Rehearsal, ms: u64) {
    let end = p.now().after(ms);
    p.run_until(end, 16);
}

pub fn at(ms: u64) -> Millis {
    Millis(ms)
}

pub fn chapters_changed(p: &Rehearsal) -> Vec<String> {
    p.events().iter().map(|e| e.payload.chapter.clone()).collect()
}
