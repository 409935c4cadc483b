mod common;

use common::{advance, rehearsal};
use foundation::ids::LayerId;
use pretty_assertions::assert_eq;
use story::MoveCompletion;

const TRACK: &str = r#"{
    "type": "Feature",
    "properties": {},
    "geometry": {
        "type": "LineString",
        "coordinates": [[121.0, 20.0], [121.2, 20.1], [121.4, 20.3], [121.6, 20.4], [121.8, 20.6]]
    }
}"#;

#[test]
fn delayed_points_are_all_on_the_map_after_settling() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    let settle = p.config().marker_settle_ms;

    advance(&mut p, 1100 + settle);
    assert_eq!(p.map().markers.len(), 2);
    assert_eq!(p.map().popups.len(), 2);
    let live = p.live_visuals().expect("active chapter");
    assert_eq!(live.markers.len(), 2);
    assert_eq!(live.popups.len(), 2);
}

#[test]
fn popup_waits_for_its_marker_to_settle() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");

    advance(&mut p, 600);
    assert_eq!(p.map().markers.len(), 1);
    assert!(p.map().popups.is_empty());

    advance(&mut p, 300);
    assert_eq!(p.map().popups.len(), 1);
}

#[test]
fn track_is_fetched_once_and_drawn_into_a_chapter_layer() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    assert_eq!(p.take_fetch_requests(), vec!["tracks/chapter3.geojson"]);
    assert!(p.take_fetch_requests().is_empty());

    p.track_loaded("tracks/chapter3.geojson", Ok(TRACK));
    advance(&mut p, 2000);

    let layer = p
        .map()
        .layers
        .get(&LayerId::new("chapter3-path-0"))
        .expect("path layer");
    assert_eq!(layer.coords.len(), 5);
    assert_eq!(p.live_visuals().expect("active").layers.len(), 1);
}

#[test]
fn missing_track_keeps_independent_points() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    for resource in p.take_fetch_requests() {
        p.track_loaded(&resource, Err("HTTP 404"));
    }

    advance(&mut p, 2000);
    assert!(p.map().layers.is_empty());
    assert_eq!(p.map().markers.len(), 2);
    assert_eq!(p.map().popups.len(), 2);
    assert_eq!(p.metrics().counter("tracks.failed"), 1);
}

#[test]
fn failed_track_is_retried_on_the_next_visit() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    p.track_loaded("tracks/chapter3.geojson", Err("network down"));
    p.enter_chapter("chapter1").expect("registered");
    p.take_fetch_requests();

    p.enter_chapter("chapter3").expect("registered");
    assert_eq!(p.take_fetch_requests(), vec!["tracks/chapter3.geojson"]);
}

#[test]
fn leaving_a_chapter_removes_everything_it_placed() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    p.track_loaded("tracks/chapter3.geojson", Ok(TRACK));
    advance(&mut p, 2000);
    assert_eq!(p.map().visual_count(), 5);

    p.enter_chapter("chapter1").expect("registered");
    assert!(p.map().layers.is_empty());
    assert_eq!(p.map().exiting.len(), 4);

    let fade = p.config().exit_fade_ms;
    advance(&mut p, fade);
    assert_eq!(p.map().visual_count(), 0);
    assert!(p.map().exiting.is_empty());
}

#[test]
fn late_entrances_never_reach_the_next_chapter() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    advance(&mut p, 200);
    p.enter_chapter("chapter1").expect("registered");

    advance(&mut p, 3000);
    assert!(p.map().markers.is_empty());
    assert!(p.map().popups.is_empty());
    assert!(p.live_visuals().expect("active").is_empty());
}

#[test]
fn track_arriving_after_exit_is_cached_not_drawn() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter3").expect("registered");
    assert_eq!(p.take_fetch_requests().len(), 1);
    p.enter_chapter("chapter1").expect("registered");

    p.track_loaded("tracks/chapter3.geojson", Ok(TRACK));
    advance(&mut p, 2000);
    assert!(p.map().layers.is_empty());

    p.enter_chapter("chapter3").expect("registered");
    assert!(p.take_fetch_requests().is_empty());
    advance(&mut p, 2000);
    assert_eq!(p.map().layers.len(), 1);
}

#[test]
fn marker_failure_skips_its_popup_only() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.map_mut().fail_markers(true);
    p.enter_chapter("chapter3").expect("registered");

    advance(&mut p, 2000);
    assert!(p.map().markers.is_empty());
    assert!(p.map().popups.is_empty());
    assert_eq!(p.metrics().counter("surface.errors"), 2);
    assert_eq!(p.current_chapter().map(|c| c.as_str()), Some("chapter3"));
}
