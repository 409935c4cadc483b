mod common;

use common::{advance, rehearsal};
use formats::Category;
use pretty_assertions::assert_eq;
use story::{ChartVisibility, MoveCompletion};

#[test]
fn two_nonzero_categories_render_as_equal_bars() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter1").expect("registered");
    advance(&mut p, 2000);

    let frame = p.chart().last_frame().expect("rendered");
    assert_eq!(frame.location, "Test Region");
    let labels: Vec<&str> = frame.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["Light: 100", "Detections: 200"]);
    assert_eq!(frame.bars[0].category, Category::AisLight);
    assert_eq!(frame.bars[1].category, Category::Detections);
    assert_eq!(frame.bars[0].width_px, frame.bars[1].width_px);

    let total: f64 = frame.bars.iter().map(|b| b.width_px).sum();
    assert!((total - p.config().chart_width_px).abs() < 1e-9);
    assert_eq!(p.chart_state().values, [100.0, 0.0, 0.0, 0.0, 200.0]);
}

#[test]
fn intro_hides_and_chapters_show_the_chart() {
    let mut p = rehearsal(MoveCompletion::Immediate);

    p.enter_chapter("intro").expect("registered");
    advance(&mut p, 1000);
    assert_eq!(p.chart_visibility(), ChartVisibility::Hidden);

    p.enter_chapter("chapter1").expect("registered");
    advance(&mut p, 1000);
    assert_eq!(p.chart_visibility(), ChartVisibility::Visible);
    assert_eq!(p.chart_state().location, "Test Region");
    assert_eq!(p.chart_state().values, [100.0, 0.0, 0.0, 0.0, 200.0]);

    p.enter_chapter("chapter2").expect("registered");
    advance(&mut p, 1000);
    assert_eq!(p.chart_visibility(), ChartVisibility::Visible);
    assert_eq!(p.chart_state().location, "Gulf of Oman");
    assert_eq!(p.chart_state().values, [40.0, 25.0, 10.0, 5.0, 20.0]);

    p.enter_chapter("intro").expect("registered");
    assert_eq!(p.chart_visibility(), ChartVisibility::FadingOut);
    advance(&mut p, 1000);
    assert_eq!(p.chart_visibility(), ChartVisibility::Hidden);

    assert_eq!(
        p.chart().visibility_log,
        vec![
            ChartVisibility::Visible,
            ChartVisibility::FadingOut,
            ChartVisibility::Hidden,
        ]
    );
}

#[test]
fn chapter_without_statistics_hides_the_chart() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter1").expect("registered");
    advance(&mut p, 1000);

    p.enter_chapter("chapter3").expect("registered");
    advance(&mut p, 1000);
    assert_eq!(p.chart_visibility(), ChartVisibility::Hidden);
}

#[test]
fn rebinding_mid_flight_ends_on_the_latest_target() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter1").expect("registered");
    advance(&mut p, 200);
    let midway = p.chart_state().values;
    assert!(midway[0] > 0.0 && midway[0] < 100.0, "interpolating, got {midway:?}");

    p.enter_chapter("chapter2").expect("registered");
    advance(&mut p, 2000);

    assert_eq!(p.chart_state().values, [40.0, 25.0, 10.0, 5.0, 20.0]);
    let last = p.chart().last_frame().expect("rendered");
    assert_eq!(last.location, "Gulf of Oman");
    assert_eq!(last.bars.len(), 5);
}

#[test]
fn interpolation_is_eased() {
    let mut p = rehearsal(MoveCompletion::Immediate);
    p.enter_chapter("chapter1").expect("registered");
    let duration = p.config().chart_ms;

    advance(&mut p, duration / 4);
    let early = p.chart_state().values[4];
    advance(&mut p, duration / 4);
    let half = p.chart_state().values[4];

    // Ease-in: the first quarter covers less than a quarter of the distance.
    assert!(early < 50.0, "early = {early}");
    assert!((half - 100.0).abs() < 5.0, "half = {half}");
}
