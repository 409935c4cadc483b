use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use foundation::time::Millis;
use formats::{StatsTable, StoryManifest};
use story::Presentation;

mod ffi;
mod logging;
mod slot;
mod surfaces;
use slot::{Flushed, StorySlot};
use surfaces::{JsChart, JsMap};

type Story = Presentation<JsMap, JsChart>;

thread_local! {
    static STATE: StorySlot<JsMap, JsChart> = const { StorySlot::new() };
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Runs `f` against the loaded story, then flushes what it produced: track
/// fetches go out, chapter-changed events go to the page.
fn with_story<R>(f: impl FnOnce(&mut Story) -> R) -> Option<R> {
    let flushed = STATE.with(|state| state.with(f))?;
    Some(flush(flushed))
}

fn flush<R>(flushed: Flushed<R>) -> R {
    for resource in flushed.fetches {
        spawn_local(fetch_track(resource));
    }
    for event in &flushed.events {
        if let Err(err) = dispatch_chapter_change(event) {
            tracing::warn!(?err, chapter = %event.chapter, "could not dispatch chapterchange");
        }
    }
    flushed.out
}

/// Host timestamps are `performance.now()` milliseconds.
fn host_millis(now_ms: f64) -> Millis {
    Millis(now_ms.max(0.0) as u64)
}

fn page_clock() -> Millis {
    let now = web_sys::window()
        .and_then(|w| w.performance())
        .map_or(0.0, |p| p.now());
    host_millis(now)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

#[wasm_bindgen]
pub fn init_logging(filter: &str) {
    logging::init(filter);
}

/// Fetches the story manifest and statistics table, then builds the story.
/// Resolves once the story is ready to receive steps.
#[wasm_bindgen]
pub async fn load_story(manifest_url: String, stats_url: String) -> Result<(), JsValue> {
    let manifest_text = fetch_text(&manifest_url).await?;
    let manifest = StoryManifest::from_json_str(&manifest_text).map_err(js_err)?;
    let stats = match fetch_text(&stats_url).await {
        Ok(text) => StatsTable::from_json_str(&text).map_err(js_err)?,
        Err(err) => {
            tracing::warn!(url = %stats_url, ?err, "statistics unavailable; chart stays hidden");
            StatsTable::new()
        }
    };

    let story = Presentation::from_manifest(&manifest, stats, JsMap::default(), JsChart)
        .map_err(js_err)?
        .starting_at(page_clock());
    if !STATE.with(|state| state.install(story)) {
        return Err(JsValue::from_str("story busy; load_story called re-entrantly"));
    }
    tracing::info!(title = ?manifest.title, chapters = manifest.chapters.len(), "story loaded");
    Ok(())
}

/// Scroll notifier hook: a named step crossed the trigger line.
#[wasm_bindgen]
pub fn step_entered(chapter: &str) -> Result<(), JsValue> {
    match with_story(|story| story.enter_chapter(chapter)) {
        Some(Ok(outcome)) => {
            tracing::debug!(chapter, ?outcome, "step entered");
            Ok(())
        }
        Some(Err(e)) => Err(js_err(e)),
        None => {
            tracing::warn!(chapter, "step entered before the story loaded");
            Ok(())
        }
    }
}

/// Called from the map's `moveend`, which may fire synchronously inside a
/// camera call.
#[wasm_bindgen]
pub fn viewport_settled() {
    if let Some(flushed) = STATE.with(StorySlot::viewport_settled) {
        flush(flushed);
    }
}

/// Drives timers and animation frames. Call from `requestAnimationFrame`
/// with its timestamp.
#[wasm_bindgen]
pub fn tick(now_ms: f64) {
    with_story(|story| story.tick(host_millis(now_ms)));
}

/// Name of the chapter currently shown, if any.
#[wasm_bindgen]
pub fn current_chapter() -> Option<String> {
    with_story(|story| story.current_chapter().map(|c| c.to_string())).flatten()
}

/// Counter snapshot as a JSON object, for debugging overlays.
#[wasm_bindgen]
pub fn metrics_json() -> String {
    with_story(|story| {
        let counters: serde_json::Map<String, serde_json::Value> = story
            .metrics()
            .counters()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.into()))
            .collect();
        serde_json::Value::Object(counters).to_string()
    })
    .unwrap_or_else(|| "{}".to_string())
}

async fn fetch_track(resource: String) {
    let payload = fetch_text(&resource).await;
    let payload = payload.as_deref().map_err(|e| e.as_str());
    with_story(|story| story.track_loaded(&resource, payload));
}

async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(format!("{url}: HTTP {}", resp.status()));
    }
    resp.text().await.map_err(|e| e.to_string())
}

fn dispatch_chapter_change(event: &story::ChapterChanged) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let detail = js_sys::JSON::parse(&event.to_json().map_err(js_err)?)?;
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    let event = web_sys::CustomEvent::new_with_event_init_dict("chapterchange", &init)?;
    window.dispatch_event(&event)?;
    Ok(())
}
