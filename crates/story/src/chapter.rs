use std::collections::BTreeMap;

use foundation::geo::Camera;
use foundation::ids::{ChapterId, LayerId};
use foundation::time::Millis;
use formats::{ChapterSpec, StoryManifest};

use crate::error::{HookError, StoryError};
use crate::script::ChapterScript;
use crate::surface::MapSurface;

/// What a hook hands back to the orchestrator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Done,
    /// The hook started asynchronous work that settles after this many
    /// milliseconds; the transition waits for it.
    Await(u64),
}

pub struct HookContext<'a> {
    pub chapter: &'a ChapterId,
    pub now: Millis,
    pub map: &'a mut dyn MapSurface,
}

/// Custom lifecycle behavior beyond layer toggles and choreography.
pub trait ChapterHook: std::fmt::Debug {
    fn run(&mut self, ctx: &mut HookContext<'_>) -> Result<HookOutcome, HookError>;
}

/// A shared map layer shown or hidden on a lifecycle edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerToggle {
    pub layer: LayerId,
    pub visible: bool,
}

#[derive(Debug)]
pub struct Chapter {
    pub id: ChapterId,
    pub camera: Camera,
    pub legend: String,
    pub date_range: String,
    pub fast_path: bool,
    pub on_enter: Vec<LayerToggle>,
    pub on_exit: Vec<LayerToggle>,
    pub script: ChapterScript,
    pub enter_hooks: Vec<Box<dyn ChapterHook>>,
    pub exit_hooks: Vec<Box<dyn ChapterHook>>,
}

impl Chapter {
    pub fn new(id: impl Into<ChapterId>, camera: Camera) -> Self {
        Self {
            id: id.into(),
            camera,
            legend: String::new(),
            date_range: String::new(),
            fast_path: false,
            on_enter: Vec::new(),
            on_exit: Vec::new(),
            script: ChapterScript::default(),
            enter_hooks: Vec::new(),
            exit_hooks: Vec::new(),
        }
    }

    pub fn with_captions(
        mut self,
        legend: impl Into<String>,
        date_range: impl Into<String>,
    ) -> Self {
        self.legend = legend.into();
        self.date_range = date_range.into();
        self
    }

    pub fn with_script(mut self, script: ChapterScript) -> Self {
        self.script = script;
        self
    }

    pub fn fast_path(mut self) -> Self {
        self.fast_path = true;
        self
    }

    pub fn show_layer_while_active(mut self, layer: impl Into<String>) -> Self {
        let layer = LayerId::new(layer);
        self.on_enter.push(LayerToggle {
            layer: layer.clone(),
            visible: true,
        });
        self.on_exit.push(LayerToggle {
            layer,
            visible: false,
        });
        self
    }

    pub fn with_enter_hook(mut self, hook: impl ChapterHook + 'static) -> Self {
        self.enter_hooks.push(Box::new(hook));
        self
    }

    pub fn with_exit_hook(mut self, hook: impl ChapterHook + 'static) -> Self {
        self.exit_hooks.push(Box::new(hook));
        self
    }
}

impl From<&ChapterSpec> for Chapter {
    fn from(spec: &ChapterSpec) -> Self {
        let toggles = |list: &[formats::LayerToggle]| -> Vec<LayerToggle> {
            list.iter()
                .map(|t| LayerToggle {
                    layer: LayerId::new(t.layer.as_str()),
                    visible: t.visible,
                })
                .collect()
        };
        Self {
            id: ChapterId::new(spec.id.as_str()),
            camera: spec.camera.to_camera(),
            legend: spec.legend.clone(),
            date_range: spec.date_range.clone(),
            fast_path: spec.fast_path,
            on_enter: toggles(&spec.on_enter),
            on_exit: toggles(&spec.on_exit),
            script: ChapterScript::from(&spec.script),
            enter_hooks: Vec::new(),
            exit_hooks: Vec::new(),
        }
    }
}

/// Chapters by id. Registered once at startup, immutable in shape afterwards.
#[derive(Debug, Default)]
pub struct ChapterRegistry {
    chapters: Vec<Chapter>,
    index: BTreeMap<ChapterId, usize>,
}

impl ChapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &StoryManifest) -> Result<Self, StoryError> {
        manifest.validate()?;
        let mut registry = Self::new();
        for spec in &manifest.chapters {
            registry.register(Chapter::from(spec))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, chapter: Chapter) -> Result<(), StoryError> {
        if self.index.contains_key(&chapter.id) {
            return Err(StoryError::DuplicateChapter(chapter.id));
        }
        tracing::debug!(
            chapter = %chapter.id,
            points = chapter.script.points.len(),
            paths = chapter.script.paths.len(),
            fast_path = chapter.fast_path,
            "registered chapter"
        );
        self.index.insert(chapter.id.clone(), self.chapters.len());
        self.chapters.push(chapter);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn contains(&self, id: &ChapterId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ChapterId) -> Option<&Chapter> {
        self.index.get(id).map(|&i| &self.chapters[i])
    }

    pub fn get_mut(&mut self, id: &ChapterId) -> Option<&mut Chapter> {
        self.index.get(id).map(|&i| &mut self.chapters[i])
    }

    /// Chapters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Chapter, ChapterRegistry};
    use crate::error::StoryError;
    use foundation::geo::{Camera, LonLat};
    use foundation::ids::ChapterId;
    use formats::StoryManifest;

    fn cam() -> Camera {
        Camera::new(LonLat::new(0.0, 0.0), 3.0)
    }

    #[test]
    fn rejects_duplicate_registration() {
        let mut r = ChapterRegistry::new();
        r.register(Chapter::new("chapter1", cam())).expect("first");
        let err = r.register(Chapter::new("chapter1", cam())).unwrap_err();
        assert_eq!(err, StoryError::DuplicateChapter(ChapterId::from("chapter1")));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn builds_from_manifest() {
        let manifest = StoryManifest::from_json_str(
            r#"{ "version": "1.0", "chapters": [
                { "id": "intro", "camera": { "center": [10, 20], "zoom": 2 }, "fast_path": true },
                { "id": "chapter1", "camera": { "center": [56, 26], "zoom": 7 },
                  "legend": "Dark activity",
                  "on_enter": [{ "layer": "sar", "visible": true }] }
            ] }"#,
        )
        .expect("manifest");
        let r = ChapterRegistry::from_manifest(&manifest).expect("registry");
        assert!(r.get(&ChapterId::from("intro")).is_some_and(|c| c.fast_path));
        let c1 = r.get(&ChapterId::from("chapter1")).expect("chapter1");
        assert_eq!(c1.legend, "Dark activity");
        assert_eq!(c1.on_enter[0].layer.as_str(), "sar");
        let ids: Vec<_> = r.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "chapter1"]);
    }

    #[test]
    fn layer_shown_while_active_is_hidden_on_exit() {
        let c = Chapter::new("c", cam()).show_layer_while_active("tracks");
        assert!(c.on_enter[0].visible);
        assert!(!c.on_exit[0].visible);
        assert_eq!(c.on_enter[0].layer, c.on_exit[0].layer);
    }
}
