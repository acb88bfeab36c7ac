use std::collections::HashMap;

use tracing::debug;

use super::Scene;

pub const FALLBACK_SCENE_ID: &str = "default";
pub(crate) const FALLBACK_PLACEHOLDER_COLOR: &str = "#4a6741";
const FALLBACK_PLACEHOLDER_LABEL: &str = "Scene";

/// Scene lookup by id, with a placeholder scene for ids nobody registered.
#[derive(Debug, Clone)]
pub struct SceneRegistry {
    scenes: HashMap<String, Scene>,
    fallback: Scene,
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self {
            scenes: HashMap::new(),
            fallback: fallback_scene(),
        }
    }
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges per-act tables in order; a later table overwrites earlier entries
    /// with the same id.
    pub fn from_tables<I, T>(tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = Scene>,
    {
        let mut registry = Self::new();
        for table in tables {
            for scene in table {
                registry.insert(scene.id.clone(), scene);
            }
        }
        registry
    }

    pub fn insert(&mut self, scene_id: impl Into<String>, scene: Scene) {
        let scene_id = scene_id.into();
        if self.scenes.insert(scene_id.clone(), scene).is_some() {
            debug!(scene = %scene_id, "scene_registration_overwritten");
        }
    }

    pub fn get(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.get(scene_id)
    }

    /// Never fails: unregistered ids resolve to the fallback scene.
    pub fn resolve(&self, scene_id: &str) -> &Scene {
        self.scenes.get(scene_id).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, scene_id: &str) -> bool {
        self.scenes.contains_key(scene_id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}

fn fallback_scene() -> Scene {
    Scene {
        id: FALLBACK_SCENE_ID.to_string(),
        background: None,
        placeholder_color: FALLBACK_PLACEHOLDER_COLOR.to_string(),
        placeholder_label: FALLBACK_PLACEHOLDER_LABEL.to_string(),
        hotspots: Vec::new(),
        on_enter: None,
        hint: None,
    }
}
