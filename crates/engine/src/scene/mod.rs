mod navigation;
mod registry;

use serde::{Deserialize, Serialize};

use crate::action::{Action, Condition};
use crate::state::GameState;

pub use navigation::{Helpers, SceneNavigator, SceneView, MAX_SCENE_CHAIN_DEPTH};
pub use registry::{SceneRegistry, FALLBACK_SCENE_ID};

/// Hotspot placement in percent of the scene area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl HotspotRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// `true`/`false` literally, or a condition checked against the live state.
/// A hotspot without the field is always shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Visibility {
    Fixed(bool),
    When(Condition),
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Fixed(true)
    }
}

impl Visibility {
    pub fn is_visible(&self, state: &GameState) -> bool {
        match self {
            Self::Fixed(visible) => *visible,
            Self::When(condition) => condition.evaluate(state),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub rect: HotspotRect,
    pub visible: Visibility,
    pub action: Action,
}

impl Hotspot {
    pub fn new(id: impl Into<String>, label: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: String::new(),
            rect: HotspotRect::default(),
            visible: Visibility::default(),
            action,
        }
    }

    pub fn with_visibility(mut self, visible: Visibility) -> Self {
        self.visible = visible;
        self
    }

    pub fn is_visible(&self, state: &GameState) -> bool {
        self.visible.is_visible(state)
    }
}

/// Immutable scene definition. Built once from content and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub background: Option<String>,
    pub placeholder_color: String,
    pub placeholder_label: String,
    pub hotspots: Vec<Hotspot>,
    pub on_enter: Option<Action>,
    pub hint: Option<String>,
}

impl Scene {
    pub fn new(id: impl Into<String>, placeholder_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            background: None,
            placeholder_color: registry::FALLBACK_PLACEHOLDER_COLOR.to_string(),
            placeholder_label: placeholder_label.into(),
            hotspots: Vec::new(),
            on_enter: None,
            hint: None,
        }
    }

    pub fn with_hotspot(mut self, hotspot: Hotspot) -> Self {
        self.hotspots.push(hotspot);
        self
    }

    pub fn with_on_enter(mut self, on_enter: Action) -> Self {
        self.on_enter = Some(on_enter);
        self
    }

    pub fn hotspot(&self, hotspot_id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|hotspot| hotspot.id == hotspot_id)
    }
}
