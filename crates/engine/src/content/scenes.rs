use std::collections::HashSet;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::action::Action;
use crate::scene::{Hotspot, HotspotRect, Scene, Visibility};

use super::{parse_json, ContentError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScene {
    id: String,
    #[serde(default)]
    background: Option<String>,
    placeholder_color: String,
    placeholder_label: String,
    #[serde(default)]
    hotspots: Vec<RawHotspot>,
    #[serde(default)]
    on_enter: Option<Action>,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHotspot {
    id: String,
    label: String,
    #[serde(default)]
    icon: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    #[serde(default)]
    visible: Visibility,
    #[serde(default)]
    action: Option<Action>,
    /// Older content spelled the action `handler`.
    #[serde(default)]
    handler: Option<Action>,
}

impl RawHotspot {
    fn into_hotspot(self, scene_id: &str) -> Hotspot {
        let action = match (self.action, self.handler) {
            (Some(action), Some(_)) => {
                warn!(
                    scene = scene_id,
                    hotspot = %self.id,
                    "hotspot_handler_ignored_action_present"
                );
                action
            }
            (Some(action), None) => action,
            (None, Some(handler)) => {
                debug!(scene = scene_id, hotspot = %self.id, "hotspot_handler_migrated");
                handler
            }
            (None, None) => Action::default(),
        };
        Hotspot {
            id: self.id,
            label: self.label,
            icon: self.icon,
            rect: HotspotRect {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            },
            visible: self.visible,
            action,
        }
    }
}

/// Parses one act's scene table (a JSON array of scenes).
pub fn parse_scene_table(content: &str, raw: &str) -> Result<Vec<Scene>, ContentError> {
    let raw_scenes: Vec<RawScene> = parse_json(content, raw)?;
    let mut seen = HashSet::new();
    let mut scenes = Vec::with_capacity(raw_scenes.len());
    for raw_scene in raw_scenes {
        if !seen.insert(raw_scene.id.clone()) {
            return Err(ContentError::DuplicateScene {
                content: content.to_string(),
                scene_id: raw_scene.id,
            });
        }
        let hotspots = raw_scene
            .hotspots
            .into_iter()
            .map(|hotspot| hotspot.into_hotspot(&raw_scene.id))
            .collect();
        scenes.push(Scene {
            id: raw_scene.id,
            background: raw_scene.background,
            placeholder_color: raw_scene.placeholder_color,
            placeholder_label: raw_scene.placeholder_label,
            hotspots,
            on_enter: raw_scene.on_enter,
            hint: raw_scene.hint,
        });
    }
    Ok(scenes)
}
