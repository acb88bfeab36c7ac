use std::fmt;

use crate::action::{Action, Effect};
use crate::badges::BadgeId;
use crate::pseudocode::SnippetTable;
use crate::scene::SceneRegistry;

use super::ActTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Scene,
    Snippet,
    Badge,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scene => "scene",
            Self::Snippet => "snippet",
            Self::Badge => "badge",
        })
    }
}

/// A content id that names nothing. At runtime these degrade to the fallback
/// scene, an empty panel or an ignored award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub kind: ReferenceKind,
    pub target: String,
    pub referenced_from: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' referenced from {} does not exist",
            self.kind, self.target, self.referenced_from
        )
    }
}

/// Cross-checks every action in the registry, plus act start scenes, against
/// the loaded tables.
pub fn dangling_references(
    registry: &SceneRegistry,
    snippets: &SnippetTable,
    acts: &ActTable,
) -> Vec<DanglingReference> {
    let mut found = Vec::new();

    for act in acts.iter() {
        if !registry.contains(&act.start_scene) {
            found.push(DanglingReference {
                kind: ReferenceKind::Scene,
                target: act.start_scene.clone(),
                referenced_from: format!("act {}", act.id),
            });
        }
    }

    let mut scene_ids: Vec<&str> = registry.scene_ids().collect();
    scene_ids.sort_unstable();
    for scene_id in scene_ids {
        let Some(scene) = registry.get(scene_id) else {
            continue;
        };
        let mut check = |origin: String, action: &Action| {
            action.walk(&mut |effect| {
                let missing = match effect {
                    Effect::SetScene { scene } if !registry.contains(scene) => {
                        Some((ReferenceKind::Scene, scene))
                    }
                    Effect::ShowPseudocode { snippet, .. } if !snippets.contains(snippet) => {
                        Some((ReferenceKind::Snippet, snippet))
                    }
                    Effect::AwardBadge { badge } if BadgeId::parse(badge).is_none() => {
                        Some((ReferenceKind::Badge, badge))
                    }
                    _ => None,
                };
                if let Some((kind, target)) = missing {
                    found.push(DanglingReference {
                        kind,
                        target: target.clone(),
                        referenced_from: origin.clone(),
                    });
                }
            });
        };

        if let Some(on_enter) = &scene.on_enter {
            check(format!("{scene_id}/on_enter"), on_enter);
        }
        for hotspot in &scene.hotspots {
            check(format!("{scene_id}/{}", hotspot.id), &hotspot.action);
        }
    }
    found
}
