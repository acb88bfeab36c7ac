use engine::content::{
    dangling_references, parse_act_table, parse_scene_table, parse_snippet_table,
};
use engine::{ActTable, ContentError, SceneRegistry, SnippetTable};
use tracing::{info, warn};

const ACT_SCENE_TABLES: [(&str, &str); 4] = [
    ("act1.json", include_str!("../../content/act1.json")),
    ("act2.json", include_str!("../../content/act2.json")),
    ("act3.json", include_str!("../../content/act3.json")),
    ("act4.json", include_str!("../../content/act4.json")),
];
const SNIPPETS_JSON: &str = include_str!("../../content/snippets.json");
const ACTS_JSON: &str = include_str!("../../content/acts.json");

/// Every authored table, parsed and ready to hand to a session.
#[derive(Debug, Clone)]
pub(crate) struct GameContent {
    pub(crate) registry: SceneRegistry,
    pub(crate) snippets: SnippetTable,
    pub(crate) acts: ActTable,
}

/// Parses the embedded tables. Broken references are logged, not fatal: the
/// engine degrades them at runtime.
pub(crate) fn load_game_content() -> Result<GameContent, ContentError> {
    let mut tables = Vec::with_capacity(ACT_SCENE_TABLES.len());
    for (name, raw) in ACT_SCENE_TABLES {
        tables.push(parse_scene_table(name, raw)?);
    }
    let registry = SceneRegistry::from_tables(tables);
    let snippets = parse_snippet_table("snippets.json", SNIPPETS_JSON)?;
    let acts = parse_act_table("acts.json", ACTS_JSON)?;

    for dangling in dangling_references(&registry, &snippets, &acts) {
        warn!(reference = %dangling, "content_reference_dangling");
    }
    info!(
        scenes = registry.len(),
        snippets = snippets.len(),
        acts = acts.len(),
        "content_loaded"
    );

    Ok(GameContent {
        registry,
        snippets,
        acts,
    })
}
