//! Authored content tables: scenes per act, pseudocode snippets and acts.
//!
//! Everything is JSON. Parse failures carry the content name and the JSON path
//! of the offending value so authors can find it without a debugger.

mod acts;
mod references;
mod scenes;
mod snippets;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use acts::{parse_act_table, Act, ActTable};
pub use references::{dangling_references, DanglingReference, ReferenceKind};
pub use scenes::parse_scene_table;
pub use snippets::parse_snippet_table;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse {content} at {path}: {source}")]
    Parse {
        content: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{content}: scene id '{scene_id}' is defined more than once")]
    DuplicateScene { content: String, scene_id: String },
    #[error("{content}: act {act_id} is defined more than once")]
    DuplicateAct { content: String, act_id: u8 },
    #[error("{content}: act id {act_id} is outside 1..=4")]
    ActOutOfRange { content: String, act_id: u8 },
}

pub(crate) fn parse_json<T: DeserializeOwned>(content: &str, raw: &str) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| ContentError::Parse {
        content: content.to_string(),
        path: error.path().to_string(),
        source: error.into_inner(),
    })
}
