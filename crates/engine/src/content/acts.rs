use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::state::{FIRST_ACT, LAST_ACT};

use super::{parse_json, ContentError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Act {
    pub id: u8,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub concepts: Vec<String>,
    pub start_scene: String,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct ActTable {
    acts: Vec<Act>,
}

impl ActTable {
    pub fn get(&self, act_id: u8) -> Option<&Act> {
        self.acts.iter().find(|act| act.id == act_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Act> {
        self.acts.iter()
    }

    pub fn len(&self) -> usize {
        self.acts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }
}

/// Parses the act list. Ids must be unique and within the playable range;
/// the table is kept sorted by id.
pub fn parse_act_table(content: &str, raw: &str) -> Result<ActTable, ContentError> {
    let mut acts: Vec<Act> = parse_json(content, raw)?;
    let mut seen = HashSet::new();
    for act in &acts {
        if !(FIRST_ACT..=LAST_ACT).contains(&act.id) {
            return Err(ContentError::ActOutOfRange {
                content: content.to_string(),
                act_id: act.id,
            });
        }
        if !seen.insert(act.id) {
            return Err(ContentError::DuplicateAct {
                content: content.to_string(),
                act_id: act.id,
            });
        }
    }
    acts.sort_by_key(|act| act.id);
    Ok(ActTable { acts })
}
