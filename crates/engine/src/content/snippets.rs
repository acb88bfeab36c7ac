use std::collections::BTreeMap;

use crate::pseudocode::{Snippet, SnippetTable};

use super::{parse_json, ContentError};

/// Parses a JSON object mapping snippet id to snippet.
pub fn parse_snippet_table(content: &str, raw: &str) -> Result<SnippetTable, ContentError> {
    let snippets: BTreeMap<String, Snippet> = parse_json(content, raw)?;
    Ok(snippets.into_iter().collect())
}
