use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::{GameState, GameStore, Value, NO_HIGHLIGHT};
use crate::timer::TimerSlot;

pub const HIGHLIGHT_CLEAR_DELAY: Duration = Duration::from_millis(1_500);
pub const DEFAULT_SEQUENCE_DELAY: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub concept: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SnippetTable {
    snippets: HashMap<String, Snippet>,
}

impl SnippetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snippet_id: impl Into<String>, snippet: Snippet) {
        self.snippets.insert(snippet_id.into(), snippet);
    }

    pub fn get(&self, snippet_id: &str) -> Option<&Snippet> {
        self.snippets.get(snippet_id)
    }

    pub fn contains(&self, snippet_id: &str) -> bool {
        self.snippets.contains_key(snippet_id)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

impl FromIterator<(String, Snippet)> for SnippetTable {
    fn from_iter<I: IntoIterator<Item = (String, Snippet)>>(iter: I) -> Self {
        Self {
            snippets: iter.into_iter().collect(),
        }
    }
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").ok())
        .as_ref()
}

/// Replaces `{name}` with the variable's display form. Placeholders without a
/// matching variable are kept as written.
pub fn interpolate(line: &str, variables: &BTreeMap<String, Value>) -> String {
    let Some(pattern) = placeholder_pattern() else {
        return line.to_string();
    };
    pattern
        .replace_all(line, |caps: &Captures<'_>| match variables.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[derive(Debug, Clone, Default)]
struct Sequence {
    lines: Vec<i32>,
    next: usize,
    delay: Duration,
}

/// Snippet rendering plus the two highlight animations. Each animation owns
/// one timer slot, so starting one always replaces the previous run.
#[derive(Debug, Clone, Default)]
pub struct PseudocodePanel {
    snippets: SnippetTable,
    highlight_clear: TimerSlot,
    sequence_step: TimerSlot,
    sequence: Sequence,
}

impl PseudocodePanel {
    pub fn new(snippets: SnippetTable) -> Self {
        Self {
            snippets,
            ..Self::default()
        }
    }

    pub fn snippets(&self) -> &SnippetTable {
        &self.snippets
    }

    pub fn current_snippet(&self, state: &GameState) -> Option<&Snippet> {
        let snippet_id = state.pseudocode.snippet_id.as_deref()?;
        self.snippets.get(snippet_id)
    }

    pub fn rendered_lines(&self, state: &GameState) -> Vec<String> {
        let Some(snippet) = self.current_snippet(state) else {
            return Vec::new();
        };
        snippet
            .lines
            .iter()
            .map(|line| interpolate(line, &state.pseudocode.variables))
            .collect()
    }

    pub fn show_snippet(
        &mut self,
        store: &mut GameStore,
        snippet_id: &str,
        variables: BTreeMap<String, Value>,
    ) {
        if !self.snippets.contains(snippet_id) {
            debug!(snippet = snippet_id, "snippet_not_found");
        }
        store.show_pseudocode(snippet_id, variables);
    }

    pub fn hide_snippet(&mut self, store: &mut GameStore) {
        self.stop_animations();
        store.hide_pseudocode();
    }

    /// Highlights `line` and clears it after [`HIGHLIGHT_CLEAR_DELAY`].
    pub fn highlight_line(&mut self, store: &mut GameStore, line: i32) {
        self.highlight_clear.cancel();
        store.highlight_line(line);
        self.highlight_clear.schedule_once(HIGHLIGHT_CLEAR_DELAY);
    }

    /// Steps the highlight through `lines`, holding each for `delay`, then
    /// clears it. The first line is highlighted immediately.
    pub fn animate_sequence(&mut self, store: &mut GameStore, lines: Vec<i32>, delay: Duration) {
        self.stop_animations();
        self.sequence = Sequence {
            lines,
            next: 0,
            delay,
        };
        self.step_sequence(store);
    }

    pub fn is_animating(&self) -> bool {
        self.highlight_clear.is_pending() || self.sequence_step.is_pending()
    }

    pub fn update(&mut self, store: &mut GameStore, dt: Duration) {
        if self.highlight_clear.advance(dt).fired() {
            store.highlight_line(NO_HIGHLIGHT);
        }

        let mut budget = dt;
        loop {
            let elapsed = self.sequence_step.advance(budget);
            if !elapsed.fired() {
                break;
            }
            self.step_sequence(store);
            budget = elapsed.leftover;
        }
    }

    fn step_sequence(&mut self, store: &mut GameStore) {
        let Some(&line) = self.sequence.lines.get(self.sequence.next) else {
            store.highlight_line(NO_HIGHLIGHT);
            return;
        };
        store.highlight_line(line);
        self.sequence.next += 1;
        self.sequence_step.schedule_once(self.sequence.delay);
    }

    /// Cancels the highlight clear and any running sequence, leaving the
    /// store untouched.
    pub fn stop_animations(&mut self) {
        self.highlight_clear.cancel();
        self.sequence_step.cancel();
    }
}
