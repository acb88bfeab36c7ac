use std::time::Duration;

use tracing::trace;

use crate::state::{DialogueState, GameStore};
use crate::timer::TimerSlot;

pub const DEFAULT_TEXT_SPEED: Duration = Duration::from_millis(30);

/// Typewriter reveal over the store's active dialogue line.
///
/// The engine never reads the store on its own: the owner calls [`observe`]
/// after every mutation and [`update`] with elapsed time.
///
/// [`observe`]: DialogueEngine::observe
/// [`update`]: DialogueEngine::update
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    speed: Duration,
    reveal: TimerSlot,
    target: Vec<char>,
    displayed: String,
    observed_text: Option<String>,
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_SPEED)
    }
}

impl DialogueEngine {
    /// A zero speed reveals every line at once.
    pub fn new(speed: Duration) -> Self {
        Self {
            speed,
            reveal: TimerSlot::new(),
            target: Vec::new(),
            displayed: String::new(),
            observed_text: None,
        }
    }

    pub fn speed(&self) -> Duration {
        self.speed
    }

    pub fn displayed_text(&self) -> &str {
        &self.displayed
    }

    pub fn is_typing(&self) -> bool {
        self.reveal.is_pending()
    }

    /// Reacts to the dialogue slot of the store. A changed line restarts the
    /// reveal; a closed panel stops it and clears the display.
    pub fn observe(&mut self, dialogue: &DialogueState) {
        if !dialogue.active {
            if self.observed_text.take().is_some() || self.is_typing() {
                self.clear();
            }
            return;
        }
        if self.observed_text.as_deref() == Some(dialogue.text.as_str()) {
            return;
        }
        self.observed_text = Some(dialogue.text.clone());
        if dialogue.text.is_empty() {
            self.clear();
        } else {
            self.start_typewriter(&dialogue.text);
        }
    }

    pub fn start_typewriter(&mut self, text: &str) {
        self.reveal.cancel();
        self.target = text.chars().collect();
        self.displayed.clear();
        trace!(chars = self.target.len(), "typewriter_started");

        if self.speed.is_zero() || self.target.is_empty() {
            self.displayed.extend(self.target.iter());
            return;
        }
        self.reveal.schedule_repeating(self.speed);
    }

    pub fn skip_typewriter(&mut self) {
        if !self.is_typing() {
            return;
        }
        self.reveal.cancel();
        self.displayed = self.target.iter().collect();
    }

    /// Skips a running reveal, otherwise moves the conversation on.
    pub fn handle_click(&mut self, store: &mut GameStore) {
        if self.is_typing() {
            self.skip_typewriter();
            return;
        }
        store.advance_dialogue();
        self.observe(&store.state().dialogue);
    }

    pub fn update(&mut self, dt: Duration) {
        let fires = self.reveal.advance(dt).fires as usize;
        if fires == 0 {
            return;
        }
        let shown = self.displayed.chars().count();
        let end = (shown + fires).min(self.target.len());
        self.displayed.extend(self.target[shown..end].iter());
        if end == self.target.len() {
            self.reveal.cancel();
        }
    }

    fn clear(&mut self) {
        self.reveal.cancel();
        self.target.clear();
        self.displayed.clear();
    }
}
