use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::badges::BadgeId;

use super::{
    ChoiceOption, DialogueLine, GamePhase, GameState, Stat, Value, FIRST_ACT, INITIAL_SCENE_ID,
    LAST_ACT, NO_HIGHLIGHT,
};

/// Owner of the game state and the only path through which it changes.
///
/// Every mutator is synchronous and total: bad keys are ignored rather than
/// reported, so authored content can never crash the story.
#[derive(Debug, Default)]
pub struct GameStore {
    state: GameState,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    // Phase & scene

    pub fn start_game(&mut self) {
        self.state.game_phase = GamePhase::ActIntro;
        self.state.current_act = FIRST_ACT;
        self.state.current_scene = INITIAL_SCENE_ID.to_string();
    }

    pub fn set_scene(&mut self, scene_id: impl Into<String>) {
        self.state.current_scene = scene_id.into();
    }

    /// Moves to `act` (clamped to the authored range) and re-enters the act intro.
    pub fn set_act(&mut self, act: u8) {
        self.state.current_act = act.clamp(FIRST_ACT, LAST_ACT);
        self.state.game_phase = GamePhase::ActIntro;
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        self.state.game_phase = phase;
    }

    // Inventory

    pub fn add_item(&mut self, item: impl Into<String>) {
        self.state.inventory.insert(item.into());
    }

    pub fn remove_item(&mut self, item: &str) {
        self.state.inventory.remove(item);
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.state.has_item(item)
    }

    // Story flags

    pub fn set_flag(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.flags.insert(key.into(), value.into());
    }

    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.state.flag(key)
    }

    // Player stats

    /// Adds `amount` to the named stat and clamps. Unknown stat names are ignored.
    pub fn adjust_stat(&mut self, stat: &str, amount: i64) {
        match Stat::parse(stat) {
            Some(stat) => self.adjust(stat, amount),
            None => debug!(stat, "adjust_stat_unknown_stat_ignored"),
        }
    }

    pub fn adjust(&mut self, stat: Stat, amount: i64) {
        let slot = self.state.player.stat_mut(stat);
        *slot = stat.clamp(slot.saturating_add(amount));
    }

    // Badges

    /// Marks a badge earned. Unknown ids are ignored. Returns `true` when the
    /// badge was newly earned.
    pub fn award_badge(&mut self, badge_id: &str) -> bool {
        match BadgeId::parse(badge_id) {
            Some(id) => self.state.badges.award(id),
            None => {
                debug!(badge = badge_id, "award_badge_unknown_id_ignored");
                false
            }
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        BadgeId::parse(badge_id).is_some_and(|id| self.state.badges.is_earned(id))
    }

    // Dialogue

    pub fn show_dialogue(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        let dialogue = &mut self.state.dialogue;
        dialogue.queue.clear();
        dialogue.speaker = speaker.into();
        dialogue.text = text.into();
        dialogue.active = true;
    }

    /// Shows the first line immediately and queues the rest. Empty input is ignored.
    pub fn queue_dialogue(&mut self, lines: impl IntoIterator<Item = DialogueLine>) {
        let mut lines: VecDeque<DialogueLine> = lines.into_iter().collect();
        let Some(first) = lines.pop_front() else {
            return;
        };
        let dialogue = &mut self.state.dialogue;
        dialogue.speaker = first.speaker;
        dialogue.text = first.text;
        dialogue.queue = lines;
        dialogue.active = true;
    }

    /// Pops the next queued line into the active slot, or closes the panel.
    pub fn advance_dialogue(&mut self) {
        let dialogue = &mut self.state.dialogue;
        match dialogue.queue.pop_front() {
            Some(next) => {
                dialogue.speaker = next.speaker;
                dialogue.text = next.text;
            }
            None => {
                dialogue.active = false;
                dialogue.speaker.clear();
                dialogue.text.clear();
                dialogue.queue.clear();
            }
        }
    }

    // Pseudocode

    pub fn show_pseudocode(
        &mut self,
        snippet_id: impl Into<String>,
        variables: BTreeMap<String, Value>,
    ) {
        let panel = &mut self.state.pseudocode;
        panel.snippet_id = Some(snippet_id.into());
        panel.variables = variables;
        panel.highlight_line = NO_HIGHLIGHT;
        panel.visible = true;
    }

    pub fn hide_pseudocode(&mut self) {
        let panel = &mut self.state.pseudocode;
        panel.visible = false;
        panel.snippet_id = None;
        panel.highlight_line = NO_HIGHLIGHT;
        panel.variables.clear();
    }

    /// Bounds are the renderer's concern; any index is stored as given.
    pub fn highlight_line(&mut self, line: i32) {
        self.state.pseudocode.highlight_line = line;
    }

    // Choices

    pub fn show_choices(&mut self, options: Vec<ChoiceOption>) {
        self.state.choices.options = options;
        self.state.choices.active = true;
    }

    pub fn hide_choices(&mut self) {
        self.state.choices.active = false;
        self.state.choices.options.clear();
    }

    // Reset

    /// Rebuilds the whole state from scratch. Holders of the store keep their
    /// handle; only the contents are replaced.
    pub fn reset(&mut self) {
        self.state = GameState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    fn line(speaker: &str, text: &str) -> DialogueLine {
        DialogueLine::new(speaker, text)
    }

    #[test]
    fn stats_stay_in_range_for_any_adjustment_sequence() {
        let mut store = GameStore::new();
        let deltas = [250, -1_000, 37, -12, 99, i64::MAX, i64::MIN, 5];
        for delta in deltas {
            for stat in ["health", "gold", "reputation"] {
                store.adjust_stat(stat, delta);
                let player = &store.state().player;
                assert!((0..=100).contains(&player.health));
                assert!((0..=100).contains(&player.reputation));
                assert!(player.gold >= 0);
            }
        }
    }

    #[test]
    fn gold_never_goes_negative_from_zero() {
        let mut store = GameStore::new();
        store.adjust_stat("gold", -1_000);
        assert_eq!(store.state().player.gold, 0);
        store.adjust_stat("gold", 10);
        store.adjust_stat("gold", -5);
        assert_eq!(store.state().player.gold, 5);
    }

    #[test]
    fn gold_has_no_ceiling() {
        let mut store = GameStore::new();
        store.adjust(Stat::Gold, 500);
        assert_eq!(store.state().player.gold, 500);
    }

    #[test]
    fn unknown_stat_is_a_no_op() {
        let mut store = GameStore::new();
        let before = store.state().clone();
        store.adjust_stat("name", 5);
        store.adjust_stat("luck", -5);
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn add_item_is_idempotent() {
        let mut store = GameStore::new();
        store.add_item("map");
        store.add_item("map");
        assert_eq!(store.state().inventory.len(), 1);
        assert!(store.has_item("map"));
        store.remove_item("map");
        store.remove_item("map");
        assert!(!store.has_item("map"));
    }

    #[test]
    fn flags_read_back_and_absent_is_none() {
        let mut store = GameStore::new();
        assert!(store.flag("hasMap").is_none());
        store.set_flag("hasMap", true);
        store.set_flag("answer", 15);
        assert_eq!(store.flag("hasMap"), Some(&Value::Bool(true)));
        assert_eq!(store.flag("answer"), Some(&Value::Int(15)));
        assert!(store.state().flag_is_set("hasMap"));
    }

    #[test]
    fn badges_are_monotonic_and_unknown_ids_ignored() {
        let mut store = GameStore::new();
        assert!(store.award_badge("ifElse"));
        assert!(!store.award_badge("ifElse"));
        assert!(store.has_badge("ifElse"));

        let before = store.state().badges;
        assert!(!store.award_badge("debugging"));
        assert_eq!(store.state().badges, before);

        store.hide_choices();
        store.advance_dialogue();
        store.set_act(3);
        assert!(store.has_badge("ifElse"));
    }

    #[test]
    fn dialogue_queue_is_fifo_then_closes() {
        let mut store = GameStore::new();
        store.queue_dialogue(vec![line("A", "one"), line("B", "two"), line("C", "three")]);
        assert_eq!(store.state().dialogue.speaker, "A");
        assert!(store.state().dialogue.active);

        store.advance_dialogue();
        assert_eq!(store.state().dialogue.speaker, "B");
        store.advance_dialogue();
        assert_eq!(store.state().dialogue.speaker, "C");
        store.advance_dialogue();

        let dialogue = &store.state().dialogue;
        assert!(!dialogue.active);
        assert!(dialogue.text.is_empty());
        assert!(dialogue.speaker.is_empty());
        assert!(dialogue.queue.is_empty());
    }

    #[test]
    fn queue_dialogue_ignores_empty_input() {
        let mut store = GameStore::new();
        store.show_dialogue("Polly", "SQUAWK!");
        store.queue_dialogue(Vec::new());
        assert_eq!(store.state().dialogue.text, "SQUAWK!");
    }

    #[test]
    fn show_dialogue_drops_pending_queue() {
        let mut store = GameStore::new();
        store.queue_dialogue(vec![line("A", "one"), line("B", "two")]);
        store.show_dialogue("Shopkeeper", "Suit yerself.");
        assert!(store.state().dialogue.queue.is_empty());
        store.advance_dialogue();
        assert!(!store.state().dialogue.active);
    }

    #[test]
    fn pseudocode_show_resets_highlight_and_hide_clears_snippet() {
        let mut store = GameStore::new();
        store.highlight_line(4);
        let mut vars = BTreeMap::new();
        vars.insert("gold".to_string(), Value::Int(10));
        store.show_pseudocode("variables_intro", vars);

        let panel = &store.state().pseudocode;
        assert!(panel.visible);
        assert_eq!(panel.highlight_line, NO_HIGHLIGHT);
        assert_eq!(panel.snippet_id.as_deref(), Some("variables_intro"));

        store.highlight_line(99);
        assert_eq!(store.state().pseudocode.highlight_line, 99);

        store.hide_pseudocode();
        let panel = &store.state().pseudocode;
        assert!(!panel.visible);
        assert!(panel.snippet_id.is_none());
        assert!(panel.variables.is_empty());
    }

    #[test]
    fn choices_show_then_hide_leaves_panel_empty() {
        let mut store = GameStore::new();
        store.show_choices(vec![ChoiceOption {
            id: "a".to_string(),
            text: "Sail".to_string(),
            action: Action::default(),
        }]);
        assert!(store.state().choices.active);
        store.hide_choices();
        assert!(!store.state().choices.active);
        assert!(store.state().choices.options.is_empty());
    }

    #[test]
    fn set_act_reenters_intro_and_clamps() {
        let mut store = GameStore::new();
        store.set_phase(GamePhase::Playing);
        store.set_act(2);
        assert_eq!(store.state().current_act, 2);
        assert_eq!(store.state().game_phase, GamePhase::ActIntro);
        store.set_act(9);
        assert_eq!(store.state().current_act, LAST_ACT);
        store.set_act(0);
        assert_eq!(store.state().current_act, FIRST_ACT);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut store = GameStore::new();
        store.start_game();
        store.add_item("compass");
        store.adjust_stat("gold", 40);
        store.award_badge("arrays");
        store.show_dialogue("Narrator", "...");
        store.reset();
        assert_eq!(store.state(), &GameState::default());
    }

    #[test]
    fn start_game_enters_first_act_intro() {
        let mut store = GameStore::new();
        store.set_scene("cave-chests");
        store.start_game();
        assert_eq!(store.state().game_phase, GamePhase::ActIntro);
        assert_eq!(store.state().current_act, 1);
        assert_eq!(store.state().current_scene, "port-arrival");
    }
}
