use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::action::Signal;
use crate::state::{ChoiceOption, DialogueLine, GamePhase, GameState, GameStore, Value};

use super::{Hotspot, Scene, SceneRegistry};

/// Scene transitions triggered from `on_enter` may chain, but not forever.
pub const MAX_SCENE_CHAIN_DEPTH: usize = 8;

/// The current scene as the presentation layer sees it: only visible hotspots.
#[derive(Debug, Clone)]
pub struct SceneView<'a> {
    pub scene: &'a Scene,
    pub hotspots: Vec<&'a Hotspot>,
}

impl SceneView<'_> {
    pub fn placeholder_label(&self) -> &str {
        &self.scene.placeholder_label
    }
}

/// Resolves scenes and turns player clicks into state changes.
#[derive(Debug, Clone, Default)]
pub struct SceneNavigator {
    registry: SceneRegistry,
}

impl SceneNavigator {
    pub fn new(registry: SceneRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Adds or replaces a scene at runtime.
    pub fn register_scene(&mut self, scene_id: impl Into<String>, scene: Scene) {
        self.registry.insert(scene_id, scene);
    }

    pub fn get_scene(&self, state: &GameState) -> &Scene {
        self.registry.resolve(&state.current_scene)
    }

    pub fn current_scene<'a>(&'a self, state: &GameState) -> SceneView<'a> {
        let scene = self.get_scene(state);
        let hotspots = scene
            .hotspots
            .iter()
            .filter(|hotspot| hotspot.is_visible(state))
            .collect();
        SceneView { scene, hotspots }
    }

    /// Commits the resolved scene id, then runs the scene's entry action.
    pub fn load_scene(&self, store: &mut GameStore, scene_id: &str) -> Vec<Signal> {
        let mut helpers = self.build_helpers(store);
        self.enter_scene(&mut helpers, scene_id);
        helpers.into_signals()
    }

    /// Runs the action of a hotspot in the current scene. Unknown ids are ignored.
    ///
    /// The lookup covers every hotspot of the scene, hidden ones included.
    pub fn handle_hotspot(&self, store: &mut GameStore, hotspot_id: &str) -> Vec<Signal> {
        let scene = self.get_scene(store.state());
        let Some(hotspot) = scene.hotspot(hotspot_id) else {
            debug!(scene = %scene.id, hotspot = hotspot_id, "hotspot_not_found");
            return Vec::new();
        };
        info!(scene = %scene.id, hotspot = %hotspot.id, "hotspot_clicked");
        let mut helpers = self.build_helpers(store);
        hotspot.action.execute(&mut helpers);
        helpers.into_signals()
    }

    /// Picks an option from the open choice panel. The panel closes before the
    /// option's action runs, so the action may open a new one.
    pub fn choose(&self, store: &mut GameStore, option_id: &str) -> Vec<Signal> {
        if !store.state().choices.active {
            return Vec::new();
        }
        let Some(option) = store
            .state()
            .choices
            .options
            .iter()
            .find(|option| option.id == option_id)
            .cloned()
        else {
            debug!(option = option_id, "choice_not_found");
            return Vec::new();
        };
        info!(option = %option.id, "choice_selected");
        store.hide_choices();
        let mut helpers = self.build_helpers(store);
        option.action.execute(&mut helpers);
        helpers.into_signals()
    }

    pub fn build_helpers<'a>(&'a self, store: &'a mut GameStore) -> Helpers<'a> {
        Helpers {
            store,
            navigator: self,
            signals: Vec::new(),
            scene_depth: 0,
        }
    }

    fn enter_scene(&self, helpers: &mut Helpers<'_>, scene_id: &str) {
        if helpers.scene_depth >= MAX_SCENE_CHAIN_DEPTH {
            warn!(
                scene = scene_id,
                depth = helpers.scene_depth,
                "scene_chain_too_deep_dropped"
            );
            return;
        }
        let scene = self.registry.resolve(scene_id);
        helpers.store.set_scene(scene.id.clone());
        info!(requested = scene_id, scene = %scene.id, "scene_loaded");

        if let Some(on_enter) = &scene.on_enter {
            helpers.scene_depth += 1;
            on_enter.execute(helpers);
            helpers.scene_depth -= 1;
        }
    }
}

/// Façade handed to every action: the store's mutators plus scene control.
pub struct Helpers<'a> {
    store: &'a mut GameStore,
    navigator: &'a SceneNavigator,
    signals: Vec<Signal>,
    scene_depth: usize,
}

impl<'a> Helpers<'a> {
    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn show_dialogue(&mut self, speaker: &str, text: &str) {
        self.store.show_dialogue(speaker, text);
    }

    pub fn queue_dialogue(&mut self, lines: Vec<DialogueLine>) {
        self.store.queue_dialogue(lines);
    }

    pub fn add_item(&mut self, item: &str) {
        self.store.add_item(item);
    }

    pub fn remove_item(&mut self, item: &str) {
        self.store.remove_item(item);
    }

    /// Authoring shorthand: a flag set without a value is set to `true`.
    pub fn set_flag(&mut self, key: &str, value: Option<Value>) {
        self.store.set_flag(key, value.unwrap_or(Value::Bool(true)));
    }

    pub fn adjust_stat(&mut self, stat: &str, amount: i64) {
        self.store.adjust_stat(stat, amount);
    }

    pub fn show_pseudocode(&mut self, snippet_id: &str, variables: BTreeMap<String, Value>) {
        self.store.show_pseudocode(snippet_id, variables);
    }

    pub fn hide_pseudocode(&mut self) {
        self.store.hide_pseudocode();
    }

    pub fn show_choices(&mut self, options: Vec<ChoiceOption>) {
        self.store.show_choices(options);
    }

    pub fn hide_choices(&mut self) {
        self.store.hide_choices();
    }

    pub fn award_badge(&mut self, badge_id: &str) {
        self.store.award_badge(badge_id);
    }

    /// Full scene load, including the target scene's entry action.
    pub fn set_scene(&mut self, scene_id: &str) {
        let navigator = self.navigator;
        navigator.enter_scene(self, scene_id);
    }

    pub fn set_act(&mut self, act: u8) {
        self.store.set_act(act);
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        self.store.set_phase(phase);
    }

    pub fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn into_signals(self) -> Vec<Signal> {
        self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ChoiceSpec, Condition, Effect};
    use crate::audio::SoundCue;
    use crate::badges::BadgeId;
    use crate::scene::{Visibility, FALLBACK_SCENE_ID};

    fn say(speaker: &str, text: &str) -> Effect {
        Effect::ShowDialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    fn set_scene(scene: &str) -> Effect {
        Effect::SetScene {
            scene: scene.to_string(),
        }
    }

    fn port_navigator() -> SceneNavigator {
        let crate_hotspot = Hotspot::new(
            "wooden-crate",
            "Wooden Crate",
            Action::new(vec![
                Effect::AdjustStat {
                    stat: "gold".to_string(),
                    amount: 10,
                },
                Effect::SetFlag {
                    key: "searchedCrate".to_string(),
                    value: None,
                },
                Effect::AwardBadge {
                    badge: "variables".to_string(),
                },
                Effect::PlaySound {
                    cue: SoundCue::Correct,
                },
            ]),
        )
        .with_visibility(Visibility::When(Condition::Not(Box::new(Condition::Flag(
            "searchedCrate".to_string(),
        )))));
        let hidden = Hotspot::new("secret", "Secret", Action::new(vec![say("Narrator", "hidden")]))
            .with_visibility(Visibility::Fixed(false));
        let door = Hotspot::new("door", "Door", Action::new(vec![set_scene("port-shop")]));

        let arrival = Scene::new("port-arrival", "Port Compile")
            .with_hotspot(crate_hotspot)
            .with_hotspot(hidden)
            .with_hotspot(door);
        let shop = Scene::new("port-shop", "Port Shop").with_on_enter(Action::new(vec![say(
            "Shopkeeper",
            "Welcome!",
        )]));

        SceneNavigator::new(SceneRegistry::from_tables([vec![arrival, shop]]))
    }

    #[test]
    fn load_unknown_scene_uses_fallback_id() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        let signals = navigator.load_scene(&mut store, "nonexistent-id");
        assert!(signals.is_empty());
        assert_eq!(store.state().current_scene, FALLBACK_SCENE_ID);
        assert_eq!(navigator.get_scene(store.state()).id, FALLBACK_SCENE_ID);
    }

    #[test]
    fn on_enter_sees_itself_as_current_scene() {
        let observer = Scene::new("lookout", "Lookout").with_on_enter(Action::new(vec![
            Effect::If {
                condition: Condition::Flag("never".to_string()),
                then: Action::default(),
                otherwise: Action::new(vec![Effect::SetFlag {
                    key: "entered".to_string(),
                    value: None,
                }]),
            },
        ]));
        let mut navigator = SceneNavigator::default();
        navigator.register_scene("lookout", observer);
        let mut store = GameStore::new();

        let mut helpers = navigator.build_helpers(&mut store);
        helpers.set_scene("lookout");
        assert_eq!(helpers.state().current_scene, "lookout");
        assert!(helpers.state().flag_is_set("entered"));
    }

    #[test]
    fn visible_hotspots_follow_predicates_and_literals() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "port-arrival");

        let ids: Vec<_> = navigator
            .current_scene(store.state())
            .hotspots
            .iter()
            .map(|hotspot| hotspot.id.as_str())
            .collect();
        assert_eq!(ids, vec!["wooden-crate", "door"]);

        navigator.handle_hotspot(&mut store, "wooden-crate");
        let ids: Vec<_> = navigator
            .current_scene(store.state())
            .hotspots
            .iter()
            .map(|hotspot| hotspot.id.as_str())
            .collect();
        assert_eq!(ids, vec!["door"]);
    }

    #[test]
    fn hotspot_action_mutates_store_and_emits_signals() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "port-arrival");

        let signals = navigator.handle_hotspot(&mut store, "wooden-crate");
        assert_eq!(signals, vec![Signal::Sound(SoundCue::Correct)]);
        assert_eq!(store.state().player.gold, 10);
        assert_eq!(store.state().flag("searchedCrate"), Some(&Value::Bool(true)));
        assert!(store.state().badges.is_earned(BadgeId::Variables));
    }

    #[test]
    fn hidden_hotspots_can_still_be_dispatched_by_id() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "port-arrival");
        navigator.handle_hotspot(&mut store, "secret");
        assert_eq!(store.state().dialogue.text, "hidden");
    }

    #[test]
    fn unknown_hotspot_is_a_no_op() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "port-arrival");
        let before = store.state().clone();
        assert!(navigator.handle_hotspot(&mut store, "kraken").is_empty());
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn set_scene_from_hotspot_runs_target_on_enter() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "port-arrival");
        navigator.handle_hotspot(&mut store, "door");
        assert_eq!(store.state().current_scene, "port-shop");
        assert_eq!(store.state().dialogue.speaker, "Shopkeeper");
    }

    #[test]
    fn choose_hides_panel_then_runs_option() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        let mut helpers = navigator.build_helpers(&mut store);
        let offer = Effect::ShowChoices {
            options: vec![
                ChoiceSpec {
                    id: "sail".to_string(),
                    text: "Sail".to_string(),
                    when: Some(Condition::Item("map".to_string())),
                    action: Action::default(),
                },
                ChoiceSpec {
                    id: "stay".to_string(),
                    text: "Stay".to_string(),
                    when: None,
                    action: Action::new(vec![Effect::ShowChoices {
                        options: vec![ChoiceSpec {
                            id: "again".to_string(),
                            text: "Again".to_string(),
                            when: None,
                            action: Action::default(),
                        }],
                    }]),
                },
            ],
        };
        Action::new(vec![offer]).execute(&mut helpers);

        let offered: Vec<_> = store
            .state()
            .choices
            .options
            .iter()
            .map(|option| option.id.clone())
            .collect();
        assert_eq!(offered, vec!["stay".to_string()]);

        assert!(navigator.choose(&mut store, "sail").is_empty());
        assert!(store.state().choices.active);

        navigator.choose(&mut store, "stay");
        assert!(store.state().choices.active);
        assert_eq!(store.state().choices.options[0].id, "again");

        navigator.choose(&mut store, "again");
        assert!(!store.state().choices.active);
        assert!(store.state().choices.options.is_empty());
    }

    #[test]
    fn self_referencing_on_enter_chain_is_bounded() {
        let mut navigator = SceneNavigator::default();
        navigator.register_scene(
            "whirlpool",
            Scene::new("whirlpool", "Whirlpool").with_on_enter(Action::new(vec![
                Effect::AdjustStat {
                    stat: "health".to_string(),
                    amount: -1,
                },
                set_scene("whirlpool"),
            ])),
        );
        let mut store = GameStore::new();
        navigator.load_scene(&mut store, "whirlpool");
        assert_eq!(store.state().current_scene, "whirlpool");
        assert_eq!(
            store.state().player.health,
            100 - MAX_SCENE_CHAIN_DEPTH as i64
        );
    }

    #[test]
    fn helpers_set_act_and_phase_drive_phase_machine() {
        let navigator = port_navigator();
        let mut store = GameStore::new();
        {
            let mut helpers = navigator.build_helpers(&mut store);
            helpers.set_phase(GamePhase::Playing);
            helpers.set_act(2);
        }
        assert_eq!(store.state().game_phase, GamePhase::ActIntro);
        assert_eq!(store.state().current_act, 2);
    }
}
