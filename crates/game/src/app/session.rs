use std::time::Duration;

use engine::progress::HINT_COST;
use engine::pseudocode::DEFAULT_SEQUENCE_DELAY;
use engine::state::INITIAL_SCENE_ID;
use engine::{
    ActTable, AudioBackend, Badge, BadgeBoard, BadgeId, BadgeTracker, DialogueEngine, GamePhase,
    GameState, GameStore, KeyValueStore, MusicTrack, ProgressTracker, PseudocodePanel,
    SceneNavigator, SceneView, Signal, SoundBoard, SoundCue,
};
use thiserror::Error;
use tracing::{debug, info};

use super::bootstrap::LoopConfig;
use super::content::GameContent;

const FALLBACK_HINT: &str =
    "Look around, Captain. Every hotspot in this scene has something to teach ye.";

/// What a player command changed beyond the state itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) new_badges: Vec<BadgeId>,
    pub(crate) xp_gained: u32,
}

/// State a command is settled against.
struct Before {
    badges: BadgeBoard,
    snippet_id: Option<String>,
}

/// Commands the session refuses. The engine itself never fails; these are
/// front-end rules about when a command makes sense.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SessionError {
    #[error("that can't be done during the {phase} phase")]
    WrongPhase { phase: GamePhase },
    #[error("there is no choice to make right now")]
    NoChoices,
    #[error("no choice '{0}' is on offer")]
    UnknownChoice(String),
    #[error("ye see no '{0}' here")]
    UnknownHotspot(String),
    #[error("no pseudocode is on screen")]
    NoPseudocode,
    #[error("a hint costs {cost} XP and ye only have {xp}")]
    HintTooExpensive { cost: u32, xp: u32 },
}

/// Owns the store and every component that reacts to it.
///
/// Each command mutates the store, then [`GameSession::settle`] routes the
/// emitted signals and lets the dialogue engine and badge tracker observe the
/// new state.
pub(crate) struct GameSession {
    store: GameStore,
    navigator: SceneNavigator,
    acts: ActTable,
    dialogue: DialogueEngine,
    pseudocode: PseudocodePanel,
    badges: BadgeTracker,
    progress: ProgressTracker,
    sound: SoundBoard,
}

impl GameSession {
    pub(crate) fn new<S>(
        content: GameContent,
        config: &LoopConfig,
        storage: S,
        audio: Box<dyn AudioBackend>,
    ) -> Self
    where
        S: KeyValueStore + Clone + 'static,
    {
        let mut sound = SoundBoard::load(audio, Box::new(storage.clone()));
        if config.force_mute {
            sound.force_mute();
        }
        sound.start_music(MusicTrack::Login);

        Self {
            store: GameStore::new(),
            navigator: SceneNavigator::new(content.registry),
            acts: content.acts,
            dialogue: DialogueEngine::new(config.text_speed),
            pseudocode: PseudocodePanel::new(content.snippets),
            badges: BadgeTracker::new(),
            progress: ProgressTracker::load(Box::new(storage)),
            sound,
        }
    }

    pub(crate) fn state(&self) -> &GameState {
        self.store.state()
    }

    pub(crate) fn acts(&self) -> &ActTable {
        &self.acts
    }

    pub(crate) fn current_scene(&self) -> SceneView<'_> {
        self.navigator.current_scene(self.store.state())
    }

    pub(crate) fn scene_hint(&self) -> Option<&str> {
        self.navigator.get_scene(self.store.state()).hint.as_deref()
    }

    pub(crate) fn dialogue(&self) -> &DialogueEngine {
        &self.dialogue
    }

    pub(crate) fn pseudocode(&self) -> &PseudocodePanel {
        &self.pseudocode
    }

    pub(crate) fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub(crate) fn sound(&self) -> &SoundBoard {
        &self.sound
    }

    pub(crate) fn recent_badge(&self) -> Option<&'static Badge> {
        self.badges.recent()
    }

    pub(crate) fn earned_badges(&self) -> Vec<&'static Badge> {
        self.badges.earned_badges(&self.store.state().badges)
    }

    pub(crate) fn locked_badges(&self) -> Vec<&'static Badge> {
        self.badges.locked_badges(&self.store.state().badges)
    }

    pub(crate) fn all_badges_earned(&self) -> bool {
        self.badges.all_earned(&self.store.state().badges)
    }

    /// Title screen to the first act intro.
    pub(crate) fn start_game(&mut self) -> Result<Outcome, SessionError> {
        self.require_phase(GamePhase::Title)?;
        let before = self.snapshot();
        self.sound.play(SoundCue::Click);
        self.store.start_game();
        info!(act = self.store.state().current_act, "game_started");
        Ok(self.settle(before, Vec::new()))
    }

    /// Leaves the act intro and enters the act's first scene.
    pub(crate) fn begin_act(&mut self) -> Result<Outcome, SessionError> {
        self.require_phase(GamePhase::ActIntro)?;
        let before = self.snapshot();
        let act = self.store.state().current_act;
        let start_scene = self
            .acts
            .get(act)
            .map_or(INITIAL_SCENE_ID, |act| act.start_scene.as_str())
            .to_string();

        self.sound.play(SoundCue::Click);
        self.store.set_phase(GamePhase::Playing);
        self.sound.start_music(MusicTrack::for_act(act));
        let signals = self.navigator.load_scene(&mut self.store, &start_scene);
        info!(act, scene = %self.store.state().current_scene, "act_begun");
        Ok(self.settle(before, signals))
    }

    /// Hidden hotspots can still be clicked by id.
    pub(crate) fn click(&mut self, hotspot_id: &str) -> Result<Outcome, SessionError> {
        self.require_phase(GamePhase::Playing)?;
        if self
            .navigator
            .get_scene(self.store.state())
            .hotspot(hotspot_id)
            .is_none()
        {
            return Err(SessionError::UnknownHotspot(hotspot_id.to_string()));
        }
        let before = self.snapshot();
        self.sound.play(SoundCue::Click);
        let signals = self.navigator.handle_hotspot(&mut self.store, hotspot_id);
        Ok(self.settle(before, signals))
    }

    pub(crate) fn choose(&mut self, option_id: &str) -> Result<Outcome, SessionError> {
        let choices = &self.store.state().choices;
        if !choices.active {
            return Err(SessionError::NoChoices);
        }
        if !choices.options.iter().any(|option| option.id == option_id) {
            return Err(SessionError::UnknownChoice(option_id.to_string()));
        }
        let before = self.snapshot();
        self.sound.play(SoundCue::Click);
        let signals = self.navigator.choose(&mut self.store, option_id);
        Ok(self.settle(before, signals))
    }

    /// Skips the running reveal, otherwise moves to the next queued line.
    pub(crate) fn next_dialogue(&mut self) {
        self.dialogue.handle_click(&mut self.store);
    }

    pub(crate) fn highlight(&mut self, line: i32) -> Result<(), SessionError> {
        self.require_pseudocode()?;
        self.pseudocode.highlight_line(&mut self.store, line);
        Ok(())
    }

    pub(crate) fn animate(
        &mut self,
        lines: Vec<i32>,
        delay: Option<Duration>,
    ) -> Result<(), SessionError> {
        self.require_pseudocode()?;
        let delay = delay.unwrap_or(DEFAULT_SEQUENCE_DELAY);
        self.pseudocode.animate_sequence(&mut self.store, lines, delay);
        Ok(())
    }

    /// Pays for and returns the current scene's hint.
    pub(crate) fn hint(&mut self) -> Result<String, SessionError> {
        self.require_phase(GamePhase::Playing)?;
        if !self.progress.spend_hint() {
            return Err(SessionError::HintTooExpensive {
                cost: HINT_COST,
                xp: self.progress.xp(),
            });
        }
        let hint = self.scene_hint().unwrap_or(FALLBACK_HINT).to_string();
        info!(scene = %self.store.state().current_scene, xp = self.progress.xp(), "hint_bought");
        Ok(hint)
    }

    pub(crate) fn toggle_mute(&mut self) -> bool {
        self.sound.toggle_mute()
    }

    /// Opens the badge screen from the recap, and marks the newest badge seen.
    pub(crate) fn show_badges(&mut self) {
        if self.store.state().game_phase == GamePhase::Recap {
            self.store.set_phase(GamePhase::Badges);
        }
        self.badges.clear_recent();
    }

    /// Back to the title screen. Experience is kept.
    pub(crate) fn reset(&mut self) {
        self.pseudocode.hide_snippet(&mut self.store);
        self.store.reset();
        self.badges.clear_recent();
        self.dialogue.observe(&self.store.state().dialogue);
        self.sound.start_music(MusicTrack::Login);
        info!("game_reset");
    }

    /// Advances every timer-driven component by `dt`.
    pub(crate) fn update(&mut self, dt: Duration) {
        self.dialogue.update(dt);
        self.pseudocode.update(&mut self.store, dt);
        self.progress.update(dt);
    }

    fn snapshot(&self) -> Before {
        let state = self.store.state();
        Before {
            badges: state.badges,
            snippet_id: state.pseudocode.snippet_id.clone(),
        }
    }

    fn settle(&mut self, before: Before, signals: Vec<Signal>) -> Outcome {
        let mut outcome = Outcome::default();
        for signal in signals {
            match signal {
                Signal::Sound(cue) => self.sound.play(cue),
                Signal::Xp(reward) => {
                    self.progress.award(reward);
                    outcome.xp_gained += reward.amount();
                }
            }
        }

        outcome.new_badges = self
            .badges
            .observe_awards(&before.badges, &self.store.state().badges);
        if !outcome.new_badges.is_empty() {
            self.sound.play(SoundCue::Badge);
        }

        let panel = &self.store.state().pseudocode;
        if !panel.visible || panel.snippet_id != before.snippet_id {
            self.pseudocode.stop_animations();
        }
        self.dialogue.observe(&self.store.state().dialogue);

        if matches!(
            self.store.state().game_phase,
            GamePhase::Recap | GamePhase::Badges
        ) {
            self.sound.start_music(MusicTrack::Victory);
        }
        debug!(
            phase = %self.store.state().game_phase,
            scene = %self.store.state().current_scene,
            xp = outcome.xp_gained,
            badges = outcome.new_badges.len(),
            "command_settled"
        );
        outcome
    }

    fn require_phase(&self, expected: GamePhase) -> Result<(), SessionError> {
        let phase = self.store.state().game_phase;
        if phase == expected {
            Ok(())
        } else {
            Err(SessionError::WrongPhase { phase })
        }
    }

    fn require_pseudocode(&self) -> Result<(), SessionError> {
        if self.store.state().pseudocode.visible {
            Ok(())
        } else {
            Err(SessionError::NoPseudocode)
        }
    }
}
