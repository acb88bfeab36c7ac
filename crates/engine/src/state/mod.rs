mod store;
mod value;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::badges::BadgeBoard;

pub use store::GameStore;
pub use value::Value;

pub const INITIAL_SCENE_ID: &str = "port-arrival";
pub const FIRST_ACT: u8 = 1;
pub const LAST_ACT: u8 = 4;
pub const STAT_MAX: i64 = 100;
pub const NO_HIGHLIGHT: i32 = -1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    #[default]
    Title,
    ActIntro,
    Playing,
    Recap,
    Badges,
}

impl GamePhase {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::ActIntro => "act-intro",
            Self::Playing => "playing",
            Self::Recap => "recap",
            Self::Badges => "badges",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Health,
    Gold,
    Reputation,
}

impl Stat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Gold => "gold",
            Self::Reputation => "reputation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "health" => Some(Self::Health),
            "gold" => Some(Self::Gold),
            "reputation" => Some(Self::Reputation),
            _ => None,
        }
    }

    /// Gold is floored at zero with no ceiling; the other stats live in `0..=100`.
    pub fn clamp(self, value: i64) -> i64 {
        match self {
            Self::Gold => value.max(0),
            Self::Health | Self::Reputation => value.clamp(0, STAT_MAX),
        }
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw).ok_or_else(|| format!("unknown stat '{raw}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub name: String,
    pub health: i64,
    pub gold: i64,
    pub reputation: i64,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: "Captain".to_string(),
            health: STAT_MAX,
            gold: 0,
            reputation: 50,
        }
    }
}

impl Player {
    pub fn stat(&self, stat: Stat) -> i64 {
        match stat {
            Stat::Health => self.health,
            Stat::Gold => self.gold,
            Stat::Reputation => self.reputation,
        }
    }

    pub(crate) fn stat_mut(&mut self, stat: Stat) -> &mut i64 {
        match stat {
            Stat::Health => &mut self.health,
            Stat::Gold => &mut self.gold,
            Stat::Reputation => &mut self.reputation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DialogueState {
    pub active: bool,
    pub speaker: String,
    pub text: String,
    pub queue: VecDeque<DialogueLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PseudocodeState {
    pub visible: bool,
    pub snippet_id: Option<String>,
    pub highlight_line: i32,
    pub variables: BTreeMap<String, Value>,
}

impl Default for PseudocodeState {
    fn default() -> Self {
        Self {
            visible: false,
            snippet_id: None,
            highlight_line: NO_HIGHLIGHT,
            variables: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    pub action: Action,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChoiceState {
    pub active: bool,
    pub options: Vec<ChoiceOption>,
}

/// Everything the player can see, in one place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub game_phase: GamePhase,
    pub current_act: u8,
    pub current_scene: String,
    pub player: Player,
    pub inventory: BTreeSet<String>,
    pub flags: BTreeMap<String, Value>,
    pub badges: BadgeBoard,
    pub dialogue: DialogueState,
    pub pseudocode: PseudocodeState,
    pub choices: ChoiceState,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            game_phase: GamePhase::Title,
            current_act: FIRST_ACT,
            current_scene: INITIAL_SCENE_ID.to_string(),
            player: Player::default(),
            inventory: BTreeSet::new(),
            flags: BTreeMap::new(),
            badges: BadgeBoard::default(),
            dialogue: DialogueState::default(),
            pseudocode: PseudocodeState::default(),
            choices: ChoiceState::default(),
        }
    }
}

impl GameState {
    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Absent flags count as unset.
    pub fn flag_is_set(&self, key: &str) -> bool {
        self.flags.get(key).is_some_and(Value::is_truthy)
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.contains(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_matches_title_screen() {
        let state = GameState::default();
        assert_eq!(state.game_phase, GamePhase::Title);
        assert_eq!(state.current_act, 1);
        assert_eq!(state.current_scene, "port-arrival");
        assert_eq!(state.player.health, 100);
        assert_eq!(state.player.gold, 0);
        assert_eq!(state.player.reputation, 50);
        assert!(state.inventory.is_empty());
        assert_eq!(state.badges.earned_count(), 0);
        assert!(!state.dialogue.active);
        assert!(!state.pseudocode.visible);
        assert_eq!(state.pseudocode.highlight_line, NO_HIGHLIGHT);
        assert!(!state.choices.active);
    }

    #[test]
    fn stat_clamp_rules() {
        assert_eq!(Stat::Gold.clamp(-5), 0);
        assert_eq!(Stat::Gold.clamp(5_000), 5_000);
        assert_eq!(Stat::Health.clamp(130), 100);
        assert_eq!(Stat::Reputation.clamp(-1), 0);
    }

    #[test]
    fn stat_parse_rejects_non_stats() {
        assert_eq!(Stat::parse("gold"), Some(Stat::Gold));
        assert_eq!(Stat::parse("name"), None);
        assert!("luck".parse::<Stat>().is_err());
    }

    #[test]
    fn phase_serializes_kebab_case() {
        let json = serde_json::to_string(&GamePhase::ActIntro).expect("json");
        assert_eq!(json, "\"act-intro\"");
        let parsed: GamePhase = serde_json::from_str("\"recap\"").expect("parse");
        assert_eq!(parsed, GamePhase::Recap);
    }
}
