//! Hotspot, choice and scene-entry behaviour expressed as data.
//!
//! Content never carries code: an [`Action`] is an ordered list of [`Effect`]
//! descriptors, and branching is expressed with [`Condition`]s evaluated
//! against the live state when the effect runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::badges::BadgeId;
use crate::progress::XpReward;
use crate::scene::Helpers;
use crate::state::{ChoiceOption, DialogueLine, GamePhase, GameState, Stat, Value};

/// Fire-and-forget side effect handed back to the owner of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Sound(SoundCue),
    Xp(XpReward),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    effects: Vec<Effect>,
}

impl Action {
    pub fn new(effects: Vec<Effect>) -> Self {
        Self { effects }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn execute(&self, helpers: &mut Helpers<'_>) {
        for effect in &self.effects {
            effect.apply(helpers);
        }
    }

    /// Visits every effect, including those nested in branches and choices.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Effect)) {
        for effect in &self.effects {
            visit(effect);
            match effect {
                Effect::If {
                    then, otherwise, ..
                } => {
                    then.walk(visit);
                    otherwise.walk(visit);
                }
                Effect::ShowChoices { options } => {
                    for option in options {
                        option.action.walk(visit);
                    }
                }
                _ => {}
            }
        }
    }
}

impl From<Vec<Effect>> for Action {
    fn from(effects: Vec<Effect>) -> Self {
        Self::new(effects)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum Effect {
    ShowDialogue {
        speaker: String,
        text: String,
    },
    QueueDialogue {
        lines: Vec<DialogueLine>,
    },
    AddItem {
        item: String,
    },
    RemoveItem {
        item: String,
    },
    SetFlag {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    AdjustStat {
        stat: String,
        amount: i64,
    },
    ShowPseudocode {
        snippet: String,
        #[serde(default)]
        variables: BTreeMap<String, VariableSource>,
    },
    HidePseudocode,
    ShowChoices {
        options: Vec<ChoiceSpec>,
    },
    HideChoices,
    AwardBadge {
        badge: String,
    },
    SetScene {
        scene: String,
    },
    SetAct {
        act: u8,
    },
    SetPhase {
        phase: GamePhase,
    },
    PlaySound {
        cue: SoundCue,
    },
    AwardXp {
        reward: XpReward,
    },
    If {
        condition: Condition,
        #[serde(default)]
        then: Action,
        #[serde(default, rename = "else")]
        otherwise: Action,
    },
}

impl Effect {
    fn apply(&self, helpers: &mut Helpers<'_>) {
        match self {
            Self::ShowDialogue { speaker, text } => helpers.show_dialogue(speaker, text),
            Self::QueueDialogue { lines } => helpers.queue_dialogue(lines.clone()),
            Self::AddItem { item } => helpers.add_item(item),
            Self::RemoveItem { item } => helpers.remove_item(item),
            Self::SetFlag { key, value } => helpers.set_flag(key, value.clone()),
            Self::AdjustStat { stat, amount } => helpers.adjust_stat(stat, *amount),
            Self::ShowPseudocode { snippet, variables } => {
                let resolved = resolve_variables(variables, helpers.state());
                helpers.show_pseudocode(snippet, resolved);
            }
            Self::HidePseudocode => helpers.hide_pseudocode(),
            Self::ShowChoices { options } => {
                let state = helpers.state();
                let offered = options
                    .iter()
                    .filter(|option| option.is_offered(state))
                    .map(ChoiceSpec::to_option)
                    .collect();
                helpers.show_choices(offered);
            }
            Self::HideChoices => helpers.hide_choices(),
            Self::AwardBadge { badge } => helpers.award_badge(badge),
            Self::SetScene { scene } => helpers.set_scene(scene),
            Self::SetAct { act } => helpers.set_act(*act),
            Self::SetPhase { phase } => helpers.set_phase(*phase),
            Self::PlaySound { cue } => helpers.emit(Signal::Sound(*cue)),
            Self::AwardXp { reward } => helpers.emit(Signal::Xp(*reward)),
            Self::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if condition.evaluate(helpers.state()) {
                    then
                } else {
                    otherwise
                };
                branch.execute(helpers);
            }
        }
    }
}

/// A choice as authored. `when` is checked once, at the moment the panel opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub action: Action,
}

impl ChoiceSpec {
    fn is_offered(&self, state: &GameState) -> bool {
        self.when
            .as_ref()
            .map_or(true, |condition| condition.evaluate(state))
    }

    fn to_option(&self) -> ChoiceOption {
        ChoiceOption {
            id: self.id.clone(),
            text: self.text.clone(),
            action: self.action.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Flag present and truthy.
    Flag(String),
    Item(String),
    StatAtLeast { stat: String, value: i64 },
    Badge(String),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, state: &GameState) -> bool {
        match self {
            Self::Flag(key) => state.flag_is_set(key),
            Self::Item(item) => state.has_item(item),
            Self::StatAtLeast { stat, value } => {
                Stat::parse(stat).is_some_and(|stat| state.player.stat(stat) >= *value)
            }
            Self::Badge(badge) => {
                BadgeId::parse(badge).is_some_and(|id| state.badges.is_earned(id))
            }
            Self::Not(inner) => !inner.evaluate(state),
            Self::All(all) => all.iter().all(|condition| condition.evaluate(state)),
            Self::Any(any) => any.iter().any(|condition| condition.evaluate(state)),
        }
    }
}

/// Where a pseudocode variable gets its value when the panel is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableSource {
    Stat { stat: String },
    Item { has_item: String },
    Flag { flag: String },
    Literal(Value),
}

impl VariableSource {
    /// Unknown stats and absent flags resolve to nothing, which leaves the
    /// placeholder visible in the rendered snippet.
    pub fn resolve(&self, state: &GameState) -> Option<Value> {
        match self {
            Self::Stat { stat } => Stat::parse(stat).map(|stat| Value::Int(state.player.stat(stat))),
            Self::Item { has_item } => Some(Value::Bool(state.has_item(has_item))),
            Self::Flag { flag } => state.flag(flag).cloned(),
            Self::Literal(value) => Some(value.clone()),
        }
    }
}

fn resolve_variables(
    sources: &BTreeMap<String, VariableSource>,
    state: &GameState,
) -> BTreeMap<String, Value> {
    sources
        .iter()
        .filter_map(|(name, source)| source.resolve(state).map(|value| (name.clone(), value)))
        .collect()
}
