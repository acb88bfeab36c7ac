use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::state::GameStore;

pub const BADGE_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeId {
    Variables,
    IfElse,
    WhileLoops,
    Functions,
    ForLoops,
    Arrays,
}

impl BadgeId {
    pub const ALL: [BadgeId; BADGE_COUNT] = [
        Self::Variables,
        Self::IfElse,
        Self::WhileLoops,
        Self::Functions,
        Self::ForLoops,
        Self::Arrays,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Variables => "variables",
            Self::IfElse => "ifElse",
            Self::WhileLoops => "whileLoops",
            Self::Functions => "functions",
            Self::ForLoops => "forLoops",
            Self::Arrays => "arrays",
        }
    }

    /// Content refers to badges by their camelCase key. Unknown keys yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == raw)
    }

    pub fn badge(self) -> &'static Badge {
        &BADGES[self.index()]
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBadge(pub String);

impl fmt::Display for UnknownBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown badge id '{}'", self.0)
    }
}

impl FromStr for BadgeId {
    type Err = UnknownBadge;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw).ok_or_else(|| UnknownBadge(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub id: BadgeId,
    pub name: &'static str,
    pub icon: &'static str,
    pub concept: &'static str,
    pub description: &'static str,
}

/// Canonical badge registry, in the order badges are taught.
pub static BADGES: [Badge; BADGE_COUNT] = [
    Badge {
        id: BadgeId::Variables,
        name: "Variable Voyager",
        icon: "\u{1F4E6}",
        concept: "Variables",
        description: "You learned to store data in variables!",
    },
    Badge {
        id: BadgeId::IfElse,
        name: "Decision Captain",
        icon: "\u{2693}",
        concept: "IF/ELSE",
        description: "You learned to make decisions with IF/ELSE!",
    },
    Badge {
        id: BadgeId::WhileLoops,
        name: "Loop Legend",
        icon: "\u{1F504}",
        concept: "WHILE Loops",
        description: "You learned to repeat actions with WHILE loops!",
    },
    Badge {
        id: BadgeId::Functions,
        name: "Function Pirate",
        icon: "\u{26A1}",
        concept: "Functions",
        description: "You learned to create reusable functions!",
    },
    Badge {
        id: BadgeId::ForLoops,
        name: "Counter Captain",
        icon: "\u{1F522}",
        concept: "FOR Loops",
        description: "You learned to count with FOR loops!",
    },
    Badge {
        id: BadgeId::Arrays,
        name: "Array Admiral",
        icon: "\u{1F4CB}",
        concept: "Arrays",
        description: "You learned to use arrays to hold many items!",
    },
];

/// Earned status for each registered badge.
///
/// The key set is fixed by construction and a slot only ever moves from
/// `false` to `true`; there is no API that clears a badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeBoard {
    earned: [bool; BADGE_COUNT],
}

impl BadgeBoard {
    /// Marks the badge earned. Returns `true` only when the slot flipped.
    pub fn award(&mut self, id: BadgeId) -> bool {
        let slot = &mut self.earned[id.index()];
        let flipped = !*slot;
        *slot = true;
        flipped
    }

    pub fn is_earned(&self, id: BadgeId) -> bool {
        self.earned[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (BadgeId, bool)> + '_ {
        BadgeId::ALL.into_iter().map(|id| (id, self.is_earned(id)))
    }

    pub fn earned_count(&self) -> usize {
        self.earned.iter().filter(|earned| **earned).count()
    }

    /// Badges earned in `self` that were not yet earned in `before`, in registry order.
    pub fn newly_earned_since(&self, before: &BadgeBoard) -> Vec<BadgeId> {
        BadgeId::ALL
            .into_iter()
            .filter(|id| self.is_earned(*id) && !before.is_earned(*id))
            .collect()
    }
}

impl Serialize for BadgeBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BADGE_COUNT))?;
        for (id, earned) in self.iter() {
            map.serialize_entry(id.as_str(), &earned)?;
        }
        map.end()
    }
}

/// Derived badge views plus the "recently awarded" slot that drives the
/// award notification.
#[derive(Debug, Default)]
pub struct BadgeTracker {
    recent: Option<BadgeId>,
}

impl BadgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn earned_badges(&self, board: &BadgeBoard) -> Vec<&'static Badge> {
        BADGES.iter().filter(|badge| board.is_earned(badge.id)).collect()
    }

    pub fn locked_badges(&self, board: &BadgeBoard) -> Vec<&'static Badge> {
        BADGES.iter().filter(|badge| !board.is_earned(badge.id)).collect()
    }

    pub fn all_earned(&self, board: &BadgeBoard) -> bool {
        BadgeId::ALL.into_iter().all(|id| board.is_earned(id))
    }

    /// Awards `raw_id` if it names a known badge that is not yet earned.
    pub fn check_and_award(&mut self, store: &mut GameStore, raw_id: &str) -> bool {
        let Some(id) = BadgeId::parse(raw_id) else {
            return false;
        };
        if store.state().badges.is_earned(id) {
            return false;
        }
        store.award_badge(raw_id);
        self.recent = Some(id);
        info!(badge = %id, "badge_awarded");
        true
    }

    /// Records badges that content actions awarded directly through the store.
    ///
    /// Only one badge is held in the recent slot; when several land in one
    /// step the last one in registry order wins. The full list is returned so
    /// callers can announce all of them.
    pub fn observe_awards(&mut self, before: &BadgeBoard, after: &BadgeBoard) -> Vec<BadgeId> {
        let awarded = after.newly_earned_since(before);
        for id in &awarded {
            info!(badge = %id, "badge_awarded");
        }
        if let Some(last) = awarded.last() {
            self.recent = Some(*last);
        }
        awarded
    }

    pub fn recent(&self) -> Option<&'static Badge> {
        self.recent.map(BadgeId::badge)
    }

    pub fn clear_recent(&mut self) {
        self.recent = None;
    }
}
