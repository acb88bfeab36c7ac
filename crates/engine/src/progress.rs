use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

pub const PROGRESS_STORAGE_KEY: &str = "pirates-progress";
pub const HINT_COST: u32 = 5;
pub const XP_FLOAT_LIFETIME: Duration = Duration::from_millis(1_500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpReward {
    CorrectDrop,
    CorrectDodge,
    FirstTry,
    LevelComplete,
}

impl XpReward {
    pub fn amount(self) -> u32 {
        match self {
            Self::CorrectDrop => 10,
            Self::CorrectDodge => 15,
            Self::FirstTry => 5,
            Self::LevelComplete => 50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CorrectDrop => "+10 XP",
            Self::CorrectDodge => "+15 XP",
            Self::FirstTry => "+5 BONUS",
            Self::LevelComplete => "+50 XP Level Complete!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub min: u32,
    pub title: &'static str,
    pub emoji: &'static str,
}

pub static RANKS: [Rank; 4] = [
    Rank {
        min: 0,
        title: "Deck Swabber",
        emoji: "\u{1F9F9}",
    },
    Rank {
        min: 50,
        title: "First Mate",
        emoji: "\u{2693}",
    },
    Rank {
        min: 150,
        title: "Captain",
        emoji: "\u{1F3F4}\u{200D}\u{2620}\u{FE0F}",
    },
    Rank {
        min: 300,
        title: "Admiral",
        emoji: "\u{1F451}",
    },
];

pub fn rank_for(xp: u32) -> &'static Rank {
    RANKS
        .iter()
        .rev()
        .find(|rank| xp >= rank.min)
        .unwrap_or(&RANKS[0])
}

pub fn next_rank_for(xp: u32) -> Option<&'static Rank> {
    RANKS.iter().find(|rank| xp < rank.min)
}

/// Transient "+N XP" popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpFloat {
    pub id: u64,
    pub amount: u32,
    pub label: String,
    expires_in: Duration,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressRecord {
    #[serde(default)]
    xp: u32,
}

/// Experience counter persisted under [`PROGRESS_STORAGE_KEY`], independent of
/// the game state so it survives `reset`.
pub struct ProgressTracker {
    storage: Box<dyn KeyValueStore>,
    xp: u32,
    floats: Vec<XpFloat>,
    next_float_id: u64,
}

impl ProgressTracker {
    /// Missing or unreadable progress starts the counter at zero.
    pub fn load(storage: Box<dyn KeyValueStore>) -> Self {
        let xp = match storage.get(PROGRESS_STORAGE_KEY) {
            Ok(Some(raw)) => parse_record(&raw).xp,
            Ok(None) => 0,
            Err(error) => {
                warn!(error = %error, "progress_load_failed");
                0
            }
        };
        Self {
            storage,
            xp,
            floats: Vec::new(),
            next_float_id: 0,
        }
    }

    pub fn xp(&self) -> u32 {
        self.xp
    }

    pub fn rank(&self) -> &'static Rank {
        rank_for(self.xp)
    }

    pub fn next_rank(&self) -> Option<&'static Rank> {
        next_rank_for(self.xp)
    }

    /// Zero once the top rank is reached.
    pub fn xp_to_next(&self) -> u32 {
        self.next_rank().map_or(0, |next| next.min - self.xp)
    }

    /// Percent of the way from the current rank to the next one.
    pub fn xp_progress(&self) -> f64 {
        let Some(next) = self.next_rank() else {
            return 100.0;
        };
        let floor = self.rank().min;
        f64::from(self.xp - floor) / f64::from(next.min - floor) * 100.0
    }

    pub fn floats(&self) -> &[XpFloat] {
        &self.floats
    }

    pub fn add_xp(&mut self, amount: u32, label: Option<&str>) {
        self.xp = self.xp.saturating_add(amount);
        self.next_float_id += 1;
        self.floats.push(XpFloat {
            id: self.next_float_id,
            amount,
            label: label.map_or_else(|| format!("+{amount} XP"), str::to_string),
            expires_in: XP_FLOAT_LIFETIME,
        });
        info!(amount, xp = self.xp, "xp_awarded");
        self.persist();
    }

    pub fn award(&mut self, reward: XpReward) {
        self.add_xp(reward.amount(), Some(reward.label()));
    }

    /// Returns whether the hint was paid for.
    pub fn spend_hint(&mut self) -> bool {
        if self.xp < HINT_COST {
            return false;
        }
        self.xp -= HINT_COST;
        self.persist();
        true
    }

    /// Ages popups and drops the expired ones.
    pub fn update(&mut self, dt: Duration) {
        for float in &mut self.floats {
            float.expires_in = float.expires_in.saturating_sub(dt);
        }
        self.floats.retain(|float| !float.expires_in.is_zero());
    }

    fn persist(&mut self) {
        if let Err(error) = self.save() {
            warn!(error = %error, "progress_save_failed");
        }
    }

    fn save(&mut self) -> Result<(), StorageError> {
        let record = ProgressRecord { xp: self.xp };
        let encoded = serde_json::to_string(&record).map_err(|source| StorageError::Encode {
            key: PROGRESS_STORAGE_KEY.to_string(),
            source,
        })?;
        self.storage.set(PROGRESS_STORAGE_KEY, &encoded)
    }
}

fn parse_record(raw: &str) -> ProgressRecord {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, ProgressRecord>(&mut deserializer) {
        Ok(record) => record,
        Err(error) => {
            warn!(path = %error.path(), error = %error.inner(), "progress_record_corrupt");
            ProgressRecord::default()
        }
    }
}
