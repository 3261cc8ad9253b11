use crate::date::DayKey;
use crate::ts::Instant;

/// Trigger conditions per quest kind. Each variant carries only the
/// thresholds that kind reads.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestKind {
    DepositOnce {
        min_deposit_usd: f64,
    },
    HoldDays {
        hold_days: u32,
        hold_threshold_usd: f64,
    },
    Highroller {
        min_deposit_usd: f64,
        hold_days: u32,
    },
    DepositAndHold {
        min_deposit_usd: f64,
        hold_hours: u32,
        hold_threshold_usd: f64,
    },
    HoldExisting {
        hold_threshold_usd: f64,
        hold_days: u32,
    },
}

impl QuestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestKind::DepositOnce { .. } => "deposit_once",
            QuestKind::HoldDays { .. } => "hold_days",
            QuestKind::Highroller { .. } => "highroller",
            QuestKind::DepositAndHold { .. } => "deposit_and_hold",
            QuestKind::HoldExisting { .. } => "hold_existing",
        }
    }

    /// Threshold below which a withdrawal breaks the quest, for hold kinds.
    pub fn hold_threshold_usd(&self) -> Option<f64> {
        match self {
            QuestKind::HoldDays { hold_threshold_usd, .. }
            | QuestKind::DepositAndHold { hold_threshold_usd, .. }
            | QuestKind::HoldExisting { hold_threshold_usd, .. } => Some(*hold_threshold_usd),
            QuestKind::DepositOnce { .. } | QuestKind::Highroller { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    Locked,
    Available,
    Active,
    Claimable,
    Completed,
    Failed,
}

impl QuestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestState::Locked => "locked",
            QuestState::Available => "available",
            QuestState::Active => "active",
            QuestState::Claimable => "claimable",
            QuestState::Completed => "completed",
            QuestState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quest {
    pub id: String,
    #[serde(flatten)]
    pub kind: QuestKind,
    pub title: String,
    pub description: String,
    pub reward_xp: u32,
    pub vault_id: Option<String>,
    pub state: QuestState,
    pub locked_reason: Option<String>,
    pub progress_pct: u8,
    pub started_at: Option<Instant>,
    pub end_at: Option<Instant>,
    pub deposited_at: Option<Instant>,
    /// First time a balance at or above the hold threshold was seen while
    /// the quest was running.
    pub held_at: Option<Instant>,
    pub claimable_at: Option<Instant>,
    pub completed_at: Option<Instant>,
    pub failed_at: Option<Instant>,
    pub dismissed_at: Option<Instant>,
}

impl Quest {
    /// Vault-scoped quests only react to events for their own vault.
    pub fn matches_vault(&self, vault_id: &str) -> bool {
        match self.vault_id.as_deref() {
            Some(v) => v == vault_id,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreakEvent {
    pub day: DayKey,
    pub qualified: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreakRecord {
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Milestone {
    pub days: u32,
    pub xp: u32,
}

/// Reward tier as delivered by the reward-config service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RewardTier {
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RewardGrant {
    pub quest_id: String,
    pub xp: u32,
    pub granted_at: Instant,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Transition {
    pub quest_id: String,
    pub from: QuestState,
    pub to: QuestState,
    pub at: Instant,
}
