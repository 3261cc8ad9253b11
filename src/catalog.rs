use crate::model::{Milestone, Quest, QuestKind, QuestState, RewardTier, StreakRecord};

/// Streak-length reward tiers used when the reward service sends nothing.
pub const DEFAULT_MILESTONES: [Milestone; 5] = [
    Milestone { days: 1, xp: 100 },
    Milestone { days: 3, xp: 300 },
    Milestone { days: 7, xp: 1000 },
    Milestone { days: 14, xp: 2400 },
    Milestone { days: 30, xp: 6000 },
];

/// What a locked quest waits for.
#[derive(Debug, Clone, PartialEq)]
pub enum UnlockCondition {
    /// Another quest reached claimable or completed.
    QuestDone(&'static str),
    /// A vault position of at least this many USD was observed.
    PositionAtLeast(f64),
}

/// Immutable quest template.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestDef {
    pub id: &'static str,
    pub kind: QuestKind,
    pub title: &'static str,
    pub description: &'static str,
    pub reward_xp: u32,
    pub vault_id: Option<&'static str>,
    pub unlock: Option<UnlockCondition>,
}

impl QuestDef {
    pub fn locked_reason(&self) -> Option<String> {
        match &self.unlock {
            None => None,
            Some(UnlockCondition::QuestDone(prereq)) => {
                Some(format!("Complete {} first", prereq))
            }
            Some(UnlockCondition::PositionAtLeast(usd)) => {
                Some(format!("Requires an existing position of at least ${}", usd))
            }
        }
    }

    pub fn instantiate(&self) -> Quest {
        let locked_reason = self.locked_reason();
        Quest {
            id: self.id.to_string(),
            kind: self.kind.clone(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            reward_xp: self.reward_xp,
            vault_id: self.vault_id.map(|v| v.to_string()),
            state: if locked_reason.is_some() {
                QuestState::Locked
            } else {
                QuestState::Available
            },
            locked_reason,
            progress_pct: 0,
            started_at: None,
            end_at: None,
            deposited_at: None,
            held_at: None,
            claimable_at: None,
            completed_at: None,
            failed_at: None,
            dismissed_at: None,
        }
    }
}

pub fn default_catalog() -> Vec<QuestDef> {
    vec![
        QuestDef {
            id: "welcome_5",
            kind: QuestKind::DepositOnce { min_deposit_usd: 5.0 },
            title: "Welcome deposit",
            description: "Deposit at least $5 into any vault within 24 hours.",
            reward_xp: 50,
            vault_id: None,
            unlock: None,
        },
        QuestDef {
            id: "deposit_50",
            kind: QuestKind::DepositOnce { min_deposit_usd: 50.0 },
            title: "Getting serious",
            description: "Deposit at least $50 into any vault within 24 hours.",
            reward_xp: 150,
            vault_id: None,
            unlock: Some(UnlockCondition::QuestDone("welcome_5")),
        },
        QuestDef {
            id: "highroller_500",
            kind: QuestKind::Highroller {
                min_deposit_usd: 500.0,
                hold_days: 7,
            },
            title: "Highroller",
            description: "Deposit at least $500 in a single transaction within 7 days.",
            reward_xp: 1000,
            vault_id: None,
            unlock: Some(UnlockCondition::QuestDone("deposit_50")),
        },
        QuestDef {
            id: "hold_7d",
            kind: QuestKind::HoldDays {
                hold_days: 7,
                hold_threshold_usd: 1.0,
            },
            title: "Diamond hands",
            description: "Keep at least $1 in the vault for 7 days.",
            reward_xp: 400,
            vault_id: None,
            unlock: None,
        },
        QuestDef {
            id: "deposit_and_hold_100",
            kind: QuestKind::DepositAndHold {
                min_deposit_usd: 100.0,
                hold_hours: 72,
                hold_threshold_usd: 100.0,
            },
            title: "Deposit and hold",
            description: "Deposit $100 and keep at least $100 in the vault for 72 hours.",
            reward_xp: 600,
            vault_id: None,
            unlock: None,
        },
        QuestDef {
            id: "hold_existing_25",
            kind: QuestKind::HoldExisting {
                hold_threshold_usd: 25.0,
                hold_days: 3,
            },
            title: "Steady holder",
            description: "Keep an existing position of at least $25 for 3 days.",
            reward_xp: 200,
            vault_id: None,
            unlock: Some(UnlockCondition::PositionAtLeast(25.0)),
        },
    ]
}

/// Maps server-provided tiers onto the default XP table by threshold.
///
/// Unknown thresholds get 0 XP. With no server tiers the default table is
/// returned as-is.
pub fn resolve_milestones(server_rewards: Option<&[RewardTier]>) -> Vec<Milestone> {
    match server_rewards {
        None => DEFAULT_MILESTONES.to_vec(),
        Some(tiers) => tiers
            .iter()
            .map(|t| Milestone {
                days: t.threshold,
                xp: DEFAULT_MILESTONES
                    .iter()
                    .find(|m| m.days == t.threshold)
                    .map(|m| m.xp)
                    .unwrap_or(0),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MilestoneProgress {
    pub current: u32,
    pub reached: Vec<Milestone>,
    pub next: Option<Milestone>,
    pub days_to_next: Option<u32>,
}

pub fn milestone_progress(record: &StreakRecord, milestones: &[Milestone]) -> MilestoneProgress {
    let mut sorted: Vec<Milestone> = milestones.to_vec();
    sorted.sort_by_key(|m| m.days);

    let reached: Vec<Milestone> = sorted
        .iter()
        .filter(|m| m.days <= record.current)
        .copied()
        .collect();
    let next = sorted.iter().find(|m| m.days > record.current).copied();

    MilestoneProgress {
        current: record.current,
        reached,
        days_to_next: next.map(|m| m.days - record.current),
        next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_milestones_when_no_server_config() {
        let got = resolve_milestones(None);
        let pairs: Vec<(u32, u32)> = got.iter().map(|m| (m.days, m.xp)).collect();
        assert_eq!(pairs, vec![(1, 100), (3, 300), (7, 1000), (14, 2400), (30, 6000)]);
    }

    #[test]
    fn server_tiers_map_by_threshold_with_zero_fallback() {
        let tiers = [
            RewardTier { threshold: 7 },
            RewardTier { threshold: 2 },
            RewardTier { threshold: 30 },
        ];
        let got = resolve_milestones(Some(&tiers));
        assert_eq!(
            got,
            vec![
                Milestone { days: 7, xp: 1000 },
                Milestone { days: 2, xp: 0 },
                Milestone { days: 30, xp: 6000 },
            ]
        );
        assert!(resolve_milestones(Some(&[])).is_empty());
    }

    #[test]
    fn catalog_ids_are_unique_and_chain_is_locked() {
        let cat = default_catalog();
        let mut ids: Vec<&str> = cat.iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), cat.len());

        let deposit_50 = cat.iter().find(|d| d.id == "deposit_50").unwrap().instantiate();
        assert_eq!(deposit_50.state, QuestState::Locked);
        assert_eq!(deposit_50.locked_reason.as_deref(), Some("Complete welcome_5 first"));

        let welcome = cat[0].instantiate();
        assert_eq!(welcome.state, QuestState::Available);
        assert!(welcome.locked_reason.is_none());
    }

    #[test]
    fn progress_reports_next_tier() {
        let p = milestone_progress(&StreakRecord { current: 4, longest: 9 }, &DEFAULT_MILESTONES);
        assert_eq!(p.reached.len(), 2);
        assert_eq!(p.next, Some(Milestone { days: 7, xp: 1000 }));
        assert_eq!(p.days_to_next, Some(3));

        let done = milestone_progress(&StreakRecord { current: 45, longest: 45 }, &DEFAULT_MILESTONES);
        assert_eq!(done.reached.len(), 5);
        assert!(done.next.is_none());
        assert!(done.days_to_next.is_none());
    }
}
