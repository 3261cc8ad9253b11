//! Quest state machine.
//!
//! ```text
//! locked    --unlock-->      available
//! available --start-->       active
//! active    --progress met--> claimable
//! claimable --claim-->       completed
//! active    --expiry/violation--> failed
//! available --fail (dismiss)-->   failed
//! ```
//!
//! Every command is safe to call redundantly. A call that does not apply to
//! the quest's current state is ignored (logged at debug) and reported as
//! `false`/`None`, never as an error.

use crate::catalog::{milestone_progress, resolve_milestones, MilestoneProgress, UnlockCondition};
use crate::clock::Clock;
use crate::model::{
    Milestone, Quest, QuestKind, QuestState, RewardGrant, StreakEvent, StreakRecord, Transition,
};
use crate::store::QuestStore;
use crate::streak::StreakLedger;
use crate::ts::{days, hours, Instant};
use std::collections::BTreeSet;

pub struct QuestEngine {
    store: QuestStore,
    ledger: StreakLedger,
    clock: Box<dyn Clock>,
    milestones: Vec<Milestone>,
    grants: Vec<RewardGrant>,
    outbox: Vec<Transition>,
}

fn move_to(q: &mut Quest, to: QuestState, at: Instant, outbox: &mut Vec<Transition>) {
    tracing::debug!(quest_id = %q.id, from = q.state.as_str(), to = to.as_str(), "quest transition");
    outbox.push(Transition {
        quest_id: q.id.clone(),
        from: q.state,
        to,
        at,
    });
    q.state = to;
}

fn window_for(kind: &QuestKind) -> chrono::Duration {
    match kind {
        QuestKind::DepositOnce { .. } => hours(24),
        QuestKind::HoldDays { hold_days, .. }
        | QuestKind::Highroller { hold_days, .. }
        | QuestKind::HoldExisting { hold_days, .. } => days(*hold_days),
        QuestKind::DepositAndHold { hold_hours, .. } => hours(*hold_hours),
    }
}

fn within_window(q: &Quest, now: Instant) -> bool {
    match q.end_at {
        Some(end) => now < end,
        None => true,
    }
}

/// Elapsed share of the quest window, capped below 100 until it is done.
fn window_progress(q: &Quest, now: Instant) -> u8 {
    let (start, end) = match (q.started_at, q.end_at) {
        (Some(s), Some(e)) => (s, e),
        _ => return 0,
    };
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 99;
    }
    let elapsed = (now - start).num_milliseconds().clamp(0, total);
    ((elapsed * 100) / total).min(99) as u8
}

/// Records that a running hold-days or hold-existing quest has seen a
/// balance at its threshold. Hold quests only pay out with this evidence.
fn note_holding(q: &mut Quest, vault_id: &str, balance_usd: f64, now: Instant) {
    let threshold = match q.kind {
        QuestKind::HoldDays { hold_threshold_usd, .. }
        | QuestKind::HoldExisting { hold_threshold_usd, .. } => hold_threshold_usd,
        _ => return,
    };
    if q.state == QuestState::Active
        && q.held_at.is_none()
        && q.matches_vault(vault_id)
        && within_window(q, now)
        && balance_usd >= threshold
    {
        tracing::debug!(quest_id = %q.id, balance_usd, threshold, "holding observed");
        q.held_at = Some(now);
    }
}

fn valid_vault(vault_id: &str) -> bool {
    !vault_id.trim().is_empty()
}

fn valid_usd(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl QuestEngine {
    pub fn new(
        store: QuestStore,
        ledger: StreakLedger,
        clock: Box<dyn Clock>,
        milestones: Vec<Milestone>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            milestones,
            grants: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Default catalog, empty ledger, default milestone table.
    pub fn with_defaults(clock: impl Clock + 'static) -> Self {
        Self::new(
            QuestStore::with_default_catalog(),
            StreakLedger::new(),
            Box::new(clock),
            resolve_milestones(None),
        )
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    // ---- queries ----

    pub fn list(&self) -> &[Quest] {
        self.store.list()
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.store.get(id)
    }

    pub fn grants(&self) -> &[RewardGrant] {
        &self.grants
    }

    pub fn xp_total(&self) -> u64 {
        self.grants.iter().map(|g| g.xp as u64).sum()
    }

    pub fn get_record(&self, vault_id: &str, wallet: &str) -> StreakRecord {
        self.ledger.get_record(vault_id, wallet)
    }

    pub fn get_events(&self, vault_id: &str, wallet: &str) -> Vec<StreakEvent> {
        self.ledger.get_events(vault_id, wallet)
    }

    pub fn milestone_progress(&self, vault_id: &str, wallet: &str) -> MilestoneProgress {
        milestone_progress(&self.get_record(vault_id, wallet), &self.milestones)
    }

    pub fn streak_pairs(&self) -> Vec<(String, String)> {
        self.ledger.pairs()
    }

    /// Hands over every transition since the last drain, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.outbox)
    }

    // ---- commands ----

    pub fn record_snapshot_for_today(&mut self, vault_id: &str, wallet: &str, qualified: bool) -> bool {
        if !valid_vault(vault_id) || wallet.trim().is_empty() {
            tracing::warn!(vault_id, wallet, "ignoring snapshot with empty vault or wallet");
            return false;
        }
        self.ledger
            .record_snapshot_for_today(vault_id, wallet, qualified, self.clock.as_ref())
    }

    pub fn start(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        let q = match self.store.get_mut(id) {
            Some(q) => q,
            None => {
                tracing::debug!(quest_id = id, "start: unknown quest");
                return false;
            }
        };
        if q.state != QuestState::Available {
            tracing::debug!(quest_id = id, state = q.state.as_str(), "start ignored");
            return false;
        }

        q.started_at = Some(now);
        q.end_at = Some(now + window_for(&q.kind));
        q.progress_pct = 0;
        move_to(q, QuestState::Active, now, &mut self.outbox);
        true
    }

    /// System-triggered once a quest's progress condition holds.
    pub fn mark_claimable(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        let changed = match self.store.get_mut(id) {
            Some(q) if q.state == QuestState::Active => {
                q.claimable_at = Some(now);
                q.progress_pct = 100;
                move_to(q, QuestState::Claimable, now, &mut self.outbox);
                true
            }
            Some(q) => {
                tracing::debug!(quest_id = id, state = q.state.as_str(), "mark_claimable ignored");
                false
            }
            None => false,
        };
        if changed {
            self.apply_unlocks(now);
        }
        changed
    }

    /// Grants the quest's XP exactly once.
    pub fn claim(&mut self, id: &str) -> Option<RewardGrant> {
        let now = self.clock.now();
        let q = self.store.get_mut(id)?;
        if q.state != QuestState::Claimable {
            tracing::debug!(quest_id = id, state = q.state.as_str(), "claim ignored");
            return None;
        }

        q.completed_at = Some(now);
        move_to(q, QuestState::Completed, now, &mut self.outbox);
        let grant = RewardGrant {
            quest_id: q.id.clone(),
            xp: q.reward_xp,
            granted_at: now,
        };
        tracing::info!(quest_id = id, xp = grant.xp, "reward granted");
        self.grants.push(grant.clone());
        self.apply_unlocks(now);
        Some(grant)
    }

    /// Fails an available or active quest. Claimable, completed and locked
    /// quests are left alone so earned rewards cannot be lost.
    ///
    /// This is narrower than a forced `failed`: a quest that already earned
    /// its reward, or was never offered, cannot be failed.
    pub fn fail(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        match self.store.get_mut(id) {
            Some(q) if matches!(q.state, QuestState::Available | QuestState::Active) => {
                q.failed_at = Some(now);
                move_to(q, QuestState::Failed, now, &mut self.outbox);
                true
            }
            Some(q) => {
                tracing::debug!(quest_id = id, state = q.state.as_str(), "fail ignored");
                false
            }
            None => false,
        }
    }

    /// Hides a failed quest from the UI. State stays `failed`.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let now = self.clock.now();
        match self.store.get_mut(id) {
            Some(q) if q.state == QuestState::Failed && q.dismissed_at.is_none() => {
                q.dismissed_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// First active deposit quest in catalog order whose minimum the deposit
    /// meets becomes claimable. Active deposit-and-hold quests record the
    /// deposit and keep running their hold window, and a deposit at or above
    /// a hold quest's threshold counts as holding. Returns the id made
    /// claimable, if any.
    pub fn on_deposit_confirmed(&mut self, vault_id: &str, amount_usd: f64) -> Option<String> {
        if !valid_vault(vault_id) || !valid_usd(amount_usd) || amount_usd == 0.0 {
            tracing::warn!(vault_id, amount_usd, "ignoring malformed deposit event");
            return None;
        }
        let now = self.clock.now();

        let matched: Option<String> = self
            .store
            .list()
            .iter()
            .find(|q| {
                q.state == QuestState::Active
                    && q.matches_vault(vault_id)
                    && within_window(q, now)
                    && match q.kind {
                        QuestKind::DepositOnce { min_deposit_usd }
                        | QuestKind::Highroller { min_deposit_usd, .. } => min_deposit_usd <= amount_usd,
                        QuestKind::HoldDays { .. }
                        | QuestKind::DepositAndHold { .. }
                        | QuestKind::HoldExisting { .. } => false,
                    }
            })
            .map(|q| q.id.clone());

        for q in self.store.iter_mut() {
            note_holding(q, vault_id, amount_usd, now);
            if let QuestKind::DepositAndHold { min_deposit_usd, .. } = q.kind {
                if q.state == QuestState::Active
                    && q.deposited_at.is_none()
                    && q.matches_vault(vault_id)
                    && within_window(q, now)
                    && min_deposit_usd <= amount_usd
                {
                    tracing::debug!(quest_id = %q.id, "deposit recorded for hold quest");
                    q.deposited_at = Some(now);
                }
            }
        }

        if let Some(id) = matched.as_deref() {
            self.mark_claimable(id);
        }
        self.apply_unlocks(now);
        matched
    }

    /// Fails every active hold quest whose threshold the withdrawal crosses:
    /// the balance before was at or above it and the balance left is below.
    /// A deposit-and-hold quest only breaks once its deposit was recorded.
    /// The caller owns balance tracking and passes the balance held before
    /// this withdrawal. Returns the failed ids.
    pub fn on_withdraw_confirmed(
        &mut self,
        vault_id: &str,
        amount_usd: f64,
        balance_before_usd: f64,
    ) -> Vec<String> {
        if !valid_vault(vault_id) || !valid_usd(amount_usd) || !valid_usd(balance_before_usd) {
            tracing::warn!(
                vault_id,
                amount_usd,
                balance_before_usd,
                "ignoring malformed withdraw event"
            );
            return Vec::new();
        }
        let now = self.clock.now();
        let remaining = (balance_before_usd - amount_usd).max(0.0);

        let mut failed = Vec::new();
        for q in self.store.iter_mut() {
            let threshold = match q.kind.hold_threshold_usd() {
                Some(t) => t,
                None => continue,
            };
            let armed = match q.kind {
                QuestKind::DepositAndHold { .. } => q.deposited_at.is_some(),
                _ => true,
            };
            if q.state == QuestState::Active
                && armed
                && q.matches_vault(vault_id)
                && within_window(q, now)
                && balance_before_usd >= threshold
                && remaining < threshold
            {
                tracing::info!(quest_id = %q.id, remaining, threshold, "hold broken by withdrawal");
                q.failed_at = Some(now);
                move_to(q, QuestState::Failed, now, &mut self.outbox);
                failed.push(q.id.clone());
            } else {
                note_holding(q, vault_id, remaining, now);
            }
        }
        failed
    }

    /// Unlocks quests that wait for an existing position of a given size.
    /// Running hold quests whose threshold the balance meets record it as
    /// holding. Returns the unlocked ids.
    pub fn on_position_observed(&mut self, vault_id: &str, balance_usd: f64) -> Vec<String> {
        if !valid_vault(vault_id) || !valid_usd(balance_usd) {
            tracing::warn!(vault_id, balance_usd, "ignoring malformed position observation");
            return Vec::new();
        }
        let now = self.clock.now();
        let ids: Vec<String> = self
            .store
            .list()
            .iter()
            .filter(|q| q.state == QuestState::Locked && q.matches_vault(vault_id))
            .filter(|q| {
                matches!(
                    self.store.unlock_condition(&q.id),
                    Some(UnlockCondition::PositionAtLeast(min)) if balance_usd >= *min
                )
            })
            .map(|q| q.id.clone())
            .collect();

        for q in self.store.iter_mut() {
            note_holding(q, vault_id, balance_usd, now);
        }
        for id in ids.iter() {
            self.unlock(id, now);
        }
        ids
    }

    /// Settles quest windows against the clock. A hold quest that reached
    /// its end becomes claimable when a holding was observed during the
    /// window and fails otherwise. Deposit quests that ran out of time fail.
    /// Running hold quests get their progress refreshed. Returns the number
    /// of state transitions.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.outbox.len();

        for q in self.store.iter_mut() {
            if q.state != QuestState::Active {
                continue;
            }
            if within_window(q, now) {
                match q.kind {
                    QuestKind::HoldDays { .. } | QuestKind::HoldExisting { .. }
                        if q.held_at.is_some() =>
                    {
                        q.progress_pct = window_progress(q, now);
                    }
                    QuestKind::DepositAndHold { .. } if q.deposited_at.is_some() => {
                        q.progress_pct = window_progress(q, now);
                    }
                    _ => {}
                }
                continue;
            }

            let reached = match q.kind {
                QuestKind::HoldDays { .. } | QuestKind::HoldExisting { .. } => {
                    q.held_at.is_some()
                }
                QuestKind::DepositAndHold { .. } => q.deposited_at.is_some(),
                QuestKind::DepositOnce { .. } | QuestKind::Highroller { .. } => false,
            };
            if reached {
                q.claimable_at = Some(now);
                q.progress_pct = 100;
                move_to(q, QuestState::Claimable, now, &mut self.outbox);
            } else {
                tracing::info!(quest_id = %q.id, "quest window expired");
                q.failed_at = Some(now);
                move_to(q, QuestState::Failed, now, &mut self.outbox);
            }
        }

        self.apply_unlocks(now);
        self.outbox.len() - before
    }

    fn unlock(&mut self, id: &str, now: Instant) {
        if let Some(q) = self.store.get_mut(id) {
            if q.state == QuestState::Locked {
                tracing::info!(quest_id = id, "quest unlocked");
                q.locked_reason = None;
                move_to(q, QuestState::Available, now, &mut self.outbox);
            }
        }
    }

    /// Opens locked quests whose prerequisite quest is claimable or completed.
    fn apply_unlocks(&mut self, now: Instant) {
        let done: BTreeSet<&str> = self
            .store
            .list()
            .iter()
            .filter(|q| matches!(q.state, QuestState::Claimable | QuestState::Completed))
            .map(|q| q.id.as_str())
            .collect();

        let ids: Vec<String> = self
            .store
            .list()
            .iter()
            .filter(|q| q.state == QuestState::Locked)
            .filter(|q| {
                matches!(
                    self.store.unlock_condition(&q.id),
                    Some(UnlockCondition::QuestDone(prereq)) if done.contains(prereq)
                )
            })
            .map(|q| q.id.clone())
            .collect();

        for id in ids.iter() {
            self.unlock(id, now);
        }
    }
}
