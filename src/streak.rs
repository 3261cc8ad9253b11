use crate::clock::Clock;
use crate::date::DayKey;
use crate::model::{StreakEvent, StreakRecord};
use crate::ts::day_key_of;
use std::collections::BTreeMap;

type LedgerKey = (String, String);

/// Daily holding snapshots per (vault, wallet).
///
/// Only the raw day-key → qualified map is stored; streak counters are
/// recomputed on every read.
#[derive(Debug, Clone, Default)]
pub struct StreakLedger {
    days: BTreeMap<LedgerKey, BTreeMap<DayKey, bool>>,
}

fn key(vault_id: &str, wallet: &str) -> LedgerKey {
    (vault_id.to_string(), wallet.to_string())
}

impl StreakLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `day`. The first write for a day wins; later
    /// writes for the same day are ignored. Returns true when a new event was
    /// stored.
    pub fn record_snapshot(&mut self, vault_id: &str, wallet: &str, day: DayKey, qualified: bool) -> bool {
        let days = self.days.entry(key(vault_id, wallet)).or_default();
        if let Some(existing) = days.get(&day) {
            tracing::debug!(
                vault_id,
                wallet,
                day = %day,
                existing = *existing,
                ignored = qualified,
                "snapshot already recorded for day"
            );
            return false;
        }
        tracing::debug!(vault_id, wallet, day = %day, qualified, "snapshot recorded");
        days.insert(day, qualified);
        true
    }

    pub fn record_snapshot_for_today(
        &mut self,
        vault_id: &str,
        wallet: &str,
        qualified: bool,
        clock: &dyn Clock,
    ) -> bool {
        let today = day_key_of(&clock.now());
        self.record_snapshot(vault_id, wallet, today, qualified)
    }

    pub fn get_events(&self, vault_id: &str, wallet: &str) -> Vec<StreakEvent> {
        match self.days.get(&key(vault_id, wallet)) {
            None => Vec::new(),
            Some(days) => days
                .iter()
                .map(|(day, qualified)| StreakEvent {
                    day: day.clone(),
                    qualified: *qualified,
                })
                .collect(),
        }
    }

    pub fn get_record(&self, vault_id: &str, wallet: &str) -> StreakRecord {
        compute_record(&self.get_events(vault_id, wallet))
    }

    /// All (vault, wallet) pairs with at least one event.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.days.keys().cloned().collect()
    }
}

/// Walks events in day order. `current` is the run as of the latest recorded
/// day; a missing or unqualified day breaks the run.
pub fn compute_record(events: &[StreakEvent]) -> StreakRecord {
    let mut sorted: Vec<&StreakEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.day.cmp(&b.day));

    let mut run = 0u32;
    let mut longest = 0u32;
    let mut last_qualified: Option<&DayKey> = None;

    for ev in sorted {
        if !ev.qualified {
            run = 0;
            last_qualified = None;
            continue;
        }
        let consecutive = matches!(last_qualified, Some(prev) if prev.days_until(&ev.day) == 1);
        run = if consecutive { run + 1 } else { 1 };
        longest = longest.max(run);
        last_qualified = Some(&ev.day);
    }

    StreakRecord {
        current: run,
        longest,
    }
}
