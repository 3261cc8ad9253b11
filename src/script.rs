//! Replay scripts: a timestamped list of commands and confirmations run
//! against a fresh engine. Used by `quests replay`.

use crate::bridge::{EventBridge, EventSender, InboundEvent};
use crate::catalog::MilestoneProgress;
use crate::clock::ManualClock;
use crate::engine::QuestEngine;
use crate::error::CliError;
use crate::model::{Milestone, Quest, RewardGrant, StreakEvent, Transition};
use crate::store::QuestStore;
use crate::streak::StreakLedger;
use crate::ts::{parse_instant, Instant};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Step {
    pub at: String,
    #[serde(flatten)]
    pub op: Op,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Start {
        id: String,
    },
    Claim {
        id: String,
    },
    Fail {
        id: String,
    },
    Dismiss {
        id: String,
    },
    Deposit {
        vault_id: Option<String>,
        amount_usd: Option<f64>,
    },
    Withdraw {
        vault_id: Option<String>,
        amount_usd: Option<f64>,
        balance_before_usd: Option<f64>,
    },
    Position {
        vault_id: String,
        balance_usd: f64,
    },
    Snapshot {
        vault_id: String,
        wallet: String,
        qualified: bool,
    },
    Tick,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StreakRow {
    pub vault_id: String,
    pub wallet: String,
    pub current: u32,
    pub longest: u32,
    pub milestones: MilestoneProgress,
    pub events: Vec<StreakEvent>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReplayReport {
    pub quests: Vec<Quest>,
    pub streaks: Vec<StreakRow>,
    pub grants: Vec<RewardGrant>,
    pub xp_total: u64,
    pub transitions: Vec<Transition>,
}

pub fn parse_script(txt: &str) -> Result<Script, CliError> {
    serde_json::from_str(txt).map_err(|e| CliError::usage(format!("Invalid script: {}", e)))
}

fn parse_steps(script: &Script) -> Result<Vec<(Instant, &Op)>, CliError> {
    let mut out: Vec<(Instant, &Op)> = Vec::with_capacity(script.steps.len());
    for (i, step) in script.steps.iter().enumerate() {
        let at = parse_instant(&step.at, &format!("steps[{}].at", i))?;
        if let Some((prev, _)) = out.last() {
            if at < *prev {
                return Err(CliError::usage(format!(
                    "steps[{}].at goes back in time: {}",
                    i, step.at
                )));
            }
        }
        out.push((at, &step.op));
    }
    Ok(out)
}

fn run_op(engine: &mut QuestEngine, events: &EventBridge, tx: &EventSender, op: &Op) {
    match op {
        Op::Start { id } => {
            engine.start(id);
        }
        Op::Claim { id } => {
            engine.claim(id);
        }
        Op::Fail { id } => {
            engine.fail(id);
        }
        Op::Dismiss { id } => {
            engine.dismiss(id);
        }
        Op::Deposit {
            vault_id,
            amount_usd,
        } => {
            tx.emit(InboundEvent::DepositConfirmed {
                vault_id: vault_id.clone(),
                amount_usd: *amount_usd,
            });
            events.pump(engine);
        }
        Op::Withdraw {
            vault_id,
            amount_usd,
            balance_before_usd,
        } => {
            tx.emit(InboundEvent::WithdrawConfirmed {
                vault_id: vault_id.clone(),
                amount_usd: *amount_usd,
                balance_before_usd: *balance_before_usd,
            });
            events.pump(engine);
        }
        Op::Position {
            vault_id,
            balance_usd,
        } => {
            engine.on_position_observed(vault_id, *balance_usd);
        }
        Op::Snapshot {
            vault_id,
            wallet,
            qualified,
        } => {
            engine.record_snapshot_for_today(vault_id, wallet, *qualified);
        }
        Op::Tick => {
            engine.tick();
        }
    }
}

/// Runs every step against a fresh engine. The clock starts at `start`
/// (or the first step) and is moved to each step's `at` before it runs.
pub fn replay(
    script: &Script,
    milestones: Vec<Milestone>,
    start: Option<Instant>,
) -> Result<ReplayReport, CliError> {
    let steps = parse_steps(script)?;
    let origin = match (start, steps.first()) {
        (Some(s), _) => s,
        (None, Some((at, _))) => *at,
        (None, None) => chrono::Utc::now(),
    };

    let clock = ManualClock::new(origin);
    let mut engine = QuestEngine::new(
        QuestStore::with_default_catalog(),
        StreakLedger::new(),
        Box::new(clock.clone()),
        milestones,
    );
    let (tx, events) = EventBridge::channel();

    for (at, op) in steps {
        clock.set(at);
        run_op(&mut engine, &events, &tx, op);
    }

    let streaks: Vec<StreakRow> = engine
        .streak_pairs()
        .into_iter()
        .map(|(vault_id, wallet)| {
            let record = engine.get_record(&vault_id, &wallet);
            StreakRow {
                current: record.current,
                longest: record.longest,
                milestones: engine.milestone_progress(&vault_id, &wallet),
                events: engine.get_events(&vault_id, &wallet),
                vault_id,
                wallet,
            }
        })
        .collect();

    Ok(ReplayReport {
        quests: engine.list().to_vec(),
        streaks,
        grants: engine.grants().to_vec(),
        xp_total: engine.xp_total(),
        transitions: engine.drain_transitions(),
    })
}
