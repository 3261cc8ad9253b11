//! Inbound event boundary between the dashboard and the engine.
//!
//! The UI side holds an [`EventSender`] and fires confirmations at it; the
//! owner of the engine pumps the [`EventBridge`], which applies each queued
//! event to completion before looking at the next one.

use crate::engine::QuestEngine;
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum InboundEvent {
    #[serde(rename = "deposit:confirmed")]
    DepositConfirmed {
        vault_id: Option<String>,
        amount_usd: Option<f64>,
    },
    #[serde(rename = "withdraw:confirmed")]
    WithdrawConfirmed {
        vault_id: Option<String>,
        amount_usd: Option<f64>,
        balance_before_usd: Option<f64>,
    },
}

impl InboundEvent {
    pub fn deposit(vault_id: &str, amount_usd: f64) -> Self {
        InboundEvent::DepositConfirmed {
            vault_id: Some(vault_id.to_string()),
            amount_usd: Some(amount_usd),
        }
    }

    pub fn withdraw(vault_id: &str, amount_usd: f64, balance_before_usd: f64) -> Self {
        InboundEvent::WithdrawConfirmed {
            vault_id: Some(vault_id.to_string()),
            amount_usd: Some(amount_usd),
            balance_before_usd: Some(balance_before_usd),
        }
    }
}

/// Applies one event. Events with missing fields are dropped with a warning;
/// value checks happen inside the engine. Returns whether the event was
/// well-formed enough to hand to the engine.
pub fn apply(engine: &mut QuestEngine, event: &InboundEvent) -> bool {
    match event {
        InboundEvent::DepositConfirmed {
            vault_id: Some(vault_id),
            amount_usd: Some(amount_usd),
        } => {
            engine.on_deposit_confirmed(vault_id, *amount_usd);
            true
        }
        InboundEvent::WithdrawConfirmed {
            vault_id: Some(vault_id),
            amount_usd: Some(amount_usd),
            balance_before_usd: Some(balance_before_usd),
        } => {
            engine.on_withdraw_confirmed(vault_id, *amount_usd, *balance_before_usd);
            true
        }
        other => {
            tracing::warn!(event = ?other, "dropping event with missing fields");
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<InboundEvent>,
}

impl EventSender {
    /// Fire-and-forget. If the bridge is gone the event is dropped.
    pub fn emit(&self, event: InboundEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(event = ?e.0, "event bridge closed; event dropped");
        }
    }
}

#[derive(Debug)]
pub struct EventBridge {
    rx: Receiver<InboundEvent>,
}

impl EventBridge {
    pub fn channel() -> (EventSender, EventBridge) {
        let (tx, rx) = channel();
        (EventSender { tx }, EventBridge { rx })
    }

    /// Applies every queued event in arrival order. Returns how many events
    /// were taken off the queue.
    pub fn pump(&self, engine: &mut QuestEngine) -> usize {
        let mut n = 0usize;
        while let Ok(event) = self.rx.try_recv() {
            apply(engine, &event);
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::QuestState;
    use crate::ts::parse_instant;

    fn engine() -> QuestEngine {
        let clock = ManualClock::new(parse_instant("2026-01-31T12:00:00Z", "at").unwrap());
        QuestEngine::with_defaults(clock)
    }

    #[test]
    fn event_names_on_the_wire() {
        let ev: InboundEvent =
            serde_json::from_str(r#"{"type":"deposit:confirmed","vault_id":"v1","amount_usd":5}"#).unwrap();
        assert_eq!(ev, InboundEvent::deposit("v1", 5.0));

        let ev: InboundEvent = serde_json::from_str(r#"{"type":"withdraw:confirmed","vault_id":"v1"}"#).unwrap();
        assert_eq!(
            ev,
            InboundEvent::WithdrawConfirmed {
                vault_id: Some("v1".to_string()),
                amount_usd: None,
                balance_before_usd: None,
            }
        );
    }

    #[test]
    fn pump_applies_in_order() {
        let mut e = engine();
        e.start("welcome_5");
        let (tx, bridge) = EventBridge::channel();
        tx.emit(InboundEvent::deposit("v1", 1.0));
        tx.emit(InboundEvent::deposit("v1", 5.0));
        assert_eq!(bridge.pump(&mut e), 2);
        assert_eq!(e.get("welcome_5").unwrap().state, QuestState::Claimable);
        assert_eq!(bridge.pump(&mut e), 0);
    }

    #[test]
    fn missing_fields_are_dropped() {
        let mut e = engine();
        e.start("welcome_5");
        let ev = InboundEvent::DepositConfirmed {
            vault_id: Some("v1".to_string()),
            amount_usd: None,
        };
        assert!(!apply(&mut e, &ev));
        assert_eq!(e.get("welcome_5").unwrap().state, QuestState::Active);
    }

    #[test]
    fn emit_after_bridge_dropped_does_not_panic() {
        let (tx, bridge) = EventBridge::channel();
        drop(bridge);
        tx.emit(InboundEvent::deposit("v1", 5.0));
    }
}
