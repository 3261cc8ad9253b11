//! Quest and streak progression engine for vault deposit/hold gamification.
//!
//! The dashboard feeds the [`engine::QuestEngine`] user commands
//! (start/claim/dismiss), deposit and withdraw confirmations (directly or
//! through [`bridge::EventBridge`]) and daily holding snapshots, then reads
//! quest state and streak records back for rendering.

pub mod bridge;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod date;
pub mod engine;
pub mod error;
pub mod model;
pub mod output;
pub mod script;
pub mod store;
pub mod streak;
pub mod ts;

pub use engine::QuestEngine;
pub use error::QuestError;
