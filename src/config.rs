//! Flag-then-environment resolution for the `quests` binary.

use crate::catalog::resolve_milestones;
use crate::error::CliError;
use crate::model::{Milestone, RewardTier};
use crate::ts::{parse_instant, Instant};
use std::fs;

pub const ENV_NOW: &str = "QUESTS_NOW";
pub const ENV_REWARDS: &str = "QUESTS_REWARDS";
pub const ENV_LOG: &str = "QUESTS_LOG";

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Logical "now": `--now`, then `QUESTS_NOW`, else `None` (system clock).
pub fn resolve_now(cli_now: Option<&str>) -> Result<Option<Instant>, CliError> {
    if let Some(t) = cli_now {
        return Ok(Some(parse_instant(t, "now")?));
    }
    match env_nonempty(ENV_NOW) {
        Some(t) => Ok(Some(parse_instant(&t, "now")?)),
        None => Ok(None),
    }
}

pub fn resolve_rewards_path(cli_rewards: Option<&str>) -> Option<String> {
    cli_rewards
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| env_nonempty(ENV_REWARDS))
}

pub fn parse_reward_tiers(txt: &str) -> Result<Vec<RewardTier>, CliError> {
    serde_json::from_str(txt).map_err(|e| CliError::usage(format!("Invalid reward config: {}", e)))
}

/// Milestones from the reward config file, or the defaults when none is set.
pub fn load_milestones(rewards_path: Option<&str>) -> Result<Vec<Milestone>, CliError> {
    match rewards_path {
        None => Ok(resolve_milestones(None)),
        Some(p) => {
            let txt = fs::read_to_string(p)
                .map_err(|_| CliError::io(format!("Cannot read reward config: {}", p)))?;
            let tiers = parse_reward_tiers(&txt)?;
            tracing::debug!(path = p, tiers = tiers.len(), "loaded reward tiers");
            Ok(resolve_milestones(Some(&tiers)))
        }
    }
}

pub fn resolve_color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    std::env::var_os("NO_COLOR").is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_tiers_parse_from_server_shape() {
        let tiers = parse_reward_tiers(r#"[{"threshold": 3}, {"threshold": 5}]"#).unwrap();
        assert_eq!(tiers, vec![RewardTier { threshold: 3 }, RewardTier { threshold: 5 }]);
        assert!(parse_reward_tiers("{").is_err());
    }

    #[test]
    fn cli_now_wins_and_is_validated() {
        let at = resolve_now(Some("2026-01-31T00:00:00Z")).unwrap().unwrap();
        assert_eq!(crate::ts::format_instant(&at), "2026-01-31T00:00:00.000Z");
        let err = resolve_now(Some("yesterday")).unwrap_err();
        assert_eq!(err.exit_code, 2);
    }

    #[test]
    fn missing_rewards_file_is_io_error() {
        let err = load_milestones(Some("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code, 5);
        assert_eq!(load_milestones(None).unwrap().len(), 5);
    }
}
