//! Game configuration: per-seat models, shuffle seed and policy flags.
//!
//! Supplied before orchestration starts, either programmatically or from a
//! YAML file. The model mapping is opaque to the rules: seat `i` plays with
//! `models[i]`, and the reserved id `mock` runs that seat offline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GameError;
use crate::roles;

/// Reserved model id for the offline canned provider.
pub const MOCK_MODEL: &str = "mock";

fn default_leader_votes() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_call_timeout_secs() -> u64 {
    300
}

/// Everything the orchestrator needs to start a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Model identifier per seat; the index is the seat id.
    pub models: Vec<String>,

    /// Seed for the role shuffle and tie-breaks. Omit for a random game;
    /// the drawn seed is logged so any game can be replayed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Whether the leader casts a normal vote on their own proposal.
    /// When false the leader's vote is recorded as approve without a call.
    #[serde(default = "default_leader_votes")]
    pub leader_votes: bool,

    /// Attempts per LLM call before the seat falls back to its safe default.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Deadline for a single LLM call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Where the event log and transcripts are written. Defaults to the
    /// CLI's `--output` when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl GameConfig {
    /// A config with the same model on every seat.
    pub fn uniform(model: impl Into<String>, num_players: usize) -> Self {
        let model = model.into();
        Self {
            models: vec![model; num_players],
            seed: None,
            leader_votes: default_leader_votes(),
            max_attempts: default_max_attempts(),
            call_timeout_secs: default_call_timeout_secs(),
            output_dir: None,
        }
    }

    /// A fully offline config for dry runs and tests.
    pub fn mock(num_players: usize) -> Self {
        Self::uniform(MOCK_MODEL, num_players)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of seats in the game.
    pub fn num_players(&self) -> usize {
        self.models.len()
    }

    /// Check the config against the supported rule tables.
    pub fn validate(&self) -> Result<(), GameError> {
        roles::role_table(self.num_players())?;
        for (seat, model) in self.models.iter().enumerate() {
            if model.trim().is_empty() {
                return Err(GameError::MissingSeatModel { seat });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_config_validates_for_supported_counts() {
        for n in 5..=10 {
            assert!(GameConfig::mock(n).validate().is_ok(), "{n} players");
        }
        assert!(matches!(
            GameConfig::mock(4).validate(),
            Err(GameError::NoRoleTable { num_players: 4 })
        ));
        assert!(GameConfig::mock(11).validate().is_err());
    }

    #[test]
    fn blank_model_is_rejected() {
        let mut config = GameConfig::mock(5);
        config.models[2] = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(GameError::MissingSeatModel { seat: 2 })
        ));
    }

    #[test]
    fn yaml_round_trip_applies_defaults() {
        let yaml = "models: [mock, mock, mock, mock, mock]\nseed: 42\n";
        let config: GameConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_players(), 5);
        assert_eq!(config.seed, Some(42));
        assert!(config.leader_votes);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.call_timeout_secs, 300);
        assert!(config.output_dir.is_none());
    }
}
