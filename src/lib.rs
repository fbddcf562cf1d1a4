//! avalon-arena: LLM-vs-LLM games of The Resistance: Avalon.
//!
//! Every seat at the table is played by a language model. The orchestrator
//! assigns hidden roles, drives the team-building / voting / quest /
//! assassination protocol to a terminal outcome under partial information,
//! and emits an append-only event log that downstream script and video
//! tooling replays.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod parser;
pub mod phases;
pub mod prompts;
pub mod roles;

pub use config::GameConfig;
pub use error::{AgentError, GameError, LlmError, ParseAnomaly};
pub use orchestrator::{GameOrchestrator, GameOutcome};
