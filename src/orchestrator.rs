//! The game orchestrator: sequences phases, tracks global counters and
//! determines the terminal outcome.
//!
//! One [`GameOrchestrator`] owns everything with game lifetime: the seats,
//! the role assignment, the history log, the per-seat read cursors and the
//! rng. Phases borrow these through a [`PhaseContext`] and the orchestrator
//! alone decides when the game advances, so history appends stay serialized
//! even while individual phases fan out concurrent LLM calls.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use uuid::Uuid;

use crate::agent::{AgentConfig, SeatAgent};
use crate::config::{GameConfig, MOCK_MODEL};
use crate::error::GameError;
use crate::history::{EventKind, HistoryLog, QuestOutcome};
use crate::llm::{CostReport, CostTracker, LlmProvider, MockProvider, OpenAiCompatClient};
use crate::phases::{run_quest, AssassinationPhase, MvpPhase, MvpSelection, PhaseContext, TeamBuildingPhase};
use crate::prompts;
use crate::roles::{self, Allegiance, RoleAssignment};

/// The number of quest wins that ends the game for either side.
const QUESTS_TO_WIN: usize = 3;

/// The terminal result of one game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub good_quests_succeeded: usize,
    pub evil_quests_failed: usize,
    /// `None` only while the game is still in progress.
    pub winner: Option<Allegiance>,
    /// Whether the assassin hit Merlin; `None` when the phase never ran.
    pub assassination_success: Option<bool>,
    /// Best-effort post-game MVP; never affects the winner.
    pub mvp: Option<MvpSelection>,
}

impl GameOutcome {
    /// One-line summary used in the MVP prompt and the CLI report.
    pub fn summary(&self) -> String {
        let winner = match self.winner {
            Some(Allegiance::Good) => "Good",
            Some(Allegiance::Evil) => "Evil",
            None => "nobody (in progress)",
        };
        let mut summary = format!(
            "{winner} won, with {} quests succeeded and {} failed.",
            self.good_quests_succeeded, self.evil_quests_failed
        );
        match self.assassination_success {
            Some(true) => summary.push_str(" The assassin found Merlin."),
            Some(false) => summary.push_str(" The assassin missed Merlin."),
            None => {}
        }
        summary
    }
}

/// Root state machine: role assignment, the quest loop, assassination, MVP.
pub struct GameOrchestrator {
    game_id: String,
    config: GameConfig,
    roles: RoleAssignment,
    seats: Vec<SeatAgent>,
    log: HistoryLog,
    cursors: Vec<usize>,
    rng: ChaCha8Rng,
    cost: Arc<CostTracker>,
}

impl GameOrchestrator {
    /// Build an orchestrator from a config, constructing providers from the
    /// model ids: `mock` seats run offline, everything else shares one
    /// OpenAI-compatible client configured from the environment.
    pub fn from_config(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut http: Option<Arc<OpenAiCompatClient>> = None;
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::with_capacity(config.num_players());
        for model in &config.models {
            if model == MOCK_MODEL {
                providers.push(Arc::new(MockProvider::new()));
                continue;
            }
            let client = match &http {
                Some(client) => client.clone(),
                None => {
                    let client = Arc::new(
                        OpenAiCompatClient::from_env(model.clone())
                            .map_err(|e| GameError::Configuration(e.to_string()))?,
                    );
                    http = Some(client.clone());
                    client
                }
            };
            providers.push(client);
        }
        Self::with_providers(config, providers)
    }

    /// Build an orchestrator with explicit seat-ordered providers.
    ///
    /// Roles are assigned here, exactly once: the rng is seeded from the
    /// config (or freshly drawn and logged), the role table for the player
    /// count is shuffled, and each seat's system instruction is built from
    /// its role and private knowledge.
    pub fn with_providers(
        config: GameConfig,
        providers: Vec<Arc<dyn LlmProvider>>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let n = config.num_players();
        if providers.len() != n {
            return Err(GameError::Configuration(format!(
                "{} providers supplied for {n} seats",
                providers.len()
            )));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let game_id = Uuid::new_v4().to_string();
        tracing::info!(game_id, num_players = n, seed, "assigning roles");

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let roles = RoleAssignment::assign(n, &mut rng)?;

        let cost = Arc::new(CostTracker::new());
        let agent_config = AgentConfig {
            max_attempts: config.max_attempts,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            ..AgentConfig::default()
        };
        let seats = providers
            .into_iter()
            .enumerate()
            .map(|(seat, provider)| {
                SeatAgent::new(
                    seat,
                    config.models[seat].clone(),
                    provider,
                    prompts::system_instruction(seat, roles.role(seat), roles.known_info(seat)),
                    agent_config.clone(),
                    cost.clone(),
                )
            })
            .collect();

        Ok(Self {
            game_id,
            config,
            roles,
            seats,
            log: HistoryLog::new(),
            cursors: vec![0; n],
            rng,
            cost,
        })
    }

    /// Unique id of this game, used in the artifacts.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// The role assignment for this game.
    pub fn roles(&self) -> &RoleAssignment {
        &self.roles
    }

    /// The history log accumulated so far.
    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    /// Spend accumulated across all seats so far.
    pub fn cost_report(&self) -> CostReport {
        self.cost.report()
    }

    fn context(&mut self) -> PhaseContext<'_> {
        PhaseContext {
            seats: &self.seats,
            roles: &self.roles,
            log: &mut self.log,
            cursors: &mut self.cursors,
            leader_votes: self.config.leader_votes,
        }
    }

    /// Drive one full game to its terminal outcome.
    ///
    /// Quests run until either side reaches three; a third Good success
    /// hands Evil the assassination attempt, the sole win-flip mechanism.
    /// The MVP vote runs after the winner is already decided and can never
    /// change it.
    pub async fn run(&mut self) -> Result<GameOutcome, GameError> {
        let n = self.seats.len();
        let quest_sizes = roles::quest_sizes(n)?;

        self.log.append(EventKind::GameStart {
            game_id: self.game_id.clone(),
            num_players: n,
        });

        let mut leader = self.rng.random_range(0..n);
        let mut good_quests_succeeded = 0;
        let mut evil_quests_failed = 0;

        for quest in 1..=quest_sizes.len() {
            let team_size = quest_sizes[quest - 1];
            let fails_required = roles::fails_required(n, quest);
            tracing::info!(quest, team_size, fails_required, leader, "quest begins");

            let mut ctx = PhaseContext {
                seats: &self.seats,
                roles: &self.roles,
                log: &mut self.log,
                cursors: &mut self.cursors,
                leader_votes: self.config.leader_votes,
            };
            let phase = TeamBuildingPhase { quest, team_size };
            let approved = phase.run(&mut ctx, &mut leader).await?;

            let execution =
                run_quest(&mut ctx, quest, &approved.team, fails_required, &mut self.rng).await?;
            match execution.outcome {
                QuestOutcome::Success => good_quests_succeeded += 1,
                QuestOutcome::Fail => evil_quests_failed += 1,
            }

            // The approving leader led this quest; the next quest starts one
            // seat further around the table.
            leader = (approved.leader + 1) % n;

            if good_quests_succeeded == QUESTS_TO_WIN || evil_quests_failed == QUESTS_TO_WIN {
                break;
            }
        }

        let mut outcome = GameOutcome {
            good_quests_succeeded,
            evil_quests_failed,
            winner: None,
            assassination_success: None,
            mvp: None,
        };

        if good_quests_succeeded == QUESTS_TO_WIN {
            let mut ctx = self.context();
            let hit = AssassinationPhase::run(&mut ctx).await?;
            outcome.assassination_success = Some(hit);
            outcome.winner = Some(if hit { Allegiance::Evil } else { Allegiance::Good });
        } else {
            outcome.winner = Some(Allegiance::Evil);
        }

        tracing::info!(
            winner = ?outcome.winner,
            good_quests_succeeded,
            evil_quests_failed,
            "game decided"
        );

        let summary = outcome.summary();
        let mut ctx = PhaseContext {
            seats: &self.seats,
            roles: &self.roles,
            log: &mut self.log,
            cursors: &mut self.cursors,
            leader_votes: self.config.leader_votes,
        };
        outcome.mvp = MvpPhase::run(&mut ctx, &mut self.rng, &summary).await;

        let report = self.cost.report();
        tracing::info!(total_dollars = report.total, "game complete");

        Ok(outcome)
    }

    /// Write the game artifacts: the event log consumed by downstream
    /// narration tooling, and every seat's full conversation transcript.
    pub async fn write_artifacts(&self, dir: &Path) -> Result<(), GameError> {
        std::fs::create_dir_all(dir)?;

        let log_path = dir.join(format!("game_{}.json", self.game_id));
        std::fs::write(&log_path, serde_json::to_string_pretty(&self.log.export_json())?)?;
        tracing::info!(path = %log_path.display(), events = self.log.len(), "event log written");

        let mut transcripts = Vec::with_capacity(self.seats.len());
        for seat_agent in &self.seats {
            let seat = seat_agent.seat();
            transcripts.push(json!({
                "seat": seat,
                "model": seat_agent.model(),
                "role": self.roles.role(seat).display_name(),
                "messages": seat_agent.transcript().await,
            }));
        }
        let transcripts_path = dir.join(format!("transcripts_{}.json", self.game_id));
        std::fs::write(
            &transcripts_path,
            serde_json::to_string_pretty(&serde_json::Value::Array(transcripts))?,
        )?;
        tracing::info!(path = %transcripts_path.display(), "transcripts written");

        Ok(())
    }
}
