//! Phase controllers: sub-state-machines that consume agent responses and
//! the history log, and append their outcomes before the game advances.

pub mod assassination;
pub mod mvp;
pub mod quest;
pub mod team_building;
pub mod voting;

pub use assassination::AssassinationPhase;
pub use mvp::{MvpPhase, MvpSelection};
pub use quest::{run_quest, QuestExecution};
pub use team_building::{ApprovedTeam, TeamBuildingPhase};
pub use voting::{majority_approves, run_vote, VoteTally};

use futures::future::join_all;

use crate::agent::SeatAgent;
use crate::error::AgentError;
use crate::history::HistoryLog;
use crate::roles::RoleAssignment;

/// Everything a phase needs: the seats, the role map, the log and the
/// per-seat read cursors. Cursors live here (owned by the orchestrator), not
/// in the log itself.
pub struct PhaseContext<'a> {
    pub seats: &'a [SeatAgent],
    pub roles: &'a RoleAssignment,
    pub log: &'a mut HistoryLog,
    pub cursors: &'a mut [usize],
    /// Whether the leader casts a normal vote on their own proposal.
    pub leader_votes: bool,
}

impl PhaseContext<'_> {
    /// Number of seats in the game.
    pub fn num_players(&self) -> usize {
        self.seats.len()
    }

    /// Render the events this seat has not yet been shown and advance its
    /// cursor to the current end of the log. Cursors only move forward.
    pub fn history_for(&mut self, seat: usize) -> String {
        let delta = self.log.segment_since(self.cursors[seat]);
        self.cursors[seat] = self.log.len();
        delta
    }

    /// Seats in speaking order: the leader first, then clockwise.
    pub fn rotation_from(&self, leader: usize) -> Vec<usize> {
        let n = self.num_players();
        (0..n).map(|i| (leader + i) % n).collect()
    }
}

/// Issue one call per (seat, prompt) pair concurrently and await them all.
///
/// All-settled semantics: one seat's failure never cancels the rest; each
/// entry resolves to that seat's own result. Results come back in the input
/// order, which callers keep as seat order so that log appends stay
/// deterministic for a given set of responses.
pub(crate) async fn fan_out(
    seats: &[SeatAgent],
    prompts: Vec<(usize, String)>,
) -> Vec<(usize, Result<String, AgentError>)> {
    let futures = prompts.into_iter().map(|(seat, prompt)| {
        let agent = &seats[seat];
        async move { (seat, agent.generate(&prompt).await) }
    });
    join_all(futures).await
}
