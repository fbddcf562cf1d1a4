//! Team building: propose, discuss, confirm, vote — repeated until a team is
//! approved or the five-rejection rule forces one through.

use crate::error::GameError;
use crate::history::{EventKind, ProposalStage};
use crate::parser;
use crate::prompts;

use super::{run_vote, PhaseContext};

/// How many consecutive rejections force the next proposal through unvoted.
const AUTO_APPROVE_AFTER_REJECTIONS: u32 = 5;

/// A team that made it through the vote (or past it).
#[derive(Debug, Clone)]
pub struct ApprovedTeam {
    pub team: Vec<usize>,
    /// The leader whose proposal was approved.
    pub leader: usize,
    pub reasoning: String,
    /// True when the five-rejection rule approved it without a vote.
    pub auto_approved: bool,
}

/// One quest's team-building loop:
/// `ProposeInitial -> Discussion -> ProposeFinal -> Voting`, cycling on
/// rejection with leadership rotating each time.
pub struct TeamBuildingPhase {
    pub quest: usize,
    pub team_size: usize,
}

impl TeamBuildingPhase {
    /// Drive the loop to an approved team.
    ///
    /// `leader` is the orchestrator's rotating leader seat; it is advanced in
    /// place on every rejection. On the attempt after the fifth consecutive
    /// rejection the proposal is approved with no vote at all.
    pub async fn run(
        &self,
        ctx: &mut PhaseContext<'_>,
        leader: &mut usize,
    ) -> Result<ApprovedTeam, GameError> {
        let n = ctx.num_players();
        let mut consecutive_rejections: u32 = 0;

        loop {
            let current_leader = *leader;
            let attempt = consecutive_rejections + 1;
            tracing::info!(
                quest = self.quest,
                leader = current_leader,
                attempt,
                "team building attempt"
            );

            let (mut team, mut reasoning) = self.propose_initial(ctx, current_leader).await;
            ctx.log.append(EventKind::TeamProposal {
                leader: current_leader,
                team: team.clone(),
                reasoning: reasoning.clone(),
                attempt,
                stage: ProposalStage::Initial,
            });

            self.discussion(ctx, current_leader).await;

            if let Some((final_team, final_reasoning)) =
                self.propose_final(ctx, current_leader, &team).await
            {
                if final_team != team {
                    ctx.log.append(EventKind::TeamProposal {
                        leader: current_leader,
                        team: final_team.clone(),
                        reasoning: final_reasoning.clone(),
                        attempt,
                        stage: ProposalStage::Final,
                    });
                }
                team = final_team;
                reasoning = final_reasoning;
            }

            if consecutive_rejections >= AUTO_APPROVE_AFTER_REJECTIONS {
                tracing::info!(
                    quest = self.quest,
                    ?team,
                    "five consecutive rejections: team auto-approved without a vote"
                );
                ctx.log.append(EventKind::VoteResult {
                    team: team.clone(),
                    approve_count: 0,
                    reject_count: 0,
                    approved: true,
                    auto_approved: true,
                });
                return Ok(ApprovedTeam {
                    team,
                    leader: current_leader,
                    reasoning,
                    auto_approved: true,
                });
            }

            let tally = run_vote(ctx, &team, &reasoning, current_leader).await?;
            if tally.approved {
                return Ok(ApprovedTeam {
                    team,
                    leader: current_leader,
                    reasoning,
                    auto_approved: false,
                });
            }

            consecutive_rejections += 1;
            *leader = (current_leader + 1) % n;
            tracing::info!(
                quest = self.quest,
                consecutive_rejections,
                next_leader = *leader,
                "team rejected, leadership passes"
            );
        }
    }

    /// Ask the leader for an initial team. A malformed or failed response
    /// yields an empty team: an automatic-reject-worthy proposal, not an
    /// error.
    async fn propose_initial(
        &self,
        ctx: &mut PhaseContext<'_>,
        leader: usize,
    ) -> (Vec<usize>, String) {
        let n = ctx.num_players();
        let delta = ctx.history_for(leader);
        let prompt = prompts::propose_team(leader, self.team_size, &delta);
        match ctx.seats[leader].generate(&prompt).await {
            Ok(text) => match parser::parse_team_proposal(&text, n) {
                Ok(proposal) => (proposal.team, proposal.reasoning),
                Err(anomaly) => {
                    tracing::warn!(leader, %anomaly, "malformed proposal, defaulting to empty team");
                    (Vec::new(), String::new())
                }
            },
            Err(err) => {
                tracing::warn!(leader, error = %err, "proposal call failed, defaulting to empty team");
                (Vec::new(), String::new())
            }
        }
    }

    /// Every seat speaks once, leader first, strictly sequentially: each
    /// speech is appended before the next speaker's prompt is built, so later
    /// speakers see earlier speeches.
    async fn discussion(&self, ctx: &mut PhaseContext<'_>, leader: usize) {
        for seat in ctx.rotation_from(leader) {
            let delta = ctx.history_for(seat);
            let prompt = prompts::discussion(seat, &delta);
            let statement = match ctx.seats[seat].generate(&prompt).await {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(seat, error = %err, "discussion call failed, seat stays silent");
                    format!("(Player {seat} has nothing to say.)")
                }
            };
            ctx.log.append(EventKind::PlayerSpeech { seat, statement });
        }
    }

    /// Ask the leader to confirm or revise after the discussion. A missing
    /// or malformed team keeps the prior proposal unchanged (fallback, not a
    /// failure).
    async fn propose_final(
        &self,
        ctx: &mut PhaseContext<'_>,
        leader: usize,
        current_team: &[usize],
    ) -> Option<(Vec<usize>, String)> {
        let n = ctx.num_players();
        let delta = ctx.history_for(leader);
        let prompt = prompts::confirm_team(leader, self.team_size, current_team, &delta);
        match ctx.seats[leader].generate(&prompt).await {
            Ok(text) => match parser::parse_team_proposal(&text, n) {
                Ok(proposal) if !proposal.team.is_empty() => {
                    Some((proposal.team, proposal.reasoning))
                }
                Ok(_) | Err(_) => {
                    tracing::debug!(leader, "confirmation kept the prior team");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(leader, error = %err, "confirmation call failed, keeping prior team");
                None
            }
        }
    }
}
