//! Team vote: every seat decides concurrently, simple majority approves.

use crate::error::GameError;
use crate::history::EventKind;
use crate::parser::{self, Vote};
use crate::prompts;

use super::{fan_out, PhaseContext};

/// The aggregated outcome of one team vote.
#[derive(Debug, Clone)]
pub struct VoteTally {
    pub approve_count: usize,
    pub reject_count: usize,
    pub approved: bool,
    /// Final per-seat votes after safe defaults, in seat order.
    pub per_seat: Vec<Vote>,
}

/// Strictly-more-than-half approval. An exact tie rejects.
pub fn majority_approves(approve_count: usize, num_players: usize) -> bool {
    approve_count > num_players / 2
}

/// Query all seats concurrently for a vote on `team` and append one
/// aggregated `VOTE_RESULT` event.
///
/// No seat sees another seat's same-round vote before submitting its own.
/// An unparseable or terminally failed vote defaults to reject: an ambiguous
/// vote must never pass a team. When the leader-votes policy is off, the
/// leader's vote is recorded as approve without a call.
pub async fn run_vote(
    ctx: &mut PhaseContext<'_>,
    team: &[usize],
    proposal_reasoning: &str,
    leader: usize,
) -> Result<VoteTally, GameError> {
    let n = ctx.num_players();

    let mut votes: Vec<Vote> = vec![Vote::Reject; n];
    let mut prompts = Vec::with_capacity(n);
    for seat in 0..n {
        if !ctx.leader_votes && seat == leader {
            votes[seat] = Vote::Approve;
            continue;
        }
        let delta = ctx.history_for(seat);
        prompts.push((seat, prompts::vote(seat, team, proposal_reasoning, &delta)));
    }

    for (seat, result) in fan_out(ctx.seats, prompts).await {
        votes[seat] = match result {
            Ok(text) => match parser::parse_vote(&text) {
                Ok((vote, _)) => vote,
                Err(anomaly) => {
                    tracing::warn!(seat, %anomaly, "unparseable vote, defaulting to reject");
                    Vote::Reject
                }
            },
            Err(err) => {
                tracing::warn!(seat, error = %err, "vote call failed, defaulting to reject");
                Vote::Reject
            }
        };
    }

    let approve_count = votes.iter().filter(|v| **v == Vote::Approve).count();
    let reject_count = n - approve_count;
    let approved = majority_approves(approve_count, n);

    ctx.log.append(EventKind::VoteResult {
        team: team.to_vec(),
        approve_count,
        reject_count,
        approved,
        auto_approved: false,
    });
    tracing::info!(?team, approve_count, reject_count, approved, "vote resolved");

    Ok(VoteTally {
        approve_count,
        reject_count,
        approved,
        per_seat: votes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_requires_strictly_more_than_half() {
        // 3-3 with 6 voters is a rejection.
        assert!(!majority_approves(3, 6));
        assert!(majority_approves(4, 6));
        // Odd counts.
        assert!(majority_approves(3, 5));
        assert!(!majority_approves(2, 5));
        assert!(!majority_approves(0, 5));
        assert!(majority_approves(5, 5));
    }
}
