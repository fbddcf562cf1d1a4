//! Assassination: Evil's last word after Good's third quest success.
//!
//! The designated assassin proposes a target, the non-hidden evil teammates
//! counsel independently (all see the proposal, none see each other's
//! simultaneous counsel), and the assassin decides. Hitting Merlin flips the
//! game to Evil; this is the sole win-flip mechanism after three Good
//! successes.

use crate::error::GameError;
use crate::history::EventKind;
use crate::parser;
use crate::prompts;

use super::{fan_out, PhaseContext};

/// The `Propose -> Discuss -> FinalDecision` sub-state-machine.
pub struct AssassinationPhase;

impl AssassinationPhase {
    /// Run the phase. Returns true when Evil wins (Merlin was hit).
    pub async fn run(ctx: &mut PhaseContext<'_>) -> Result<bool, GameError> {
        let assassin = ctx.roles.assassin_seat()?;
        let merlin = ctx.roles.merlin_seat()?;
        let targets: Vec<usize> = (0..ctx.num_players()).filter(|s| *s != assassin).collect();

        tracing::info!(assassin, "assassination phase begins");

        // Step 1: proposal. An unreadable proposal falls back to the first
        // eligible target; the miss is on the assassin's model, not the game.
        let delta = ctx.history_for(assassin);
        let prompt = prompts::assassinate_proposal(assassin, &targets, &delta);
        let (proposal_target, proposal_reasoning) = match ctx.seats[assassin].generate(&prompt).await
        {
            Ok(text) => match parser::parse_target(&text, ctx.num_players()) {
                Ok((target, reasoning)) if target != assassin => (target, reasoning),
                Ok((_, _)) | Err(_) => {
                    tracing::warn!(assassin, "unusable assassination proposal, defaulting");
                    (targets[0], String::new())
                }
            },
            Err(err) => {
                tracing::warn!(assassin, error = %err, "proposal call failed, defaulting");
                (targets[0], String::new())
            }
        };

        ctx.log.append(EventKind::AssassinationProposal {
            assassin,
            target: proposal_target,
            reasoning: proposal_reasoning.clone(),
        });

        // Step 2: counsel from the evil seats that know each other (Oberon
        // stays silent). All counselors see the proposal; none sees another's
        // counsel until every response has resolved.
        let counselors: Vec<usize> = ctx
            .roles
            .seats_where(|r| r.known_to_evil())
            .into_iter()
            .filter(|s| *s != assassin)
            .collect();

        let mut prompts_batch = Vec::with_capacity(counselors.len());
        for &seat in &counselors {
            let delta = ctx.history_for(seat);
            prompts_batch.push((
                seat,
                prompts::assassinate_counsel(seat, proposal_target, &proposal_reasoning, &delta),
            ));
        }
        for (seat, result) in fan_out(ctx.seats, prompts_batch).await {
            let statement = match result {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(seat, error = %err, "counsel call failed, seat stays silent");
                    format!("(Player {seat} offers no counsel.)")
                }
            };
            ctx.log
                .append(EventKind::AssassinationDiscussion { seat, statement });
        }

        // Step 3: final decision, seeing all counsel. An unreadable decision
        // falls back to the proposed target.
        let delta = ctx.history_for(assassin);
        let prompt = prompts::assassinate_decision(assassin, &targets, &delta);
        let final_target = match ctx.seats[assassin].generate(&prompt).await {
            Ok(text) => match parser::parse_target(&text, ctx.num_players()) {
                Ok((target, _)) if target != assassin => target,
                Ok((_, _)) | Err(_) => {
                    tracing::warn!(assassin, "unusable final decision, keeping proposed target");
                    proposal_target
                }
            },
            Err(err) => {
                tracing::warn!(assassin, error = %err, "decision call failed, keeping proposed target");
                proposal_target
            }
        };

        let success = final_target == merlin;
        ctx.log.append(EventKind::AssassinationResult {
            assassin,
            target: final_target,
            merlin,
            success,
        });
        tracing::info!(assassin, final_target, merlin, success, "assassination resolved");

        Ok(success)
    }
}
