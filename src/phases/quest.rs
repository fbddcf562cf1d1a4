//! Quest execution: good seats auto-succeed, evil seats choose concurrently,
//! cards are shuffled before counting so nobody can be de-anonymized by
//! order.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::GameError;
use crate::history::{EventKind, QuestOutcome};
use crate::parser::{self, QuestCard};
use crate::prompts;

use super::{fan_out, PhaseContext};

/// The sealed result of one quest.
#[derive(Debug, Clone, Copy)]
pub struct QuestExecution {
    pub outcome: QuestOutcome,
    pub fail_count: usize,
}

/// Count fail cards. Shuffle-invariant by construction.
fn count_fails(cards: &[QuestCard]) -> usize {
    cards.iter().filter(|c| **c == QuestCard::Fail).count()
}

/// Run one quest for the approved `team`.
///
/// Good seats contribute success without an LLM call: that is a rule of the
/// game, not a request. Evil seats are queried concurrently; each prompt
/// carries the evil roster on this team and `fails_required` so the model
/// can apply the fail-priority protocol. An unparseable or failed evil
/// response defaults to success, favoring non-escalation over ambiguous
/// sabotage.
pub async fn run_quest(
    ctx: &mut PhaseContext<'_>,
    quest_number: usize,
    team: &[usize],
    fails_required: usize,
    rng: &mut ChaCha8Rng,
) -> Result<QuestExecution, GameError> {
    let evil_on_team: Vec<usize> = team
        .iter()
        .copied()
        .filter(|seat| ctx.roles.role(*seat).is_evil())
        .collect();
    let good_count = team.len() - evil_on_team.len();

    let mut prompts = Vec::with_capacity(evil_on_team.len());
    for &seat in &evil_on_team {
        let delta = ctx.history_for(seat);
        let role = ctx.roles.role(seat);
        let mut prompt = prompts::quest_evil(seat, role, team, &evil_on_team, fails_required);
        if !delta.trim().is_empty() {
            prompt.push_str("\n\nEvents since you last acted:\n");
            prompt.push_str(&delta);
        }
        prompts.push((seat, prompt));
    }

    let mut cards: Vec<QuestCard> = vec![QuestCard::Success; good_count];
    for (seat, result) in fan_out(ctx.seats, prompts).await {
        let card = match result {
            Ok(text) => match parser::parse_quest_card(&text) {
                Ok((card, _)) => card,
                Err(anomaly) => {
                    tracing::warn!(seat, %anomaly, "unparseable quest card, defaulting to success");
                    QuestCard::Success
                }
            },
            Err(err) => {
                tracing::warn!(seat, error = %err, "quest call failed, defaulting to success");
                QuestCard::Success
            }
        };
        cards.push(card);
    }

    // Anonymize: the narrated result must not encode who played what.
    cards.shuffle(rng);

    let fail_count = count_fails(&cards);
    let outcome = if fail_count >= fails_required {
        QuestOutcome::Fail
    } else {
        QuestOutcome::Success
    };

    ctx.log.append(EventKind::QuestResult {
        quest: quest_number,
        team: team.to_vec(),
        fail_count,
        fails_required,
        outcome,
    });
    tracing::info!(quest = quest_number, ?team, fail_count, fails_required, ?outcome, "quest resolved");

    Ok(QuestExecution {
        outcome,
        fail_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn counting_is_shuffle_invariant() {
        let mut cards = vec![
            QuestCard::Success,
            QuestCard::Fail,
            QuestCard::Success,
            QuestCard::Fail,
        ];
        let before = count_fails(&cards);
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            cards.shuffle(&mut rng);
            assert_eq!(count_fails(&cards), before);
        }
    }
}
