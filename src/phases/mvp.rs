//! Post-game MVP selection: a popularity vote with no bearing on the result.
//!
//! Strictly best-effort. Any failure here is logged and dropped; the
//! already-determined game outcome is never masked or overwritten.

use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

use crate::history::EventKind;
use crate::parser;
use crate::prompts;

use super::{fan_out, PhaseContext};

/// The elected MVP and their vote count.
#[derive(Debug, Clone, Copy)]
pub struct MvpSelection {
    pub mvp: usize,
    pub votes: usize,
}

/// Nominate, tally, announce, and let the MVP give a closing speech.
pub struct MvpPhase;

impl MvpPhase {
    /// Run the phase. Returns `None` when no valid nomination was cast.
    pub async fn run(
        ctx: &mut PhaseContext<'_>,
        rng: &mut ChaCha8Rng,
        result_summary: &str,
    ) -> Option<MvpSelection> {
        let n = ctx.num_players();

        // Nominations are independent: fan out, reveal together.
        let mut prompts_batch = Vec::with_capacity(n);
        for seat in 0..n {
            let delta = ctx.history_for(seat);
            prompts_batch.push((seat, prompts::nominate_mvp(seat, n, &delta)));
        }

        let mut ballots: Vec<usize> = Vec::new();
        for (seat, result) in fan_out(ctx.seats, prompts_batch).await {
            let statement = match result {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(seat, error = %err, "MVP nomination call failed, skipping seat");
                    continue;
                }
            };
            match parser::parse_mvp_nomination(&statement, n) {
                Ok(nominee) => ballots.push(nominee),
                Err(_) => tracing::debug!(seat, "statement carried no valid nomination"),
            }
            ctx.log.append(EventKind::PlayerSpeech { seat, statement });
        }

        if ballots.is_empty() {
            tracing::info!("no valid MVP nominations were cast");
            return None;
        }

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for nominee in ballots {
            *counts.entry(nominee).or_insert(0) += 1;
        }
        let top_votes = *counts.values().max().expect("counts is non-empty");
        let mut top_nominees: Vec<usize> = counts
            .iter()
            .filter(|(_, v)| **v == top_votes)
            .map(|(k, _)| *k)
            .collect();
        top_nominees.sort_unstable();
        let mvp = *top_nominees
            .choose(rng)
            .expect("top_nominees is non-empty");
        if top_nominees.len() > 1 {
            tracing::info!(?top_nominees, mvp, "MVP tie broken at random");
        }

        ctx.log.append(EventKind::MvpResult {
            mvp,
            votes: top_votes,
        });

        // Closing speech, also best-effort.
        let prompt = prompts::mvp_speech(mvp, result_summary);
        match ctx.seats[mvp].generate(&prompt).await {
            Ok(text) => {
                ctx.log.append(EventKind::PlayerSpeech {
                    seat: mvp,
                    statement: text.trim().to_string(),
                });
            }
            Err(err) => tracing::warn!(mvp, error = %err, "MVP speech call failed"),
        }

        Some(MvpSelection {
            mvp,
            votes: top_votes,
        })
    }
}
