//! Append-only game history: the single source of truth for what happened.
//!
//! Every phase reads a rendered segment of this log to build prompts and
//! writes its outcome back before the game advances. Rendering is a pure
//! function of the event list, so identical inputs always produce identical
//! prompt text. The JSON export is the sole contract with downstream
//! narration and media tooling; its `event_type` vocabulary is stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Outcome of a single quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestOutcome {
    Success,
    Fail,
}

/// Which step of team building a proposal came from: the leader's opening
/// pick, or the revision after the discussion. Both share the same attempt
/// number, so downstream consumers tell them apart by this marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStage {
    Initial,
    Final,
}

/// A typed game event. Serialized variants carry the stable wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    GameStart {
        game_id: String,
        num_players: usize,
    },
    TeamProposal {
        leader: usize,
        team: Vec<usize>,
        reasoning: String,
        attempt: u32,
        stage: ProposalStage,
    },
    PlayerSpeech {
        seat: usize,
        statement: String,
    },
    VoteResult {
        team: Vec<usize>,
        approve_count: usize,
        reject_count: usize,
        approved: bool,
        auto_approved: bool,
    },
    QuestResult {
        quest: usize,
        team: Vec<usize>,
        fail_count: usize,
        fails_required: usize,
        outcome: QuestOutcome,
    },
    AssassinationProposal {
        assassin: usize,
        target: usize,
        reasoning: String,
    },
    AssassinationDiscussion {
        seat: usize,
        statement: String,
    },
    AssassinationResult {
        assassin: usize,
        target: usize,
        merlin: usize,
        success: bool,
    },
    MvpResult {
        mvp: usize,
        votes: usize,
    },
}

impl EventKind {
    /// The seat this event is attributed to, if any.
    pub fn seat_id(&self) -> Option<usize> {
        match self {
            Self::GameStart { .. } | Self::VoteResult { .. } | Self::QuestResult { .. } => None,
            Self::TeamProposal { leader, .. } => Some(*leader),
            Self::PlayerSpeech { seat, .. } | Self::AssassinationDiscussion { seat, .. } => {
                Some(*seat)
            }
            Self::AssassinationProposal { assassin, .. }
            | Self::AssassinationResult { assassin, .. } => Some(*assassin),
            Self::MvpResult { mvp, .. } => Some(*mvp),
        }
    }

    /// One-line narrative rendering, as shown to the seats themselves.
    fn narrate(&self) -> String {
        match self {
            Self::GameStart { num_players, .. } => {
                format!("The game has begun with {num_players} players.")
            }
            Self::TeamProposal {
                leader,
                team,
                reasoning,
                attempt,
                stage,
            } => {
                let verb = match stage {
                    ProposalStage::Initial => "proposed the team",
                    ProposalStage::Final => "revised the team to",
                };
                format!(
                    "Player {leader} (leader, proposal #{attempt}) {verb} {team:?}. \
                     Reasoning: {reasoning}"
                )
            }
            Self::PlayerSpeech { seat, statement } => {
                format!("Player {seat} said: {statement}")
            }
            Self::VoteResult {
                team,
                approve_count,
                reject_count,
                approved,
                auto_approved,
            } => {
                if *auto_approved {
                    format!(
                        "After five consecutive rejections, the team {team:?} was \
                         automatically approved without a vote."
                    )
                } else {
                    let verdict = if *approved { "APPROVED" } else { "REJECTED" };
                    format!(
                        "The team {team:?} was {verdict} \
                         ({approve_count} approve, {reject_count} reject)."
                    )
                }
            }
            Self::QuestResult {
                quest,
                team,
                fail_count,
                fails_required,
                outcome,
            } => {
                let verdict = match outcome {
                    QuestOutcome::Success => "SUCCEEDED",
                    QuestOutcome::Fail => "FAILED",
                };
                format!(
                    "Quest {quest} with team {team:?} {verdict} \
                     ({fail_count} fail cards played, {fails_required} required to fail)."
                )
            }
            Self::AssassinationProposal {
                assassin,
                target,
                reasoning,
            } => format!(
                "The assassin (Player {assassin}) proposes to assassinate Player {target}. \
                 Reasoning: {reasoning}"
            ),
            Self::AssassinationDiscussion { seat, statement } => {
                format!("Player {seat} counseled: {statement}")
            }
            Self::AssassinationResult {
                target,
                merlin,
                success,
                ..
            } => {
                if *success {
                    format!("Player {target} was Merlin. The assassination succeeds: Evil wins!")
                } else {
                    format!(
                        "Player {target} was not Merlin (Merlin was Player {merlin}). \
                         The assassination fails: Good wins!"
                    )
                }
            }
            Self::MvpResult { mvp, votes } => {
                format!("Player {mvp} was elected MVP of the game with {votes} votes.")
            }
        }
    }
}

/// An immutable record in the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Position in the log; assigned at append time, monotonically increasing.
    pub index: usize,
    /// Wall-clock time of the append.
    pub timestamp: DateTime<Utc>,
    /// The typed event.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Append-only, totally ordered sequence of game events.
#[derive(Debug, Default)]
pub struct HistoryLog {
    events: Vec<HistoryEvent>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its index.
    pub fn append(&mut self, kind: EventKind) -> usize {
        let index = self.events.len();
        tracing::debug!(index, event = ?kind, "history append");
        self.events.push(HistoryEvent {
            index,
            timestamp: Utc::now(),
            kind,
        });
        index
    }

    /// Number of events appended so far.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in append order.
    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// Render every event from `index` onward into seat-consumable narrative
    /// text, one line per event. Pure and idempotent: identical inputs yield
    /// identical text.
    pub fn segment_since(&self, index: usize) -> String {
        self.events
            .iter()
            .skip(index)
            .map(|e| e.kind.narrate())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The downstream export: an ordered JSON list of
    /// `{event_type, seat_id, payload, index, timestamp}` objects.
    ///
    /// `event_type` names are stable; script and video tooling parse them.
    pub fn export_json(&self) -> serde_json::Value {
        let events: Vec<serde_json::Value> = self
            .events
            .iter()
            .map(|e| {
                let mut payload = serde_json::to_value(&e.kind)
                    .expect("event serialization is infallible");
                let event_type = payload
                    .as_object_mut()
                    .and_then(|o| o.remove("event_type"))
                    .expect("tagged enum always carries event_type");
                json!({
                    "index": e.index,
                    "timestamp": e.timestamp,
                    "event_type": event_type,
                    "seat_id": e.kind.seat_id(),
                    "payload": payload,
                })
            })
            .collect();
        serde_json::Value::Array(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> HistoryLog {
        let mut log = HistoryLog::new();
        log.append(EventKind::GameStart {
            game_id: "g".into(),
            num_players: 5,
        });
        log.append(EventKind::TeamProposal {
            leader: 0,
            team: vec![0, 1],
            reasoning: "trust".into(),
            attempt: 1,
            stage: ProposalStage::Initial,
        });
        log.append(EventKind::PlayerSpeech {
            seat: 2,
            statement: "I approve of this team.".into(),
        });
        log.append(EventKind::VoteResult {
            team: vec![0, 1],
            approve_count: 4,
            reject_count: 1,
            approved: true,
            auto_approved: false,
        });
        log.append(EventKind::QuestResult {
            quest: 1,
            team: vec![0, 1],
            fail_count: 0,
            fails_required: 1,
            outcome: QuestOutcome::Success,
        });
        log
    }

    #[test]
    fn append_assigns_monotonic_indices() {
        let log = sample_log();
        for (i, e) in log.events().iter().enumerate() {
            assert_eq!(e.index, i);
        }
    }

    #[test]
    fn segment_since_is_idempotent() {
        let log = sample_log();
        assert_eq!(log.segment_since(0), log.segment_since(0));
        assert_eq!(log.segment_since(3), log.segment_since(3));
        assert_eq!(log.segment_since(log.len()), "");
    }

    #[test]
    fn segment_rendering_aggregates_votes_and_speeches() {
        let log = sample_log();
        let text = log.segment_since(0);
        assert!(text.contains("Player 2 said: I approve of this team."));
        assert!(text.contains("APPROVED (4 approve, 1 reject)"));
        assert!(text.contains("Quest 1 with team [0, 1] SUCCEEDED"));
        // Suffix view only sees later events.
        let tail = log.segment_since(4);
        assert!(!tail.contains("said"));
        assert!(tail.contains("SUCCEEDED"));
    }

    #[test]
    fn export_uses_stable_event_type_vocabulary() {
        let mut log = sample_log();
        log.append(EventKind::AssassinationProposal {
            assassin: 3,
            target: 0,
            reasoning: "hunch".into(),
        });
        log.append(EventKind::AssassinationDiscussion {
            seat: 4,
            statement: "agreed".into(),
        });
        log.append(EventKind::AssassinationResult {
            assassin: 3,
            target: 0,
            merlin: 0,
            success: true,
        });
        log.append(EventKind::MvpResult { mvp: 3, votes: 3 });

        let exported = log.export_json();
        let types: Vec<&str> = exported
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event_type"].as_str().unwrap())
            .collect();
        assert_eq!(
            types,
            vec![
                "GAME_START",
                "TEAM_PROPOSAL",
                "PLAYER_SPEECH",
                "VOTE_RESULT",
                "QUEST_RESULT",
                "ASSASSINATION_PROPOSAL",
                "ASSASSINATION_DISCUSSION",
                "ASSASSINATION_RESULT",
                "MVP_RESULT",
            ]
        );
        // Seat attribution survives the export.
        assert_eq!(exported[2]["seat_id"], json!(2));
        assert_eq!(exported[0]["seat_id"], json!(null));
        // Payload no longer duplicates the tag.
        assert!(exported[1]["payload"].get("event_type").is_none());
        assert_eq!(exported[1]["payload"]["team"], json!([0, 1]));
        assert_eq!(exported[1]["payload"]["stage"], json!("initial"));
    }

    #[test]
    fn proposal_stages_render_distinctly() {
        let mut log = HistoryLog::new();
        log.append(EventKind::TeamProposal {
            leader: 2,
            team: vec![2, 4],
            reasoning: "opening pick".into(),
            attempt: 3,
            stage: ProposalStage::Initial,
        });
        log.append(EventKind::TeamProposal {
            leader: 2,
            team: vec![2, 3],
            reasoning: "the discussion changed my mind".into(),
            attempt: 3,
            stage: ProposalStage::Final,
        });
        let text = log.segment_since(0);
        assert!(text.contains("proposal #3) proposed the team [2, 4]"));
        assert!(text.contains("proposal #3) revised the team to [2, 3]"));
    }

    #[test]
    fn auto_approved_vote_renders_distinctly() {
        let mut log = HistoryLog::new();
        log.append(EventKind::VoteResult {
            team: vec![1, 2],
            approve_count: 0,
            reject_count: 0,
            approved: true,
            auto_approved: true,
        });
        assert!(log
            .segment_since(0)
            .contains("automatically approved without a vote"));
    }
}
