//! Structured parsers for LLM responses.
//!
//! Models answer in a constrained label format (`Team: [...]`, `Vote: ...`).
//! Each parser validates one action type and returns either a value or a
//! [`ParseAnomaly`]; the safe default for an anomaly is chosen by the phase,
//! not here.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ParseAnomaly;

/// A vote on a proposed team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Approve,
    Reject,
}

/// A card played on a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestCard {
    Success,
    Fail,
}

/// A parsed team proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamProposal {
    pub team: Vec<usize>,
    pub reasoning: String,
}

/// Find the first line starting with `label` and return the rest of it.
fn labeled_line<'a>(text: &'a str, label: &'static str) -> Result<&'a str, ParseAnomaly> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .ok_or(ParseAnomaly::MissingLabel { label })
}

/// The `Reasoning:` line, or empty if the model skipped it. Reasoning is
/// narrative color, never load-bearing, so its absence is not an anomaly.
fn reasoning_line(text: &str) -> String {
    labeled_line(text, "Reasoning:").unwrap_or("").to_string()
}

/// Parse a `Team: [a, b, ...]` proposal.
///
/// Out-of-range ids and duplicates are dropped rather than rejected; only a
/// missing or unreadable list is an anomaly.
pub fn parse_team_proposal(
    text: &str,
    num_players: usize,
) -> Result<TeamProposal, ParseAnomaly> {
    let raw = labeled_line(text, "Team:")?;
    static LIST: OnceLock<Regex> = OnceLock::new();
    let list = LIST
        .get_or_init(|| Regex::new(r"\[([^\]]*)\]").expect("static regex"));

    let inner = list
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseAnomaly::MalformedTeamList(raw.to_string()))?
        .as_str();

    let mut team = Vec::new();
    let mut saw_number = false;
    for token in inner.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        // Tolerate "Player 3" style entries; ignore anything non-numeric.
        let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
        if let Ok(seat) = digits.parse::<usize>() {
            saw_number = true;
            if seat < num_players && !team.contains(&seat) {
                team.push(seat);
            }
        }
    }

    if !saw_number && !inner.trim().is_empty() {
        return Err(ParseAnomaly::MalformedTeamList(raw.to_string()));
    }

    Ok(TeamProposal {
        team,
        reasoning: reasoning_line(text),
    })
}

/// Parse a `Vote: approve|reject` response.
pub fn parse_vote(text: &str) -> Result<(Vote, String), ParseAnomaly> {
    let token = labeled_line(text, "Vote:")?;
    let vote = match token.to_ascii_lowercase().as_str() {
        t if t.starts_with("approve") => Vote::Approve,
        t if t.starts_with("reject") => Vote::Reject,
        _ => return Err(ParseAnomaly::UnrecognizedVote(token.to_string())),
    };
    Ok((vote, reasoning_line(text)))
}

/// Parse an `Action: success|fail` quest card.
pub fn parse_quest_card(text: &str) -> Result<(QuestCard, String), ParseAnomaly> {
    let token = labeled_line(text, "Action:")?;
    let card = match token.to_ascii_lowercase().as_str() {
        t if t.starts_with("success") => QuestCard::Success,
        t if t.starts_with("fail") => QuestCard::Fail,
        _ => return Err(ParseAnomaly::UnrecognizedQuestAction(token.to_string())),
    };
    Ok((card, reasoning_line(text)))
}

/// Parse a `Target: <seat>` assassination choice.
pub fn parse_target(text: &str, num_players: usize) -> Result<(usize, String), ParseAnomaly> {
    let raw = labeled_line(text, "Target:")?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let seat = digits
        .parse::<usize>()
        .map_err(|_| ParseAnomaly::MalformedTarget(raw.to_string()))?;
    if seat >= num_players {
        return Err(ParseAnomaly::MalformedTarget(raw.to_string()));
    }
    Ok((seat, reasoning_line(text)))
}

/// Extract an MVP nomination of the form "... Player X ..." from a free-form
/// statement.
pub fn parse_mvp_nomination(text: &str, num_players: usize) -> Result<usize, ParseAnomaly> {
    static NOMINATION: OnceLock<Regex> = OnceLock::new();
    let nomination = NOMINATION
        .get_or_init(|| Regex::new(r"[Pp]layer\s+(\d+)").expect("static regex"));
    nomination
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|seat| *seat < num_players)
        .ok_or(ParseAnomaly::NoNomination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_proposal_happy_path() {
        let parsed = parse_team_proposal(
            "Team: [0, 2, 4]\nReasoning: balance of trust.",
            5,
        )
        .unwrap();
        assert_eq!(parsed.team, vec![0, 2, 4]);
        assert_eq!(parsed.reasoning, "balance of trust.");
    }

    #[test]
    fn team_proposal_drops_out_of_range_and_duplicates() {
        let parsed = parse_team_proposal("Team: [1, 1, 9, 3]", 5).unwrap();
        assert_eq!(parsed.team, vec![1, 3]);
    }

    #[test]
    fn team_proposal_tolerates_player_prefixes() {
        let parsed = parse_team_proposal("Team: [Player 0, Player 2]", 5).unwrap();
        assert_eq!(parsed.team, vec![0, 2]);
    }

    #[test]
    fn team_proposal_anomalies() {
        assert!(matches!(
            parse_team_proposal("I pick everyone!", 5),
            Err(ParseAnomaly::MissingLabel { label: "Team:" })
        ));
        assert!(matches!(
            parse_team_proposal("Team: just my friends", 5),
            Err(ParseAnomaly::MalformedTeamList(_))
        ));
        assert!(matches!(
            parse_team_proposal("Team: [alice, bob]", 5),
            Err(ParseAnomaly::MalformedTeamList(_))
        ));
    }

    #[test]
    fn vote_parsing_accepts_both_tokens_case_insensitively() {
        assert_eq!(parse_vote("Vote: approve").unwrap().0, Vote::Approve);
        assert_eq!(parse_vote("Vote: Rejected").unwrap().0, Vote::Reject);
        assert_eq!(
            parse_vote("Vote: APPROVE\nReasoning: looks fine").unwrap(),
            (Vote::Approve, "looks fine".to_string())
        );
        assert!(matches!(
            parse_vote("Vote: abstain"),
            Err(ParseAnomaly::UnrecognizedVote(_))
        ));
        assert!(parse_vote("no labeled line at all").is_err());
    }

    #[test]
    fn quest_card_parsing() {
        assert_eq!(parse_quest_card("Action: success").unwrap().0, QuestCard::Success);
        assert_eq!(parse_quest_card("Action: FAIL").unwrap().0, QuestCard::Fail);
        assert!(parse_quest_card("Action: sabotage").is_err());
    }

    #[test]
    fn target_parsing_validates_range() {
        assert_eq!(parse_target("Target: 3", 5).unwrap().0, 3);
        assert_eq!(parse_target("Target: Player 2", 5).unwrap().0, 2);
        assert!(parse_target("Target: 7", 5).is_err());
        assert!(parse_target("Target: Merlin", 5).is_err());
    }

    #[test]
    fn mvp_nomination_extraction() {
        assert_eq!(
            parse_mvp_nomination("I nominate Player 4 for their bold bluffs.", 5).unwrap(),
            4
        );
        assert!(parse_mvp_nomination("Everyone played well.", 5).is_err());
        assert!(parse_mvp_nomination("I nominate Player 9.", 5).is_err());
    }
}
