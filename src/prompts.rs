//! Prompt templates for every action a seat can be asked to take.
//!
//! Templates are opaque to the orchestrator: phases fill in game state and
//! parse the constrained reply format, nothing here affects rules. Every
//! prompt carries an `ACTION:` marker so offline providers can key on it.

use crate::roles::Role;

/// Condensed game rules included in every seat's system instruction.
pub const GAME_RULES: &str = "\
You are playing The Resistance: Avalon. Good wins by succeeding three quests; \
Evil wins by failing three quests, by forcing five consecutive team rejections \
into chaos, or by assassinating Merlin after Good's third success. Each round \
a rotating leader proposes a quest team, everyone discusses and votes, and an \
approved team secretly plays success or fail cards. Speak carefully: \
everything you say in discussions is public.";

const COTHOUGHT: &str = "Please forget you are an AI. As a player in the game, \
think it through step by step, and then act.";

/// Per-role briefing appended to the system instruction.
pub fn role_context(role: Role) -> &'static str {
    match role {
        Role::Merlin => {
            "You are Merlin. You know the evil players, but if you are ever \
             identified, the Assassin will kill you at the end. Guide Good subtly."
        }
        Role::Percival => {
            "You are Percival. You see two candidates for Merlin, one of whom is \
             Morgana in disguise. Protect the real Merlin by drawing fire."
        }
        Role::LoyalServant => {
            "You are a Loyal Servant of Arthur. You have no special sight; reason \
             from votes and quest outcomes."
        }
        Role::Morgana => {
            "You are Morgana. You appear to Percival as a Merlin candidate. Sow \
             confusion and fail quests when the moment is right."
        }
        Role::Mordred => {
            "You are Mordred. Merlin cannot see you. Use that cover to earn \
             Good's trust and strike late."
        }
        Role::Oberon => {
            "You are Oberon. You are evil but alone: the other minions do not \
             know you, and you do not know them."
        }
        Role::Assassin => {
            "You are the Assassin. Watch for the player who knows too much: if \
             Good wins three quests, you choose who dies."
        }
    }
}

/// System instruction for one seat: rules, role briefing, identity and
/// private knowledge.
pub fn system_instruction(seat: usize, role: Role, known_info: &str) -> String {
    format!(
        "{GAME_RULES}\n\n{}\n\nYou are Player {seat} in a game of Avalon. Your \
         role is {role}. {known_info}",
        role_context(role)
    )
}

/// Public discussion statement during team building.
pub fn discussion(seat: usize, history_delta: &str) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: PARTICIPATE_DISCUSSION\n\
         Your Player ID is {seat}. It is your turn to speak about the proposed \
         team. Make one persuasive public statement grounded in the game so \
         far. Do not reveal your identity or anyone else's.\n\n\
         Events since you last spoke:\n{history_delta}\n\nYour statement:"
    )
}

/// Leader's initial team proposal.
pub fn propose_team(seat: usize, team_size: usize, history_delta: &str) -> String {
    let guidance = if history_delta.trim().is_empty() {
        "This is the very first proposal of the game, so argue from general \
         strategy rather than history."
    } else {
        "Justify your choices from the votes, speeches and quest outcomes so far."
    };
    format!(
        "{COTHOUGHT}\n\nACTION: PROPOSE_TEAM\n\
         Your Player ID is {seat}. You are the leader. Propose a team of \
         {team_size} players. Give a specific reason for each player you pick; \
         your goal is to win the vote. {guidance}\n\n\
         Events since you last acted:\n{history_delta}\n\n\
         YOU MUST FOLLOW THIS FORMAT EXACTLY:\n\
         Team: [player_id1, player_id2, ...]\n\
         Reasoning: [your persuasive explanation]"
    )
}

/// Leader's post-discussion confirmation or revision of the team.
pub fn confirm_team(seat: usize, team_size: usize, team: &[usize], history_delta: &str) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: CONFIRM_TEAM\n\
         Your Player ID is {seat}. You are the leader and you have heard the \
         discussion. Your currently proposed team of {team_size} is {team:?}. \
         Keep it or revise it, and give your final persuasive reasoning.\n\n\
         The discussion:\n{history_delta}\n\n\
         YOU MUST FOLLOW THIS FORMAT EXACTLY:\n\
         Team: [player_id1, player_id2, ...]\n\
         Reasoning: [your final explanation]"
    )
}

/// Vote on a proposed team.
pub fn vote(seat: usize, team: &[usize], proposal_reasoning: &str, history_delta: &str) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: VOTE_ON_TEAM\n\
         Your Player ID is {seat}. Vote on the proposed team {team:?}.\n\
         The leader's reasoning: {proposal_reasoning}\n\n\
         Events since you last acted:\n{history_delta}\n\n\
         Format your response as:\n\
         Vote: approve|reject\n\
         Reasoning: [your explanation]"
    )
}

/// Quest card for an Evil seat, with the coordination context it needs:
/// which teammates on this quest are evil, and how many fails are required.
pub fn quest_evil(
    seat: usize,
    role: Role,
    team: &[usize],
    evil_on_team: &[usize],
    fails_required: usize,
) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: EXECUTE_QUEST\n\
         Your Player ID is {seat}. Your role is {role}. You are on the quest \
         team {team:?}. The evil players on this team are {evil_on_team:?}, \
         and this quest fails only if at least {fails_required} fail card(s) \
         are played.\n\
         Your side wants the quest to fail, but excess fail cards expose your \
         team. Coordinate silently using the standard priority: \
         Assassin fails first, then Morgana, then Mordred, then Oberon. If a \
         higher-priority minion is on this team, play success to stay hidden.\n\n\
         Format your response as:\n\
         Action: success|fail\n\
         Reasoning: [your private reasoning]"
    )
}

/// Assassin's initial target proposal.
pub fn assassinate_proposal(seat: usize, targets: &[usize], history_delta: &str) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: ASSASSINATE_PROPOSAL\n\
         Your Player ID is {seat}. Good has completed three quests; this is \
         Evil's last chance. Propose which player to assassinate as Merlin, \
         from {targets:?}. Look for whoever quietly knew too much.\n\n\
         The game so far:\n{history_delta}\n\n\
         Format your response as:\n\
         Target: player_id\n\
         Reasoning: [why you believe this player is Merlin]"
    )
}

/// Evil teammate's counsel on the proposed assassination target.
pub fn assassinate_counsel(
    seat: usize,
    proposal_target: usize,
    proposal_reasoning: &str,
    history_delta: &str,
) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: ASSASSINATE_DISCUSSION\n\
         Your Player ID is {seat}. The assassin proposes to kill Player \
         {proposal_target}, reasoning: {proposal_reasoning}\n\
         Give your counsel: agree, or argue for a different target, citing the \
         game history.\n\n\
         The game so far:\n{history_delta}\n\nYour counsel:"
    )
}

/// Assassin's final decision after hearing counsel.
pub fn assassinate_decision(seat: usize, targets: &[usize], history_delta: &str) -> String {
    format!(
        "{COTHOUGHT}\n\nACTION: ASSASSINATE_DECISION\n\
         Your Player ID is {seat}. You have heard your team's counsel. Make \
         the final call: who dies, from {targets:?}?\n\n\
         The counsel:\n{history_delta}\n\n\
         Format your response as:\n\
         Target: player_id\n\
         Reasoning: [your final reasoning]"
    )
}

/// Post-game MVP nomination.
pub fn nominate_mvp(seat: usize, num_players: usize, history_delta: &str) -> String {
    format!(
        "ACTION: NOMINATE_MVP\n\
         Your Player ID is {seat}. The game is over and all roles are public. \
         Nominate the most valuable player (any of players 0..{num_players}) \
         in the form 'I nominate Player X' followed by your reasoning.\n\n\
         The full game:\n{history_delta}\n\nYour nomination:"
    )
}

/// MVP's closing speech.
pub fn mvp_speech(seat: usize, result_summary: &str) -> String {
    format!(
        "ACTION: MVP_SPEECH\n\
         Your Player ID is {seat}. You have been elected MVP of the game. The \
         final result: {result_summary}\n\
         Give a short victory or defeat speech."
    )
}
