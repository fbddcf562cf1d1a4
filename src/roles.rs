//! Roles, allegiances, per-player-count setup tables and role assignment.
//!
//! Visibility rules are expressed as explicit predicates on [`Role`] rather
//! than string-set membership checks, so every phase consults the same
//! closed table.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Which side a role fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allegiance {
    Good,
    Evil,
}

/// The closed set of roles this ruleset supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Merlin,
    Percival,
    LoyalServant,
    Morgana,
    Mordred,
    Oberon,
    Assassin,
}

impl Role {
    /// Allegiance derived from the role.
    pub fn allegiance(&self) -> Allegiance {
        match self {
            Self::Merlin | Self::Percival | Self::LoyalServant => Allegiance::Good,
            Self::Morgana | Self::Mordred | Self::Oberon | Self::Assassin => Allegiance::Evil,
        }
    }

    /// Whether the role is evil.
    pub fn is_evil(&self) -> bool {
        self.allegiance() == Allegiance::Evil
    }

    /// Whether other evil players know this seat is evil.
    ///
    /// Oberon works alone: unknown even to the rest of evil.
    pub fn known_to_evil(&self) -> bool {
        self.is_evil() && *self != Self::Oberon
    }

    /// Whether Merlin's sight reveals this seat as evil.
    ///
    /// Mordred is hidden from Merlin.
    pub fn visible_to_merlin(&self) -> bool {
        self.is_evil() && *self != Self::Mordred
    }

    /// Priority for designating the assassination decider when the game has
    /// no explicit Assassin. Higher wins.
    fn assassin_priority(&self) -> u8 {
        match self {
            Self::Assassin => 4,
            Self::Morgana => 3,
            Self::Mordred => 2,
            Self::Oberon => 1,
            _ => 0,
        }
    }

    /// Human-readable role name, as used in prompts and reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Merlin => "Merlin",
            Self::Percival => "Percival",
            Self::LoyalServant => "Loyal Servant",
            Self::Morgana => "Morgana",
            Self::Mordred => "Mordred",
            Self::Oberon => "Oberon",
            Self::Assassin => "Assassin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Fixed role multiset for a given player count.
///
/// Evil counts follow the standard table: 2 evil at 5-6 players, 3 at 7-9,
/// 4 at 10.
pub fn role_table(num_players: usize) -> Result<&'static [Role], GameError> {
    use Role::*;
    const FIVE: &[Role] = &[Merlin, Percival, LoyalServant, Morgana, Mordred];
    const SIX: &[Role] = &[Merlin, Percival, LoyalServant, LoyalServant, Morgana, Assassin];
    const SEVEN: &[Role] = &[
        Merlin,
        Percival,
        LoyalServant,
        LoyalServant,
        Morgana,
        Assassin,
        Oberon,
    ];
    const EIGHT: &[Role] = &[
        Merlin,
        Percival,
        LoyalServant,
        LoyalServant,
        LoyalServant,
        Morgana,
        Assassin,
        Mordred,
    ];
    const NINE: &[Role] = &[
        Merlin,
        Percival,
        LoyalServant,
        LoyalServant,
        LoyalServant,
        LoyalServant,
        Morgana,
        Assassin,
        Mordred,
    ];
    const TEN: &[Role] = &[
        Merlin,
        Percival,
        LoyalServant,
        LoyalServant,
        LoyalServant,
        LoyalServant,
        Morgana,
        Assassin,
        Mordred,
        Oberon,
    ];

    match num_players {
        5 => Ok(FIVE),
        6 => Ok(SIX),
        7 => Ok(SEVEN),
        8 => Ok(EIGHT),
        9 => Ok(NINE),
        10 => Ok(TEN),
        _ => Err(GameError::NoRoleTable { num_players }),
    }
}

/// Required team size for each of the five quests.
pub fn quest_sizes(num_players: usize) -> Result<[usize; 5], GameError> {
    match num_players {
        5 => Ok([2, 3, 2, 3, 3]),
        6 => Ok([2, 3, 4, 3, 4]),
        7 => Ok([2, 3, 3, 4, 4]),
        8..=10 => Ok([3, 4, 4, 5, 5]),
        _ => Err(GameError::NoRoleTable { num_players }),
    }
}

/// Number of fail cards needed to fail a quest.
///
/// The fourth quest (`quest_number == 4`) needs two fails at 7+ players;
/// every other quest needs one.
pub fn fails_required(num_players: usize, quest_number: usize) -> usize {
    if quest_number == 4 && num_players >= 7 {
        2
    } else {
        1
    }
}

/// The result of role assignment: one role and one knowledge string per seat.
#[derive(Debug, Clone)]
pub struct RoleAssignment {
    seat_roles: Vec<Role>,
    known_info: Vec<String>,
}

impl RoleAssignment {
    /// Shuffle the role table for `num_players` and derive each seat's
    /// private knowledge. Called exactly once per game.
    pub fn assign(num_players: usize, rng: &mut ChaCha8Rng) -> Result<Self, GameError> {
        let mut roles = role_table(num_players)?.to_vec();
        roles.shuffle(rng);
        Ok(Self::from_seat_roles(roles, rng))
    }

    /// Build an assignment from an explicit seat-to-role list.
    ///
    /// The rng is still needed to shuffle Percival's two candidates so his
    /// string carries no positional hint.
    pub fn from_seat_roles(seat_roles: Vec<Role>, rng: &mut ChaCha8Rng) -> Self {
        let known_info = (0..seat_roles.len())
            .map(|seat| derive_known_info(seat, &seat_roles, rng))
            .collect();
        Self {
            seat_roles,
            known_info,
        }
    }

    /// Number of seats in the game.
    pub fn num_players(&self) -> usize {
        self.seat_roles.len()
    }

    /// Role assigned to a seat.
    pub fn role(&self, seat: usize) -> Role {
        self.seat_roles[seat]
    }

    /// All seat roles in seat order.
    pub fn seat_roles(&self) -> &[Role] {
        &self.seat_roles
    }

    /// Private knowledge string for a seat.
    pub fn known_info(&self, seat: usize) -> &str {
        &self.known_info[seat]
    }

    /// Seats whose role satisfies a predicate, in seat order.
    pub fn seats_where(&self, pred: impl Fn(Role) -> bool) -> Vec<usize> {
        self.seat_roles
            .iter()
            .enumerate()
            .filter(|(_, r)| pred(**r))
            .map(|(s, _)| s)
            .collect()
    }

    /// The seat holding a specific role, if in play.
    pub fn seat_of(&self, role: Role) -> Option<usize> {
        self.seat_roles.iter().position(|r| *r == role)
    }

    /// The evil seat that carries out the assassination.
    ///
    /// The Assassin if in play, otherwise the highest-priority evil role
    /// (Morgana, then Mordred, then Oberon).
    pub fn assassin_seat(&self) -> Result<usize, GameError> {
        self.seat_roles
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_evil())
            .max_by_key(|(_, r)| r.assassin_priority())
            .map(|(s, _)| s)
            .ok_or(GameError::RoleNotInGame { role: "Assassin" })
    }

    /// Merlin's seat.
    pub fn merlin_seat(&self) -> Result<usize, GameError> {
        self.seat_of(Role::Merlin)
            .ok_or(GameError::RoleNotInGame { role: "Merlin" })
    }
}

/// Compute one seat's knowledge string from the full mapping.
///
/// Pure apart from Percival's candidate shuffle. Must never name Mordred's
/// seat to Merlin, and must never tell Percival which candidate is which.
fn derive_known_info(seat: usize, roles: &[Role], rng: &mut ChaCha8Rng) -> String {
    let role = roles[seat];

    if role.known_to_evil() {
        let teammates: Vec<usize> = roles
            .iter()
            .enumerate()
            .filter(|(s, r)| *s != seat && r.known_to_evil())
            .map(|(s, _)| s)
            .collect();
        return format!(
            "You are a Minion of Mordred. Your fellow conspirators are players {:?}. \
             You know they are evil, but not their specific roles.",
            teammates
        );
    }

    match role {
        Role::Merlin => {
            let visible: Vec<usize> = roles
                .iter()
                .enumerate()
                .filter(|(_, r)| r.visible_to_merlin())
                .map(|(s, _)| s)
                .collect();
            let mut info = format!("You see evil in the hearts of players {:?}.", visible);
            if roles.contains(&Role::Mordred) {
                info.push_str(
                    " Be warned: the traitor Mordred is hidden from your sight and walks among them.",
                );
            }
            info
        }
        Role::Percival => {
            match (
                roles.iter().position(|r| *r == Role::Merlin),
                roles.iter().position(|r| *r == Role::Morgana),
            ) {
                (Some(merlin), Some(morgana)) => {
                    let mut candidates = [merlin, morgana];
                    candidates.shuffle(rng);
                    format!(
                        "You see players {:?}. One is Merlin and one is Morgana, \
                         but you do not know which is which.",
                        candidates
                    )
                }
                _ => "You have no special knowledge.".to_string(),
            }
        }
        // Oberon knows he is evil but sees no one.
        Role::Oberon => {
            "You are a Minion of Mordred, but you work alone: you do not know the other \
             evil players, and they do not know you."
                .to_string()
        }
        _ => "You have no special knowledge.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn role_tables_have_standard_evil_counts() {
        let expected = [(5, 2), (6, 2), (7, 3), (8, 3), (9, 3), (10, 4)];
        for (n, evil) in expected {
            let table = role_table(n).unwrap();
            assert_eq!(table.len(), n);
            assert_eq!(table.iter().filter(|r| r.is_evil()).count(), evil, "{n} players");
        }
    }

    #[test]
    fn unsupported_player_count_is_rejected() {
        assert!(matches!(
            role_table(4),
            Err(GameError::NoRoleTable { num_players: 4 })
        ));
        assert!(role_table(11).is_err());
        assert!(quest_sizes(4).is_err());
    }

    #[test]
    fn assignment_preserves_allegiance_counts_and_fills_known_info() {
        for n in 5..=10 {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let assignment = RoleAssignment::assign(n, &mut rng).unwrap();
            let evil = role_table(n).unwrap().iter().filter(|r| r.is_evil()).count();
            assert_eq!(
                assignment.seats_where(|r| r.is_evil()).len(),
                evil,
                "{n} players"
            );
            for seat in 0..n {
                assert!(!assignment.known_info(seat).is_empty());
            }
        }
    }

    #[test]
    fn merlin_is_never_told_mordreds_seat() {
        // Player counts whose table includes Mordred alongside other evil.
        for n in [8, 9, 10] {
            for seed in 0..50 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let assignment = RoleAssignment::assign(n, &mut rng).unwrap();
                let mordred = assignment.seat_of(Role::Mordred).unwrap();
                let merlin = assignment.merlin_seat().unwrap();
                let info = assignment.known_info(merlin);
                let visible = assignment.seats_where(|r| r.visible_to_merlin());
                assert!(!visible.contains(&mordred));
                assert!(info.contains(&format!("{:?}", visible)));
                assert!(info.contains("hidden from your sight"));
            }
        }
    }

    #[test]
    fn percival_sees_exactly_merlin_and_morgana_unlabeled() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let assignment = RoleAssignment::assign(5, &mut rng).unwrap();
        let percival = assignment.seat_of(Role::Percival).unwrap();
        let merlin = assignment.merlin_seat().unwrap();
        let morgana = assignment.seat_of(Role::Morgana).unwrap();
        let info = assignment.known_info(percival);
        let ordered = format!("[{}, {}]", merlin, morgana);
        let reversed = format!("[{}, {}]", morgana, merlin);
        assert!(info.contains(&ordered) || info.contains(&reversed));
        assert!(info.contains("do not know which is which"));
    }

    #[test]
    fn evil_seats_see_each_other_but_not_oberon() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let assignment = RoleAssignment::assign(7, &mut rng).unwrap();
        let oberon = assignment.seat_of(Role::Oberon).unwrap();
        let morgana = assignment.seat_of(Role::Morgana).unwrap();
        let assassin = assignment.seat_of(Role::Assassin).unwrap();
        // At 7 players the non-Oberon evil are Morgana and the Assassin, so
        // Morgana's teammate list is exactly the Assassin's seat.
        let info = assignment.known_info(morgana);
        assert!(info.contains(&format!("{:?}", vec![assassin])));
        assert_ne!(oberon, assassin);
        // Oberon gets his own solitary string.
        assert!(assignment.known_info(oberon).contains("work alone"));
    }

    #[test]
    fn assassin_designation_follows_priority() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // 5-player table has no Assassin role: Morgana takes the knife.
        let assignment = RoleAssignment::from_seat_roles(
            vec![
                Role::Merlin,
                Role::Percival,
                Role::LoyalServant,
                Role::Mordred,
                Role::Morgana,
            ],
            &mut rng,
        );
        assert_eq!(assignment.assassin_seat().unwrap(), 4);

        let assignment = RoleAssignment::from_seat_roles(
            vec![
                Role::Merlin,
                Role::Assassin,
                Role::LoyalServant,
                Role::Mordred,
                Role::Morgana,
            ],
            &mut rng,
        );
        assert_eq!(assignment.assassin_seat().unwrap(), 1);
    }

    #[test]
    fn fourth_quest_needs_two_fails_at_seven_plus() {
        assert_eq!(fails_required(5, 4), 1);
        assert_eq!(fails_required(6, 4), 1);
        assert_eq!(fails_required(7, 4), 2);
        assert_eq!(fails_required(10, 4), 2);
        assert_eq!(fails_required(7, 3), 1);
        assert_eq!(fails_required(7, 5), 1);
    }
}
