//! Pure vote and lineup aggregation helpers.
//!
//! Everything here is a projection over [`GameSession`]/[`Round`] data; the
//! services call these against fresh state before committing a transition.

use uuid::Uuid;

use crate::state::game::{GameSession, Round};

/// Vote counts for a single target team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTally {
    /// Team the votes point at.
    pub team_id: Uuid,
    /// Number of participants currently voting for this team.
    pub count: u32,
    /// Integer percentage of the total, rounded half-up.
    pub percentage: u32,
}

/// Full tally for one round, covering every active team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    /// Round the tally was computed for.
    pub round_id: Uuid,
    /// Total number of votes cast so far.
    pub total: u32,
    /// Per-team counts in team display order.
    pub entries: Vec<TeamTally>,
}

/// Compute the current tally for `round` across the game's active teams.
/// Percentages divide by `max(total, 1)` so an empty tally reads all-zero
/// instead of dividing by zero.
pub fn tally_votes(game: &GameSession, round: &Round) -> VoteTally {
    let total = round.votes.len() as u32;
    let denominator = total.max(1);

    let entries = game
        .active_teams()
        .map(|(team_id, _)| {
            let count = round
                .votes
                .values()
                .filter(|vote| vote.team_id == *team_id)
                .count() as u32;
            let percentage =
                ((f64::from(count) * 100.0) / f64::from(denominator)).round() as u32;
            TeamTally {
                team_id: *team_id,
                count,
                percentage,
            }
        })
        .collect();

    VoteTally {
        round_id: round.id,
        total,
        entries,
    }
}

/// Required lineup size for the round's challenge, `None` when the
/// challenge leaves it unrestricted (or no challenge is set).
pub fn required_lineup_count(game: &GameSession, round: &Round) -> Option<u32> {
    round
        .challenge_id
        .and_then(|id| game.challenges.get(&id))
        .and_then(|challenge| challenge.participants_per_team)
}

/// Whether `team_id` has a valid lineup for the round: exactly the required
/// count when one is set, otherwise at least one participant.
pub fn team_lineup_ready(game: &GameSession, round: &Round, team_id: Uuid) -> bool {
    let selected = round.lineup_for_team(team_id).len() as u32;
    match required_lineup_count(game, round) {
        Some(required) => selected == required,
        None => selected > 0,
    }
}

/// Whether another participant may be added to `team_id`'s lineup without
/// exceeding the required count. Unrestricted challenges always accept.
pub fn can_add_to_lineup(game: &GameSession, round: &Round, team_id: Uuid) -> bool {
    match required_lineup_count(game, round) {
        Some(required) => (round.lineup_for_team(team_id).len() as u32) < required,
        None => true,
    }
}

/// Game-wide gate for opening the vote: every active team must have a ready
/// lineup.
pub fn all_lineups_ready(game: &GameSession, round: &Round) -> bool {
    game.active_teams()
        .all(|(team_id, _)| team_lineup_ready(game, round, *team_id))
}

/// Gate for starting a round from the lobby: at least two active teams,
/// each with at least one roster member.
pub fn teams_ready_for_round(game: &GameSession) -> bool {
    let mut active = 0usize;
    for (team_id, _) in game.active_teams() {
        if game.roster_count(*team_id) == 0 {
            return false;
        }
        active += 1;
    }
    active >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::game::{Challenge, Participant};

    fn game_with_teams(count: usize) -> (GameSession, Vec<Uuid>) {
        let config = AppConfig::default();
        let mut game = GameSession::new("Test".into(), String::new(), 8, None);
        let ids = (0..count)
            .map(|i| game.add_team(&config, format!("Team {i}"), None).0)
            .collect();
        (game, ids)
    }

    fn add_player(game: &mut GameSession, team_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        game.participants.insert(
            id,
            Participant {
                user_id: format!("user-{name}"),
                nickname: name.into(),
                team_id: Some(team_id),
            },
        );
        id
    }

    #[test]
    fn empty_tally_is_all_zero() {
        let (game, teams) = game_with_teams(2);
        let round = Round::new(0, None);

        let tally = tally_votes(&game, &round);
        assert_eq!(tally.total, 0);
        assert_eq!(tally.entries.len(), 2);
        for entry in &tally.entries {
            assert!(teams.contains(&entry.team_id));
            assert_eq!(entry.count, 0);
            assert_eq!(entry.percentage, 0);
        }
    }

    #[test]
    fn tally_percentages_follow_counts() {
        let (mut game, teams) = game_with_teams(2);
        let mut round = Round::new(0, None);

        let voters: Vec<Uuid> = (0..4)
            .map(|i| add_player(&mut game, teams[i % 2], &format!("p{i}")))
            .collect();
        round.cast_vote(voters[0], teams[0]);
        round.cast_vote(voters[1], teams[1]);
        round.cast_vote(voters[2], teams[1]);
        round.cast_vote(voters[3], teams[1]);

        let tally = tally_votes(&game, &round);
        assert_eq!(tally.total, 4);
        assert_eq!(tally.entries[0], TeamTally {
            team_id: teams[0],
            count: 1,
            percentage: 25,
        });
        assert_eq!(tally.entries[1].count, 3);
        assert_eq!(tally.entries[1].percentage, 75);
    }

    #[test]
    fn unrestricted_lineup_needs_at_least_one() {
        let (game, teams) = game_with_teams(2);
        let mut round = Round::new(0, None);

        assert!(!team_lineup_ready(&game, &round, teams[0]));
        round.add_to_lineup(teams[0], Uuid::new_v4());
        assert!(team_lineup_ready(&game, &round, teams[0]));
        assert!(!all_lineups_ready(&game, &round));

        round.add_to_lineup(teams[1], Uuid::new_v4());
        assert!(all_lineups_ready(&game, &round));
    }

    #[test]
    fn required_lineup_must_match_exactly() {
        let (mut game, teams) = game_with_teams(2);
        let challenge_id = Uuid::new_v4();
        game.challenges.insert(
            challenge_id,
            Challenge {
                title: "Relay".into(),
                description: String::new(),
                participants_per_team: Some(2),
                position: 0,
            },
        );
        let mut round = Round::new(0, Some(challenge_id));

        round.add_to_lineup(teams[0], Uuid::new_v4());
        assert!(!team_lineup_ready(&game, &round, teams[0]));
        round.add_to_lineup(teams[0], Uuid::new_v4());
        assert!(team_lineup_ready(&game, &round, teams[0]));
    }

    #[test]
    fn eleventh_player_rejected_when_ten_required() {
        let (mut game, teams) = game_with_teams(2);
        let challenge_id = Uuid::new_v4();
        game.challenges.insert(
            challenge_id,
            Challenge {
                title: "Mass tug".into(),
                description: String::new(),
                participants_per_team: Some(10),
                position: 0,
            },
        );
        let mut round = Round::new(0, Some(challenge_id));

        for _ in 0..10 {
            assert!(can_add_to_lineup(&game, &round, teams[0]));
            round.add_to_lineup(teams[0], Uuid::new_v4());
        }
        assert!(!can_add_to_lineup(&game, &round, teams[0]));
        assert_eq!(round.lineup_for_team(teams[0]).len(), 10);
    }

    #[test]
    fn round_start_requires_two_staffed_teams() {
        let (mut game, teams) = game_with_teams(2);
        assert!(!teams_ready_for_round(&game));

        add_player(&mut game, teams[0], "ana");
        assert!(!teams_ready_for_round(&game));

        add_player(&mut game, teams[1], "bo");
        assert!(teams_ready_for_round(&game));

        game.teams.get_mut(&teams[1]).unwrap().is_active = false;
        assert!(!teams_ready_for_round(&game));
    }
}
