//! Score computation.
//!
//! Scores are always recomputed from the full round history, never kept as
//! running counters. The projection is order independent: any traversal of
//! the same rounds yields the same totals.

use uuid::Uuid;

use crate::state::game::{GameSession, Round};

/// Points credited to a voter's team when the team they voted for is marked
/// as a loser.
pub const REWARD_PER_CORRECT_VOTE: u32 = 3;

/// Computed standings for one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamScore {
    /// The team being scored.
    pub team_id: Uuid,
    /// Points earned by correct loser predictions from this team's members.
    pub vote_points: u32,
    /// Host-assigned challenge points accumulated over all rounds.
    pub challenge_points: u32,
    /// Sum of the two components.
    pub total: u32,
}

/// Recompute the scoreboard for every team (active or not) over the given
/// rounds, in team display order.
///
/// Per round: each outcome's `challenge_points` go to the outcome's team,
/// and every vote cast on a team marked `is_loser` credits
/// [`REWARD_PER_CORRECT_VOTE`] to the voter's own team. Voters without a
/// team assignment earn nothing.
pub fn compute_scores<'a>(
    game: &GameSession,
    rounds: impl Iterator<Item = &'a Round>,
) -> Vec<TeamScore> {
    let mut scores: Vec<TeamScore> = game
        .teams
        .keys()
        .map(|team_id| TeamScore {
            team_id: *team_id,
            vote_points: 0,
            challenge_points: 0,
            total: 0,
        })
        .collect();

    for round in rounds {
        let losers = round.losing_team_ids();

        for (team_id, outcome) in &round.outcomes {
            if let Some(score) = scores.iter_mut().find(|s| s.team_id == *team_id) {
                score.challenge_points += outcome.challenge_points;
            }
        }

        for (participant_id, vote) in &round.votes {
            if !losers.contains(&vote.team_id) {
                continue;
            }
            let Some(voter_team) = game
                .participants
                .get(participant_id)
                .and_then(|participant| participant.team_id)
            else {
                continue;
            };
            if let Some(score) = scores.iter_mut().find(|s| s.team_id == voter_team) {
                score.vote_points += REWARD_PER_CORRECT_VOTE;
            }
        }
    }

    for score in &mut scores {
        score.total = score.vote_points + score.challenge_points;
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::game::{Outcome, Participant};

    fn staffed_game(per_team: usize) -> (GameSession, Vec<Uuid>, Vec<Vec<Uuid>>) {
        let config = AppConfig::default();
        let mut game = GameSession::new("Scoring".into(), String::new(), 8, None);
        let teams: Vec<Uuid> = ["A", "B"]
            .iter()
            .map(|name| game.add_team(&config, (*name).into(), None).0)
            .collect();

        let mut members = Vec::new();
        for team_id in &teams {
            let mut roster = Vec::new();
            for i in 0..per_team {
                let id = Uuid::new_v4();
                game.participants.insert(
                    id,
                    Participant {
                        user_id: format!("user-{team_id}-{i}"),
                        nickname: format!("p{i}"),
                        team_id: Some(*team_id),
                    },
                );
                roster.push(id);
            }
            members.push(roster);
        }
        (game, teams, members)
    }

    fn total_for(scores: &[TeamScore], team_id: Uuid) -> u32 {
        scores.iter().find(|s| s.team_id == team_id).unwrap().total
    }

    #[test]
    fn mixed_votes_and_challenge_points() {
        // Two teams of two. Three players vote B (one from A, both from B),
        // one votes A. B loses with 0 challenge points, A gets 5.
        let (game, teams, members) = staffed_game(2);
        let (team_a, team_b) = (teams[0], teams[1]);

        let mut round = Round::new(0, None);
        round.cast_vote(members[0][0], team_b);
        round.cast_vote(members[1][0], team_b);
        round.cast_vote(members[1][1], team_b);
        round.cast_vote(members[0][1], team_a);
        round.record_outcome(
            team_b,
            Outcome {
                is_loser: true,
                challenge_points: 0,
            },
        );
        round.record_outcome(
            team_a,
            Outcome {
                is_loser: false,
                challenge_points: 5,
            },
        );

        let scores = compute_scores(&game, std::iter::once(&round));
        assert_eq!(total_for(&scores, team_a), 8);
        assert_eq!(total_for(&scores, team_b), 6);
    }

    #[test]
    fn recomputation_is_idempotent_and_order_independent() {
        let (game, teams, members) = staffed_game(1);

        let mut first = Round::new(0, None);
        first.cast_vote(members[0][0], teams[1]);
        first.record_outcome(
            teams[1],
            Outcome {
                is_loser: true,
                challenge_points: 2,
            },
        );

        let mut second = Round::new(1, None);
        second.cast_vote(members[1][0], teams[0]);
        second.record_outcome(
            teams[0],
            Outcome {
                is_loser: true,
                challenge_points: 0,
            },
        );

        let forward = compute_scores(&game, [&first, &second].into_iter());
        let reversed = compute_scores(&game, [&second, &first].into_iter());
        let again = compute_scores(&game, [&first, &second].into_iter());

        assert_eq!(forward, again);
        for score in &forward {
            assert_eq!(
                score.total,
                total_for(&reversed, score.team_id),
                "totals must not depend on round order",
            );
        }
    }

    #[test]
    fn votes_for_surviving_teams_earn_nothing() {
        let (game, teams, members) = staffed_game(1);

        let mut round = Round::new(0, None);
        round.cast_vote(members[0][0], teams[1]);
        round.record_outcome(
            teams[0],
            Outcome {
                is_loser: true,
                challenge_points: 0,
            },
        );

        let scores = compute_scores(&game, std::iter::once(&round));
        assert_eq!(total_for(&scores, teams[0]), 0);
        assert_eq!(total_for(&scores, teams[1]), 0);
    }

    #[test]
    fn unassigned_voters_credit_no_team() {
        let (mut game, teams, _) = staffed_game(1);
        let drifter = Uuid::new_v4();
        game.participants.insert(
            drifter,
            Participant {
                user_id: "drifter".into(),
                nickname: "Zoe".into(),
                team_id: None,
            },
        );

        let mut round = Round::new(0, None);
        round.cast_vote(drifter, teams[0]);
        round.record_outcome(
            teams[0],
            Outcome {
                is_loser: true,
                challenge_points: 0,
            },
        );

        let scores = compute_scores(&game, std::iter::once(&round));
        assert!(scores.iter().all(|s| s.total == 0));
    }
}
