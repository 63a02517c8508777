use super::generator::generate;
use crate::domain::assignment::{Assignment, check_assignments};
use crate::domain::game::Game;
use crate::domain::participant::ParticipantId;
use crate::error::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Reassigns everyone who has not confirmed.
///
/// - Nobody or everybody confirmed: the whole set is regenerated and every
///   confirmation is cleared, since every assignment changes.
/// - Some confirmed: confirmed givers keep their edge. Unconfirmed givers are
///   paired with the receivers nobody locked, retrying up to `max_attempts`
///   shuffles to avoid self-assignment before falling back to a full
///   regeneration.
///
/// All pending reassignment requests are dropped in every case.
pub fn reassign_all<R: Rng + ?Sized>(
    game: &Game,
    rng: &mut R,
    max_attempts: usize,
) -> Result<Game> {
    let mut next = game.clone();
    next.clear_requests();

    let confirmed = game.confirmed_count();
    if confirmed == 0 || confirmed == game.participants.len() {
        return regenerate_all(next, rng);
    }
    if let Err(e) = check_assignments(&game.participants, &game.assignments) {
        warn!(game = %game.id, error = %e, "Existing assignments are inconsistent, regenerating");
        return regenerate_all(next, rng);
    }

    match reshuffle_unconfirmed(game, rng, max_attempts) {
        Some(assignments) => {
            next.assignments = assignments;
            Ok(next)
        }
        None => {
            warn!(
                game = %game.id,
                attempts = max_attempts,
                "No self-free pairing found, falling back to full regeneration"
            );
            regenerate_all(next, rng)
        }
    }
}

fn regenerate_all<R: Rng + ?Sized>(mut game: Game, rng: &mut R) -> Result<Game> {
    game.assignments = generate(&game.participants, rng)?;
    game.clear_confirmations();
    Ok(game)
}

/// Assumes `game.assignments` is a valid bijection, so the free receivers are
/// exactly as many as the unconfirmed givers.
fn reshuffle_unconfirmed<R: Rng + ?Sized>(
    game: &Game,
    rng: &mut R,
    max_attempts: usize,
) -> Option<Vec<Assignment>> {
    let claimed: HashSet<&ParticipantId> = game
        .assignments
        .iter()
        .filter(|a| game.is_confirmed(&a.giver_id))
        .map(|a| &a.receiver_id)
        .collect();

    let mut givers: Vec<&ParticipantId> = game
        .assignments
        .iter()
        .filter(|a| !game.is_confirmed(&a.giver_id))
        .map(|a| &a.giver_id)
        .collect();
    let mut receivers: Vec<&ParticipantId> = game
        .participants
        .iter()
        .map(|p| &p.id)
        .filter(|id| !claimed.contains(id))
        .collect();

    givers.shuffle(rng);
    for attempt in 1..=max_attempts {
        receivers.shuffle(rng);
        if givers.iter().zip(&receivers).all(|(g, r)| g != r) {
            debug!(game = %game.id, attempt, "Reshuffled unconfirmed participants");
            let paired: HashMap<&ParticipantId, &ParticipantId> =
                givers.iter().copied().zip(receivers.iter().copied()).collect();
            return Some(
                game.assignments
                    .iter()
                    .map(|a| match paired.get(&a.giver_id) {
                        Some(receiver) => Assignment::new(a.giver_id.clone(), (*receiver).clone()),
                        None => a.clone(),
                    })
                    .collect(),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::fixtures::{confirm, game, rng};
    use crate::domain::game::ReassignmentRequest;
    use chrono::Utc;

    const NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

    fn with_request(mut g: Game, who: &str) -> Game {
        g.participant_mut(&who.into())
            .unwrap()
            .has_pending_reassignment_request = true;
        g.reassignment_requests.push(ReassignmentRequest {
            participant_id: who.into(),
            participant_name: who.to_string(),
            requested_at: Utc::now(),
        });
        g
    }

    #[test]
    fn test_no_confirmations_regenerates_everything() {
        let g = with_request(game(&NAMES), "b");
        let next = reassign_all(&g, &mut rng(1), 100).unwrap();

        check_assignments(&next.participants, &next.assignments).unwrap();
        assert!(next.reassignment_requests.is_empty());
        assert!(next.participants.iter().all(|p| !p.has_pending_reassignment_request));
        assert_eq!(next.confirmed_count(), 0);
        // Input snapshot untouched.
        assert_eq!(g.reassignment_requests.len(), 1);
    }

    #[test]
    fn test_all_confirmed_regenerates_and_clears_confirmations() {
        let mut g = game(&NAMES);
        confirm(&mut g, &NAMES);
        let next = reassign_all(&g, &mut rng(2), 100).unwrap();

        check_assignments(&next.participants, &next.assignments).unwrap();
        assert_eq!(next.confirmed_count(), 0);
        assert_eq!(g.confirmed_count(), NAMES.len());
    }

    #[test]
    fn test_partial_keeps_locked_assignments() {
        for seed in 0..40 {
            let mut g = with_request(game(&NAMES), "e");
            confirm(&mut g, &["a", "c"]);
            let next = reassign_all(&g, &mut rng(seed), 100).unwrap();

            check_assignments(&next.participants, &next.assignments).unwrap();
            for locked in ["a", "c"] {
                let before = g.assignments.iter().find(|x| x.giver_id.as_str() == locked);
                let after = next.assignments.iter().find(|x| x.giver_id.as_str() == locked);
                assert_eq!(before, after);
                assert!(next.is_confirmed(&locked.into()));
            }
            assert_eq!(next.confirmed_count(), 2);
            assert!(next.reassignment_requests.is_empty());
        }
    }

    #[test]
    fn test_single_unconfirmed_keeps_its_receiver() {
        let mut g = game(&["a", "b", "c", "d"]);
        confirm(&mut g, &["a", "b", "c"]);
        let next = reassign_all(&g, &mut rng(5), 100).unwrap();
        assert_eq!(next.assignments, g.assignments);
        assert_eq!(next.confirmed_count(), 3);
    }

    #[test]
    fn test_exhausted_attempts_fall_back_to_full_regeneration() {
        let mut g = game(&NAMES);
        confirm(&mut g, &["a"]);
        let next = reassign_all(&g, &mut rng(9), 0).unwrap();

        check_assignments(&next.participants, &next.assignments).unwrap();
        assert_eq!(next.confirmed_count(), 0);
    }

    #[test]
    fn test_inconsistent_state_is_regenerated() {
        let mut g = game(&NAMES);
        confirm(&mut g, &["a"]);
        g.assignments.pop();
        let next = reassign_all(&g, &mut rng(4), 100).unwrap();
        check_assignments(&next.participants, &next.assignments).unwrap();
        assert_eq!(next.confirmed_count(), 0);
    }
}
