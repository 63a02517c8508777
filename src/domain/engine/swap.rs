use crate::domain::assignment::{Assignment, receiver_of};
use crate::domain::participant::{Participant, ParticipantId};
use crate::error::{Result, SantaError};
use rand::Rng;
use rand::seq::SliceRandom;

/// Result of a single-participant reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub assignments: Vec<Assignment>,
    /// The giver whose receiver was exchanged with the requester's.
    /// `None` when the requester had no assignment and nothing changed.
    pub partner: Option<ParticipantId>,
}

/// Gives `requester` a different receiver by exchanging receivers with one
/// other giver.
///
/// A partner `p` qualifies when, after the exchange, neither side gives to
/// itself and the exchange actually changes something:
/// - `p` is not the requester and does not give to the requester,
/// - `p` does not give to the requester's current receiver,
/// - `p` is not the requester's current receiver.
///
/// Unconfirmed partners are preferred; among equals the choice is uniform.
pub fn reassign_one<R: Rng + ?Sized>(
    requester: &ParticipantId,
    assignments: &[Assignment],
    participants: &[Participant],
    rng: &mut R,
) -> Result<SwapOutcome> {
    let Some(current) = receiver_of(assignments, requester).cloned() else {
        return Ok(SwapOutcome {
            assignments: assignments.to_vec(),
            partner: None,
        });
    };

    let candidates: Vec<&Assignment> = assignments
        .iter()
        .filter(|p| {
            &p.giver_id != requester
                && &p.receiver_id != requester
                && p.receiver_id != current
                && p.giver_id != current
        })
        .collect();

    let unconfirmed: Vec<&Assignment> = candidates
        .iter()
        .copied()
        .filter(|c| {
            !participants
                .iter()
                .any(|p| p.id == c.giver_id && p.has_confirmed_assignment)
        })
        .collect();

    let pool = if unconfirmed.is_empty() {
        &candidates
    } else {
        &unconfirmed
    };
    let Some(chosen) = pool.choose(rng) else {
        return Err(SantaError::NoValidSwap {
            participant: requester.clone(),
        });
    };

    let partner = chosen.giver_id.clone();
    let partner_receiver = chosen.receiver_id.clone();
    let assignments = assignments
        .iter()
        .map(|a| {
            if &a.giver_id == requester {
                Assignment::new(requester.clone(), partner_receiver.clone())
            } else if a.giver_id == partner {
                Assignment::new(partner.clone(), current.clone())
            } else {
                a.clone()
            }
        })
        .collect();

    Ok(SwapOutcome {
        assignments,
        partner: Some(partner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::check_assignments;
    use crate::domain::engine::fixtures::{cycle, participants, rng};

    fn changed_givers(before: &[Assignment], after: &[Assignment]) -> Vec<ParticipantId> {
        before
            .iter()
            .filter(|a| receiver_of(after, &a.giver_id) != Some(&a.receiver_id))
            .map(|a| a.giver_id.clone())
            .collect()
    }

    #[test]
    fn test_three_participants_have_no_valid_swap() {
        // a -> b -> c -> a: for a, b is the current receiver and c gives to a.
        let p = participants(&["a", "b", "c"]);
        let assignments = cycle(&["a", "b", "c"]);
        for requester in ["a", "b", "c"] {
            let result = reassign_one(&requester.into(), &assignments, &p, &mut rng(0));
            assert!(matches!(
                result,
                Err(SantaError::NoValidSwap { ref participant }) if participant.as_str() == requester
            ));
        }
    }

    #[test]
    fn test_four_cycle_has_exactly_one_partner() {
        let p = participants(&["a", "b", "c", "d"]);
        let assignments = cycle(&["a", "b", "c", "d"]);

        let outcome = reassign_one(&"a".into(), &assignments, &p, &mut rng(3)).unwrap();

        assert_eq!(outcome.partner, Some("c".into()));
        assert_eq!(receiver_of(&outcome.assignments, &"a".into()), Some(&"d".into()));
        assert_eq!(receiver_of(&outcome.assignments, &"c".into()), Some(&"b".into()));
        assert_eq!(receiver_of(&outcome.assignments, &"b".into()), Some(&"c".into()));
        assert_eq!(receiver_of(&outcome.assignments, &"d".into()), Some(&"a".into()));
        check_assignments(&p, &outcome.assignments).unwrap();
    }

    #[test]
    fn test_swap_changes_exactly_two_givers() {
        let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let p = participants(&names);
        let assignments = cycle(&names);
        for seed in 0..30 {
            let outcome = reassign_one(&"d".into(), &assignments, &p, &mut rng(seed)).unwrap();
            check_assignments(&p, &outcome.assignments).unwrap();

            let mut changed = changed_givers(&assignments, &outcome.assignments);
            changed.sort();
            let mut expected = vec!["d".into(), outcome.partner.clone().unwrap()];
            expected.sort();
            assert_eq!(changed, expected);
            assert_ne!(
                receiver_of(&outcome.assignments, &"d".into()),
                Some(&"e".into())
            );
        }
    }

    #[test]
    fn test_prefers_unconfirmed_partner() {
        // a -> b -> c -> d -> e -> a; for a the candidates are c and d.
        let mut p = participants(&["a", "b", "c", "d", "e"]);
        let assignments = cycle(&["a", "b", "c", "d", "e"]);
        p[2].has_confirmed_assignment = true;

        for seed in 0..20 {
            let outcome = reassign_one(&"a".into(), &assignments, &p, &mut rng(seed)).unwrap();
            assert_eq!(outcome.partner, Some("d".into()));
            assert_eq!(receiver_of(&outcome.assignments, &"a".into()), Some(&"e".into()));
            assert_eq!(receiver_of(&outcome.assignments, &"d".into()), Some(&"b".into()));
        }
    }

    #[test]
    fn test_falls_back_to_confirmed_partner() {
        let mut p = participants(&["a", "b", "c", "d"]);
        let assignments = cycle(&["a", "b", "c", "d"]);
        for participant in &mut p {
            participant.has_confirmed_assignment = true;
        }
        let outcome = reassign_one(&"a".into(), &assignments, &p, &mut rng(0)).unwrap();
        assert_eq!(outcome.partner, Some("c".into()));
    }

    #[test]
    fn test_missing_requester_is_a_noop() {
        let p = participants(&["a", "b", "c"]);
        let assignments = cycle(&["a", "b", "c"]);
        let outcome = reassign_one(&"zed".into(), &assignments, &p, &mut rng(0)).unwrap();
        assert_eq!(outcome.assignments, assignments);
        assert_eq!(outcome.partner, None);
    }

    #[test]
    fn test_two_cycles_swap_merges_them() {
        // a <-> b, c <-> d. For a: b is its receiver, b gives to a; c and d qualify.
        let p = participants(&["a", "b", "c", "d"]);
        let assignments = vec![
            Assignment::new("a".into(), "b".into()),
            Assignment::new("b".into(), "a".into()),
            Assignment::new("c".into(), "d".into()),
            Assignment::new("d".into(), "c".into()),
        ];
        let outcome = reassign_one(&"a".into(), &assignments, &p, &mut rng(11)).unwrap();
        check_assignments(&p, &outcome.assignments).unwrap();
        assert!(matches!(outcome.partner.as_ref().map(|p| p.as_str()), Some("c") | Some("d")));
    }
}
