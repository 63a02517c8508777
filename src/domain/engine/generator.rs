use crate::domain::assignment::Assignment;
use crate::domain::participant::{Participant, ParticipantId};
use crate::error::{Result, SantaError};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Smallest group that admits a no-self, no-mutual-pair cyclic assignment.
pub const MIN_PARTICIPANTS: usize = 3;

/// Builds a single n-cycle over `participants`.
///
/// The participants are shuffled and each one gives to the next in the
/// shuffled order, the last one closing the cycle. This yields a bijection
/// without fixed points by construction, no retries needed.
pub fn generate<R: Rng + ?Sized>(
    participants: &[Participant],
    rng: &mut R,
) -> Result<Vec<Assignment>> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(SantaError::InsufficientParticipants {
            count: participants.len(),
        });
    }

    let mut order: Vec<&ParticipantId> = participants.iter().map(|p| &p.id).collect();
    let unique: HashSet<&ParticipantId> = order.iter().copied().collect();
    if unique.len() != order.len() {
        return Err(SantaError::InvariantViolation(
            "duplicate participant id".to_string(),
        ));
    }

    order.shuffle(rng);
    let n = order.len();
    Ok((0..n)
        .map(|i| Assignment::new(order[i].clone(), order[(i + 1) % n].clone()))
        .collect())
}
