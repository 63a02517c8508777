use super::participant::{Participant, ParticipantId};
use crate::error::{Result, SantaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single giver -> receiver edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub giver_id: ParticipantId,
    pub receiver_id: ParticipantId,
}

impl Assignment {
    pub fn new(giver_id: ParticipantId, receiver_id: ParticipantId) -> Self {
        Self {
            giver_id,
            receiver_id,
        }
    }
}

/// Finds the receiver assigned to `giver`, if any.
pub fn receiver_of<'a>(assignments: &'a [Assignment], giver: &ParticipantId) -> Option<&'a ParticipantId> {
    assignments
        .iter()
        .find(|a| &a.giver_id == giver)
        .map(|a| &a.receiver_id)
}

/// Verifies that `assignments` is a fixed-point-free bijection over `participants`.
///
/// Every participant must appear exactly once as giver and exactly once as
/// receiver, nobody gives to themselves, and no edge references an unknown id.
pub fn check_assignments(participants: &[Participant], assignments: &[Assignment]) -> Result<()> {
    let ids: HashSet<&ParticipantId> = participants.iter().map(|p| &p.id).collect();
    if ids.len() != participants.len() {
        return Err(SantaError::InvariantViolation(
            "duplicate participant id".to_string(),
        ));
    }
    if assignments.len() != participants.len() {
        return Err(SantaError::InvariantViolation(format!(
            "{} assignments for {} participants",
            assignments.len(),
            participants.len()
        )));
    }

    let mut givers = HashSet::with_capacity(assignments.len());
    let mut receivers = HashSet::with_capacity(assignments.len());
    for a in assignments {
        if a.giver_id == a.receiver_id {
            return Err(SantaError::InvariantViolation(format!(
                "{} is assigned to themselves",
                a.giver_id
            )));
        }
        if !ids.contains(&a.giver_id) || !ids.contains(&a.receiver_id) {
            return Err(SantaError::InvariantViolation(format!(
                "assignment {} -> {} references an unknown participant",
                a.giver_id, a.receiver_id
            )));
        }
        if !givers.insert(&a.giver_id) {
            return Err(SantaError::InvariantViolation(format!(
                "{} gives more than once",
                a.giver_id
            )));
        }
        if !receivers.insert(&a.receiver_id) {
            return Err(SantaError::InvariantViolation(format!(
                "{} receives more than once",
                a.receiver_id
            )));
        }
    }
    Ok(())
}
