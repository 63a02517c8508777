use super::generator::{MIN_PARTICIPANTS, generate};
use crate::domain::game::Game;
use crate::domain::participant::{Participant, ParticipantId, normalize_email, normalize_name};
use crate::error::{Result, SantaError};
use rand::Rng;

/// Checks that `name` and `email` are not taken by anyone in `existing`
/// other than `except`. Both comparisons ignore case.
pub fn ensure_unique(
    existing: &[Participant],
    name: &str,
    email: Option<&str>,
    except: Option<&ParticipantId>,
) -> Result<()> {
    let others = || existing.iter().filter(move |p| Some(&p.id) != except);

    if others().any(|p| p.has_name(name)) {
        return Err(SantaError::DuplicateName(name.trim().to_string()));
    }
    if let Some(email) = email
        && others().any(|p| p.has_email(email))
    {
        return Err(SantaError::DuplicateEmail(email.trim().to_string()));
    }
    Ok(())
}

/// Adds `participant` and regenerates every assignment.
///
/// A cycle cannot be extended in place while keeping its guarantees, so the
/// whole set is redrawn; confirmations and pending requests refer to the old
/// topology and are cleared.
pub fn add_participant<R: Rng + ?Sized>(
    game: &Game,
    participant: Participant,
    rng: &mut R,
) -> Result<Game> {
    ensure_unique(
        &game.participants,
        &participant.name,
        participant.email.as_deref(),
        None,
    )?;
    if game.participant(&participant.id).is_some() {
        return Err(SantaError::ValidationError(format!(
            "Participant id {} is already in use",
            participant.id
        )));
    }

    let mut next = game.clone();
    next.participants.push(participant);
    next.assignments = generate(&next.participants, rng)?;
    next.clear_confirmations();
    next.clear_requests();
    Ok(next)
}

/// Removes a participant and regenerates every assignment.
///
/// Fails with `MinimumParticipants` when fewer than three would remain.
/// Only the removed participant's pending request is dropped.
pub fn remove_participant<R: Rng + ?Sized>(
    game: &Game,
    id: &ParticipantId,
    rng: &mut R,
) -> Result<Game> {
    game.require_participant(id)?;
    let remaining = game.participants.len() - 1;
    if remaining < MIN_PARTICIPANTS {
        return Err(SantaError::MinimumParticipants { remaining });
    }

    let mut next = game.clone();
    next.clear_request(id);
    next.participants.retain(|p| &p.id != id);
    next.assignments = generate(&next.participants, rng)?;
    next.clear_confirmations();
    Ok(next)
}

/// Renames a participant and/or changes their email. Assignments are untouched.
pub fn update_participant(
    game: &Game,
    id: &ParticipantId,
    name: &str,
    email: Option<&str>,
) -> Result<Game> {
    game.require_participant(id)?;
    let name = normalize_name(name)?;
    let email = normalize_email(email)?;
    ensure_unique(&game.participants, &name, email.as_deref(), Some(id))?;

    let mut next = game.clone();
    let participant = next.require_participant_mut(id)?;
    participant.name = name.clone();
    participant.email = email;
    for request in next
        .reassignment_requests
        .iter_mut()
        .filter(|r| &r.participant_id == id)
    {
        request.participant_name = name.clone();
    }
    Ok(next)
}
