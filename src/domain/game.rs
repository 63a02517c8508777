use super::assignment::Assignment;
use super::participant::{Participant, ParticipantId};
use crate::error::{Result, SantaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A giver's pending ask for a different receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentRequest {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub requested_at: DateTime<Utc>,
}

/// The unit of consistency: participants, assignments and pending requests
/// are always read and written together.
///
/// `version` is owned by the store and bumped on every successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub organizer_token: String,
    pub allow_reassignment: bool,
    pub participants: Vec<Participant>,
    pub assignments: Vec<Assignment>,
    pub reassignment_requests: Vec<ReassignmentRequest>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Game {
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.id == id)
    }

    pub fn require_participant(&self, id: &ParticipantId) -> Result<&Participant> {
        self.participant(id)
            .ok_or_else(|| SantaError::ParticipantNotFound(id.clone()))
    }

    pub fn require_participant_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant> {
        self.participant_mut(id)
            .ok_or_else(|| SantaError::ParticipantNotFound(id.clone()))
    }

    pub fn is_confirmed(&self, id: &ParticipantId) -> bool {
        self.participant(id)
            .is_some_and(|p| p.has_confirmed_assignment)
    }

    pub fn confirmed_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.has_confirmed_assignment)
            .count()
    }

    pub fn pending_request(&self, id: &ParticipantId) -> Option<&ReassignmentRequest> {
        self.reassignment_requests
            .iter()
            .find(|r| &r.participant_id == id)
    }

    /// Drops every pending request and the matching participant flags.
    pub fn clear_requests(&mut self) {
        self.reassignment_requests.clear();
        for p in &mut self.participants {
            p.has_pending_reassignment_request = false;
        }
    }

    /// Drops the pending request of a single participant, if any.
    pub fn clear_request(&mut self, id: &ParticipantId) {
        self.reassignment_requests.retain(|r| &r.participant_id != id);
        if let Some(p) = self.participant_mut(id) {
            p.has_pending_reassignment_request = false;
        }
    }

    pub fn clear_confirmations(&mut self) {
        for p in &mut self.participants {
            p.has_confirmed_assignment = false;
        }
    }

    pub fn authorize_organizer(&self, token: &str) -> Result<()> {
        if self.organizer_token == token {
            Ok(())
        } else {
            Err(SantaError::Unauthorized)
        }
    }

    pub fn authorize_participant(&self, id: &ParticipantId, token: &str) -> Result<&Participant> {
        let participant = self.require_participant(id)?;
        if participant.token == token {
            Ok(participant)
        } else {
            Err(SantaError::Unauthorized)
        }
    }
}
