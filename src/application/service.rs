use crate::config::EngineConfig;
use crate::domain::assignment::{Assignment, check_assignments, receiver_of};
use crate::domain::engine;
use crate::domain::game::{Game, GameId, ReassignmentRequest};
use crate::domain::participant::{Participant, ParticipantId, normalize_name};
use crate::domain::ports::{GameStoreBox, IdGeneratorBox, Notification, NotifierBox};
use crate::error::{Result, SantaError};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};

/// Input for a participant that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub email: Option<String>,
}

impl NewParticipant {
    pub fn new(name: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            name: name.into(),
            email: email.map(str::to_string),
        }
    }
}

/// What a participant sees about their own assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentView {
    pub receiver_id: ParticipantId,
    pub receiver_name: String,
    pub receiver_wish: Option<String>,
}

/// One row of the organizer's export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRecord {
    pub giver_id: ParticipantId,
    pub giver_name: String,
    pub giver_email: Option<String>,
    pub giver_token: String,
    pub receiver_name: String,
    pub confirmed: bool,
}

/// The request-handling layer around the assignment engine.
///
/// Each operation locates the game, authorizes the caller, runs the pure
/// engine on a snapshot and writes the result back with a compare-and-swap
/// on the game version. Losing a race reloads and retries, so two concurrent
/// requests never both apply to the same snapshot.
pub struct SantaService {
    store: GameStoreBox,
    notifier: NotifierBox,
    ids: IdGeneratorBox,
    rng: Mutex<StdRng>,
    config: EngineConfig,
}

impl SantaService {
    /// Creates a service with an entropy-seeded random source and default config.
    pub fn new(store: GameStoreBox, notifier: NotifierBox, ids: IdGeneratorBox) -> Self {
        Self {
            store,
            notifier,
            ids,
            rng: Mutex::new(StdRng::from_entropy()),
            config: EngineConfig::default(),
        }
    }

    /// Replaces the random source, e.g. with a seeded one for reproducible draws.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a game with a fresh cyclic assignment.
    pub async fn create_game(
        &self,
        name: &str,
        participants: Vec<NewParticipant>,
        allow_reassignment: bool,
    ) -> Result<Game> {
        let name = normalize_name(name)
            .map_err(|_| SantaError::ValidationError("Game name must not be empty".to_string()))?;

        let mut roster: Vec<Participant> = Vec::with_capacity(participants.len());
        for candidate in &participants {
            engine::ensure_unique(&roster, &candidate.name, candidate.email.as_deref(), None)?;
            roster.push(self.new_participant(candidate)?);
        }

        let assignments = {
            let mut rng = self.lock_rng();
            engine::generate(&roster, &mut *rng)?
        };

        let game = Game {
            id: GameId::new(self.ids.next_id()),
            name,
            organizer_token: self.ids.next_id(),
            allow_reassignment,
            participants: roster,
            assignments,
            reassignment_requests: Vec::new(),
            created_at: Utc::now(),
            version: 0,
        };
        self.store.insert(game.clone()).await?;
        info!(game = %game.id, participants = game.participants.len(), "Game created");

        self.dispatch(Notification::GameCreated {
            game: game.id.clone(),
        })
        .await;
        Ok(game)
    }

    /// Full snapshot of a game, organizer only.
    pub async fn game(&self, game_id: &GameId, organizer_token: &str) -> Result<Game> {
        let game = self.load(game_id).await?;
        game.authorize_organizer(organizer_token)?;
        Ok(game)
    }

    pub async fn add_participant(
        &self,
        game_id: &GameId,
        organizer_token: &str,
        participant: NewParticipant,
    ) -> Result<Game> {
        let participant = self.new_participant(&participant)?;
        let (before, after) = self
            .mutate(game_id, |game, rng| {
                game.authorize_organizer(organizer_token)?;
                engine::add_participant(game, participant.clone(), rng)
            })
            .await?;
        info!(game = %game_id, participant = %participant.id, "Participant added");

        self.notify_changed(&before, &after).await;
        Ok(after)
    }

    pub async fn remove_participant(
        &self,
        game_id: &GameId,
        organizer_token: &str,
        participant_id: &ParticipantId,
    ) -> Result<Game> {
        let (before, after) = self
            .mutate(game_id, |game, rng| {
                game.authorize_organizer(organizer_token)?;
                engine::remove_participant(game, participant_id, rng)
            })
            .await?;
        info!(game = %game_id, participant = %participant_id, "Participant removed");

        self.dispatch(Notification::ParticipantRemoved {
            game: game_id.clone(),
            participant: participant_id.clone(),
        })
        .await;
        self.notify_changed(&before, &after).await;
        Ok(after)
    }

    pub async fn update_participant(
        &self,
        game_id: &GameId,
        organizer_token: &str,
        participant_id: &ParticipantId,
        participant: NewParticipant,
    ) -> Result<Game> {
        let (_, after) = self
            .mutate(game_id, |game, _| {
                game.authorize_organizer(organizer_token)?;
                engine::update_participant(
                    game,
                    participant_id,
                    &participant.name,
                    participant.email.as_deref(),
                )
            })
            .await?;
        Ok(after)
    }

    pub async fn set_allow_reassignment(
        &self,
        game_id: &GameId,
        organizer_token: &str,
        allow: bool,
    ) -> Result<Game> {
        let (_, after) = self
            .mutate(game_id, |game, _| {
                game.authorize_organizer(organizer_token)?;
                let mut next = game.clone();
                next.allow_reassignment = allow;
                if !allow {
                    next.clear_requests();
                }
                Ok(next)
            })
            .await?;
        Ok(after)
    }

    pub async fn view_assignment(
        &self,
        game_id: &GameId,
        participant_id: &ParticipantId,
        token: &str,
    ) -> Result<AssignmentView> {
        let game = self.load(game_id).await?;
        game.authorize_participant(participant_id, token)?;

        let receiver_id = receiver_of(&game.assignments, participant_id).ok_or_else(|| {
            SantaError::InvariantViolation(format!("{} has no assignment", participant_id))
        })?;
        let receiver = game.require_participant(receiver_id)?;
        Ok(AssignmentView {
            receiver_id: receiver.id.clone(),
            receiver_name: receiver.name.clone(),
            receiver_wish: receiver.wish.clone(),
        })
    }

    pub async fn confirm_assignment(
        &self,
        game_id: &GameId,
        participant_id: &ParticipantId,
        token: &str,
    ) -> Result<Game> {
        let (_, after) = self
            .mutate(game_id, |game, _| {
                game.authorize_participant(participant_id, token)?;
                let mut next = game.clone();
                next.require_participant_mut(participant_id)?
                    .has_confirmed_assignment = true;
                Ok(next)
            })
            .await?;
        info!(game = %game_id, participant = %participant_id, "Assignment confirmed");
        Ok(after)
    }

    /// Stores a wish for the participant's giver to see; blank clears it.
    pub async fn set_wish(
        &self,
        game_id: &GameId,
        participant_id: &ParticipantId,
        token: &str,
        wish: Option<&str>,
    ) -> Result<Game> {
        let wish = wish.map(str::trim).filter(|w| !w.is_empty());
        let (_, after) = self
            .mutate(game_id, |game, _| {
                game.authorize_participant(participant_id, token)?;
                let mut next = game.clone();
                next.require_participant_mut(participant_id)?.wish = wish.map(str::to_string);
                Ok(next)
            })
            .await?;
        Ok(after)
    }

    pub async fn request_reassignment(
        &self,
        game_id: &GameId,
        participant_id: &ParticipantId,
        token: &str,
    ) -> Result<Game> {
        let (_, after) = self
            .mutate(game_id, |game, _| {
                let participant = game.authorize_participant(participant_id, token)?;
                if !game.allow_reassignment {
                    return Err(SantaError::ReassignmentDisabled);
                }
                if participant.has_pending_reassignment_request
                    || game.pending_request(participant_id).is_some()
                {
                    return Err(SantaError::RequestAlreadyPending(participant_id.clone()));
                }

                let request = ReassignmentRequest {
                    participant_id: participant_id.clone(),
                    participant_name: participant.name.clone(),
                    requested_at: Utc::now(),
                };
                let mut next = game.clone();
                next.reassignment_requests.push(request);
                next.require_participant_mut(participant_id)?
                    .has_pending_reassignment_request = true;
                Ok(next)
            })
            .await?;
        info!(game = %game_id, participant = %participant_id, "Reassignment requested");

        self.dispatch(Notification::ReassignmentRequested {
            game: game_id.clone(),
            participant: participant_id.clone(),
        })
        .await;
        Ok(after)
    }

    pub async fn cancel_reassignment_request(
        &self,
        game_id: &GameId,
        participant_id: &ParticipantId,
        token: &str,
    ) -> Result<Game> {
        let (_, after) = self
            .mutate(game_id, |game, _| {
                game.authorize_participant(participant_id, token)?;
                if game.pending_request(participant_id).is_none() {
                    return Err(SantaError::NoPendingRequest(participant_id.clone()));
                }
                let mut next = game.clone();
                next.clear_request(participant_id);
                Ok(next)
            })
            .await?;
        Ok(after)
    }

    /// Pending requests, oldest first.
    pub async fn pending_requests(
        &self,
        game_id: &GameId,
        organizer_token: &str,
    ) -> Result<Vec<ReassignmentRequest>> {
        let game = self.game(game_id, organizer_token).await?;
        let mut requests = game.reassignment_requests;
        requests.sort_by_key(|r| r.requested_at);
        Ok(requests)
    }

    /// Grants a pending request by swapping receivers with another giver.
    ///
    /// Both sides lose their confirmation since their receivers changed. When
    /// no swap is possible the game is left as it was and the request stays
    /// pending.
    pub async fn approve_reassignment(
        &self,
        game_id: &GameId,
        organizer_token: &str,
        participant_id: &ParticipantId,
    ) -> Result<Game> {
        let (before, after) = self
            .mutate(game_id, |game, rng| {
                game.authorize_organizer(organizer_token)?;
                game.require_participant(participant_id)?;
                if game.pending_request(participant_id).is_none() {
                    return Err(SantaError::NoPendingRequest(participant_id.clone()));
                }

                let outcome = engine::reassign_one(
                    participant_id,
                    &game.assignments,
                    &game.participants,
                    rng,
                )?;
                let mut next = game.clone();
                next.assignments = outcome.assignments;
                next.require_participant_mut(participant_id)?
                    .has_confirmed_assignment = false;
                if let Some(partner) = &outcome.partner {
                    next.require_participant_mut(partner)?
                        .has_confirmed_assignment = false;
                }
                next.clear_request(participant_id);
                Ok(next)
            })
            .await?;
        info!(game = %game_id, participant = %participant_id, "Reassignment approved");

        self.notify_changed(&before, &after).await;
        Ok(after)
    }

    /// Reassigns every unconfirmed participant, see [`engine::reassign_all`].
    pub async fn reassign_all(&self, game_id: &GameId, organizer_token: &str) -> Result<Game> {
        let attempts = self.config.reassign_attempts;
        let (before, after) = self
            .mutate(game_id, |game, rng| {
                game.authorize_organizer(organizer_token)?;
                engine::reassign_all(game, rng, attempts)
            })
            .await?;
        info!(game = %game_id, confirmed = after.confirmed_count(), "All participants reassigned");

        self.notify_changed(&before, &after).await;
        Ok(after)
    }

    /// Rows for the organizer's export, in participant order.
    pub async fn export_assignments(
        &self,
        game_id: &GameId,
        organizer_token: &str,
    ) -> Result<Vec<AssignmentRecord>> {
        let game = self.game(game_id, organizer_token).await?;
        game.participants
            .iter()
            .map(|giver| -> Result<AssignmentRecord> {
                let receiver_id = receiver_of(&game.assignments, &giver.id).ok_or_else(|| {
                    SantaError::InvariantViolation(format!("{} has no assignment", giver.id))
                })?;
                Ok(AssignmentRecord {
                    giver_id: giver.id.clone(),
                    giver_name: giver.name.clone(),
                    giver_email: giver.email.clone(),
                    giver_token: giver.token.clone(),
                    receiver_name: game.require_participant(receiver_id)?.name.clone(),
                    confirmed: giver.has_confirmed_assignment,
                })
            })
            .collect()
    }

    async fn load(&self, game_id: &GameId) -> Result<Game> {
        self.store
            .get(game_id)
            .await?
            .ok_or_else(|| SantaError::GameNotFound(game_id.clone()))
    }

    /// Read-modify-write with optimistic concurrency.
    ///
    /// `apply` runs on a fresh snapshot each attempt and must be free of side
    /// effects. Its result is checked against the assignment invariants before
    /// it is written. Returns the snapshot it was applied to and the saved game.
    async fn mutate<F>(&self, game_id: &GameId, apply: F) -> Result<(Game, Game)>
    where
        F: Fn(&Game, &mut StdRng) -> Result<Game> + Send + Sync,
    {
        let attempts = self.config.conflict_retries + 1;
        for attempt in 1..=attempts {
            let current = self.load(game_id).await?;
            let next = {
                let mut rng = self.lock_rng();
                apply(&current, &mut *rng)?
            };
            check_assignments(&next.participants, &next.assignments)?;

            match self.store.save(next, current.version).await {
                Ok(saved) => return Ok((current, saved)),
                Err(SantaError::VersionMismatch {
                    expected, actual, ..
                }) => {
                    warn!(game = %game_id, attempt, expected, actual, "Concurrent update, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(SantaError::Conflict {
            game: game_id.clone(),
            attempts,
        })
    }

    fn new_participant(&self, participant: &NewParticipant) -> Result<Participant> {
        Participant::new(
            ParticipantId::new(self.ids.next_id()),
            &participant.name,
            participant.email.as_deref(),
            self.ids.next_id(),
        )
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn notify_changed(&self, before: &Game, after: &Game) {
        let participants = changed_givers(&before.assignments, &after.assignments);
        if participants.is_empty() {
            return;
        }
        self.dispatch(Notification::AssignmentsChanged {
            game: after.id.clone(),
            participants,
        })
        .await;
    }

    /// Notification is fire-and-forget: a failure never undoes a saved mutation.
    async fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %e, "Failed to deliver notification");
        }
    }
}

/// Givers whose receiver differs between `before` and `after`, including
/// givers that only exist in `after`.
fn changed_givers(before: &[Assignment], after: &[Assignment]) -> Vec<ParticipantId> {
    after
        .iter()
        .filter(|a| receiver_of(before, &a.giver_id) != Some(&a.receiver_id))
        .map(|a| a.giver_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ids::UuidGenerator;
    use crate::infrastructure::in_memory::InMemoryGameStore;
    use crate::infrastructure::notifier::InMemoryNotifier;

    fn service() -> (SantaService, InMemoryNotifier) {
        let notifier = InMemoryNotifier::new();
        let service = SantaService::new(
            Box::new(InMemoryGameStore::new()),
            Box::new(notifier.clone()),
            Box::new(UuidGenerator),
        )
        .with_rng(StdRng::seed_from_u64(17));
        (service, notifier)
    }

    fn roster(names: &[&str]) -> Vec<NewParticipant> {
        names.iter().map(|n| NewParticipant::new(*n, None)).collect()
    }

    fn id_of(game: &Game, name: &str) -> ParticipantId {
        game.participants
            .iter()
            .find(|p| p.has_name(name))
            .unwrap()
            .id
            .clone()
    }

    #[tokio::test]
    async fn test_create_game_validates_roster() {
        let (service, _) = service();
        assert!(matches!(
            service.create_game("Office", roster(&["Alice", "Bob"]), true).await,
            Err(SantaError::InsufficientParticipants { count: 2 })
        ));
        assert!(matches!(
            service
                .create_game("Office", roster(&["Alice", "Bob", "alice"]), true)
                .await,
            Err(SantaError::DuplicateName(_))
        ));
        assert!(matches!(
            service.create_game("  ", roster(&["A", "B", "C"]), true).await,
            Err(SantaError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_mutations_bump_version_and_notify() {
        let (service, notifier) = service();
        let game = service
            .create_game("Office", roster(&["Alice", "Bob", "Charlie"]), true)
            .await
            .unwrap();
        assert_eq!(game.version, 0);

        let after = service
            .add_participant(&game.id, &game.organizer_token, NewParticipant::new("Dave", None))
            .await
            .unwrap();
        assert_eq!(after.version, 1);
        assert_eq!(after.participants.len(), 4);

        let sent = notifier.sent().await;
        assert_eq!(sent[0], Notification::GameCreated { game: game.id.clone() });
        assert!(matches!(
            &sent[1],
            Notification::AssignmentsChanged { participants, .. } if participants.contains(&id_of(&after, "Dave"))
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_calls_do_not_mutate() {
        let (service, _) = service();
        let game = service
            .create_game("Office", roster(&["Alice", "Bob", "Charlie", "Dave"]), true)
            .await
            .unwrap();
        let alice = game.participant(&id_of(&game, "Alice")).unwrap().clone();

        assert!(matches!(
            service.reassign_all(&game.id, &alice.token).await,
            Err(SantaError::Unauthorized)
        ));
        assert!(matches!(
            service.confirm_assignment(&game.id, &alice.id, "wrong").await,
            Err(SantaError::Unauthorized)
        ));
        let stored = service.game(&game.id, &game.organizer_token).await.unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.assignments, game.assignments);
    }

    #[test]
    fn test_changed_givers() {
        let before = vec![
            Assignment::new("a".into(), "b".into()),
            Assignment::new("b".into(), "a".into()),
        ];
        let after = vec![
            Assignment::new("a".into(), "c".into()),
            Assignment::new("b".into(), "a".into()),
            Assignment::new("c".into(), "b".into()),
        ];
        assert_eq!(
            changed_givers(&before, &after),
            vec![ParticipantId::from("a"), ParticipantId::from("c")]
        );
    }
}
