use super::game::{Game, GameId};
use super::participant::ParticipantId;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for whole games.
///
/// `save` is a compare-and-swap: it only succeeds when the stored version
/// equals `expected_version`, and it stores the game with the version bumped.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn insert(&self, game: Game) -> Result<()>;
    async fn get(&self, id: &GameId) -> Result<Option<Game>>;
    async fn save(&self, game: Game, expected_version: u64) -> Result<Game>;
}

pub type GameStoreBox = Box<dyn GameStore>;

/// Something worth telling participants about after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    GameCreated { game: GameId },
    AssignmentsChanged { game: GameId, participants: Vec<ParticipantId> },
    ReassignmentRequested { game: GameId, participant: ParticipantId },
    ParticipantRemoved { game: GameId, participant: ParticipantId },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}

pub type NotifierBox = Box<dyn Notifier>;

/// Source of collision-resistant opaque ids and tokens.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

pub type IdGeneratorBox = Box<dyn IdGenerator>;
