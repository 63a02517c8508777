use crate::domain::game::GameId;
use crate::domain::participant::ParticipantId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SantaError {
    #[error("At least 3 participants are required, got {count}")]
    InsufficientParticipants { count: usize },
    #[error("No valid swap partner for participant {participant}")]
    NoValidSwap { participant: ParticipantId },
    #[error("A participant named '{0}' already exists")]
    DuplicateName(String),
    #[error("A participant with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("Removal would leave {remaining} participants, at least 3 are required")]
    MinimumParticipants { remaining: usize },
    #[error("Participant {0} not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Game {0} not found")]
    GameNotFound(GameId),
    #[error("Game {0} already exists")]
    GameAlreadyExists(GameId),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Reassignment is not allowed in this game")]
    ReassignmentDisabled,
    #[error("Participant {0} already has a pending reassignment request")]
    RequestAlreadyPending(ParticipantId),
    #[error("Participant {0} has no pending reassignment request")]
    NoPendingRequest(ParticipantId),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Assignment invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Game {game} is at version {actual}, expected {expected}")]
    VersionMismatch {
        game: GameId,
        expected: u64,
        actual: u64,
    },
    #[error("Concurrent modification of game {game} (gave up after {attempts} attempts)")]
    Conflict { game: GameId, attempts: usize },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
}

impl SantaError {
    /// Errors caused by the caller's input or the current game state, as opposed to
    /// storage or IO failures. These never leave a partially written game behind.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SantaError::InvariantViolation(_)
                | SantaError::CsvError(_)
                | SantaError::IoError(_)
                | SantaError::SerializationError(_)
        ) && !self.is_storage()
    }

    #[cfg(feature = "storage-rocksdb")]
    fn is_storage(&self) -> bool {
        matches!(self, SantaError::StorageError(_))
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    fn is_storage(&self) -> bool {
        false
    }
}

pub type Result<T> = std::result::Result<T, SantaError>;
