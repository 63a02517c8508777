use crate::domain::game::{Game, GameId};
use crate::domain::ports::GameStore;
use crate::error::{Result, SantaError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for games.
///
/// Uses `Arc<RwLock<HashMap<GameId, Game>>>` so clones share the same data.
/// The version check and the write happen under one write lock, which makes
/// `save` an atomic compare-and-swap.
#[derive(Default, Clone)]
pub struct InMemoryGameStore {
    games: Arc<RwLock<HashMap<GameId, Game>>>,
}

impl InMemoryGameStore {
    /// Creates a new, empty in-memory game store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn insert(&self, mut game: Game) -> Result<()> {
        let mut games = self.games.write().await;
        if games.contains_key(&game.id) {
            return Err(SantaError::GameAlreadyExists(game.id));
        }
        game.version = 0;
        games.insert(game.id.clone(), game);
        Ok(())
    }

    async fn get(&self, id: &GameId) -> Result<Option<Game>> {
        let games = self.games.read().await;
        Ok(games.get(id).cloned())
    }

    async fn save(&self, mut game: Game, expected_version: u64) -> Result<Game> {
        let mut games = self.games.write().await;
        let current = games
            .get(&game.id)
            .ok_or_else(|| SantaError::GameNotFound(game.id.clone()))?;
        if current.version != expected_version {
            return Err(SantaError::VersionMismatch {
                game: game.id,
                expected: expected_version,
                actual: current.version,
            });
        }
        game.version = expected_version + 1;
        games.insert(game.id.clone(), game.clone());
        Ok(game)
    }
}
