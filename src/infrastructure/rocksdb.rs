use crate::domain::game::{Game, GameId};
use crate::domain::ports::GameStore;
use crate::error::{Result, SantaError};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding one JSON document per game.
pub const CF_GAMES: &str = "games";

/// A persistent game store backed by RocksDB.
///
/// Games are stored as JSON keyed by game id. RocksDB has no conditional put,
/// so read-compare-write sequences are serialized through `write_lock`; this
/// makes `save` a compare-and-swap for every handle sharing the same instance.
///
/// `Clone` shares the underlying `Arc<DB>` and the lock.
#[derive(Clone)]
pub struct RocksDbGameStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbGameStore {
    /// Opens or creates a RocksDB instance at `path`, creating the games column
    /// family if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_games = ColumnFamilyDescriptor::new(CF_GAMES, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_games])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn games(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_GAMES).ok_or_else(|| {
            SantaError::IoError(std::io::Error::other("Games column family not found"))
        })
    }

    fn read(&self, id: &GameId) -> Result<Option<Game>> {
        let cf = self.games()?;
        match self.db.get_cf(cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, game: &Game) -> Result<()> {
        let cf = self.games()?;
        let value = serde_json::to_vec(game)?;
        self.db.put_cf(cf, game.id.as_str().as_bytes(), value)?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for RocksDbGameStore {
    async fn insert(&self, mut game: Game) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(&game.id)?.is_some() {
            return Err(SantaError::GameAlreadyExists(game.id));
        }
        game.version = 0;
        self.write(&game)
    }

    async fn get(&self, id: &GameId) -> Result<Option<Game>> {
        self.read(id)
    }

    async fn save(&self, mut game: Game, expected_version: u64) -> Result<Game> {
        let _guard = self.write_lock.lock().await;
        let current = self
            .read(&game.id)?
            .ok_or_else(|| SantaError::GameNotFound(game.id.clone()))?;
        if current.version != expected_version {
            return Err(SantaError::VersionMismatch {
                game: game.id,
                expected: expected_version,
                actual: current.version,
            });
        }
        game.version = expected_version + 1;
        self.write(&game)?;
        Ok(game)
    }
}
