// src/store.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::StorageConfig;
use crate::game_logic::Game;

/// Version written into every record. Records with any other version are refused.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Game {0} not found")]
    GameNotFound(String),
    #[error("Game {0} already exists")]
    AlreadyExists(String),
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed game record {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode game {id}: {source}")]
    Encode {
        id: String,
        source: serde_json::Error,
    },
    #[error("Game record {} has unsupported schema version {version}", .path.display())]
    UnsupportedSchema { path: PathBuf, version: u32 },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameRecordRef<'a> {
    schema_version: u32,
    game: &'a Game,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GameRecord {
    #[allow(dead_code)]
    schema_version: u32,
    game: Game,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    schema_version: u32,
}

fn decode_record(path: &Path, bytes: &[u8]) -> Result<Game, StoreError> {
    let decode_err = |source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let header: RecordHeader = serde_json::from_slice(bytes).map_err(decode_err)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            path: path.to_path_buf(),
            version: header.schema_version,
        });
    }
    let record: GameRecord = serde_json::from_slice(bytes).map_err(decode_err)?;
    Ok(record.game)
}

fn is_valid_game_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// One exclusive lock per game id. Unrelated games never contend.
#[derive(Debug, Default)]
pub struct GameLocks {
    entries: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GameLocks {
    /// Blocks until the lock for `game_id` is free. The lock is released when
    /// the returned guard is dropped.
    pub async fn acquire(&self, game_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self.entries.lock().await;
            // Entries nobody holds or waits on only have the map's reference.
            entries.retain(|_, lock| Arc::strong_count(lock) > 1);
            entries.entry(game_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// File-backed game records, one JSON document per game id.
#[derive(Debug)]
pub struct GameRepository {
    data_dir: PathBuf,
    locks: GameLocks,
}

impl GameRepository {
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let data_dir = PathBuf::from(&config.data_dir);
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| StoreError::Io {
                path: data_dir.clone(),
                source,
            })?;
        tracing::info!(store.dir = %data_dir.display(), "Game repository opened");
        Ok(Self {
            data_dir,
            locks: GameLocks::default(),
        })
    }

    fn path_for(&self, game_id: &str) -> Option<PathBuf> {
        is_valid_game_id(game_id).then(|| self.data_dir.join(format!("{game_id}.json")))
    }

    pub fn id_exists(&self, game_id: &str) -> bool {
        self.path_for(game_id).is_some_and(|path| path.exists())
    }

    /// Writes a brand new record. Fails with [`StoreError::AlreadyExists`]
    /// when the id is taken, even by a create racing on the same id.
    pub async fn create(&self, game: &Game) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(&game.id).await;
        let path = self
            .path_for(&game.id)
            .ok_or_else(|| StoreError::GameNotFound(game.id.clone()))?;
        let taken = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        if taken {
            return Err(StoreError::AlreadyExists(game.id.clone()));
        }
        self.save(game).await
    }

    /// Unlocked read. May observe the state just before a concurrent write
    /// lands, never a partial one.
    pub async fn find(&self, game_id: &str) -> Result<Option<Game>, StoreError> {
        let Some(path) = self.path_for(game_id) else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        decode_record(&path, &bytes).map(Some)
    }

    /// Writes the record to a temporary file and renames it over the old one.
    /// Callers hold the game's lock.
    async fn save(&self, game: &Game) -> Result<(), StoreError> {
        let path = self
            .path_for(&game.id)
            .ok_or_else(|| StoreError::GameNotFound(game.id.clone()))?;
        let bytes = serde_json::to_vec_pretty(&GameRecordRef {
            schema_version: SCHEMA_VERSION,
            game,
        })
        .map_err(|source| StoreError::Encode {
            id: game.id.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })?;
        Ok(())
    }

    /// Load, mutate and persist `game_id` while holding its lock.
    ///
    /// The record is only written when `mutate` succeeds and actually changed
    /// the game. `mutate` gets the game alone, never the repository, so it
    /// cannot take the lock again.
    pub async fn with_lock<T, E, F>(&self, game_id: &str, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut Game) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.locks.acquire(game_id).await;
        let mut game = self
            .find(game_id)
            .await?
            .ok_or_else(|| StoreError::GameNotFound(game_id.to_string()))?;
        let before = game.clone();
        let output = mutate(&mut game)?;
        if game != before {
            self.save(&game).await?;
        } else {
            tracing::trace!(game.id = %game_id, "Game unchanged, skipping write");
        }
        Ok(output)
    }
}
