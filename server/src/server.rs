use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use sweeper_core::{
    decode, encode, FieldSnapshot, HighscoreEntry, MineField, RegistrySnapshot,
    FIELD_SNAPSHOT_VERSION, REGISTRY_SNAPSHOT_VERSION,
};
use thiserror::Error;
use tokio::sync::{watch, RwLock};

use crate::persist;
use crate::player::Player;

pub const FIELD_FILE: &str = "minefield.bin";
pub const REGISTRY_FILE: &str = "server.bin";

pub const NUM_HIGHSCORES: usize = 20;
pub const ANON_NAME: &str = "Etaoin Shrdlu";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("can't gather entropy for a fresh field seed: {0}")]
    Entropy(getrandom::Error),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub density: u32,
}

/// The player map and the per-session update signals, guarded by one lock.
/// This is the first lock of the hierarchy; the field lock and the player
/// locks come after it.
pub(crate) struct Registry {
    pub(crate) players: HashMap<String, Arc<Player>>,
    signals: HashMap<u64, watch::Sender<()>>,
    next_signal: u64,
}

/// The one process-wide server value: the shared field plus the registry.
/// Sessions receive it behind an `Arc`; players never point back at it.
pub struct Server {
    field: RwLock<MineField>,
    pub(crate) registry: RwLock<Registry>,
    field_path: PathBuf,
    registry_path: PathBuf,
}

impl Server {
    /// Restores the field and the registry from their snapshot files, or
    /// starts fresh where a file is missing or corrupt. Only a failure to
    /// gather entropy for a brand-new field is fatal.
    pub fn open(config: &ServerConfig) -> Result<Arc<Self>, ServerError> {
        let field_path = config.data_dir.join(FIELD_FILE);
        let registry_path = config.data_dir.join(REGISTRY_FILE);

        let field = match load_field(&field_path) {
            Some(field) => field,
            None => fresh_field(config.density)?,
        };
        let players = load_registry(&registry_path);
        info!(
            "field ready, density {}, {} cells uncovered, {} players known",
            field.density(),
            field.uncovered().len(),
            players.len()
        );

        Ok(Arc::new(Self {
            field: RwLock::new(field),
            registry: RwLock::new(Registry {
                players,
                signals: HashMap::new(),
                next_signal: 0,
            }),
            field_path,
            registry_path,
        }))
    }

    pub fn field(&self) -> &RwLock<MineField> {
        &self.field
    }

    /// Returns the player registered under `id`, creating it on first sight.
    /// Entries are kept across disconnects so scores survive reconnection.
    pub async fn get_or_create_player(&self, id: &str) -> Arc<Player> {
        let mut registry = self.registry.write().await;
        if let Some(player) = registry.players.get(id) {
            info!("player {id} reconnected");
            return player.clone();
        }
        info!("player {id} connected for the first time");
        let player = Arc::new(Player::new(id));
        registry.players.insert(id.to_string(), player.clone());
        player
    }

    /// Registers a fresh update signal and returns its handle plus the
    /// receiving end for the session's sender task.
    pub async fn subscribe(&self) -> (u64, watch::Receiver<()>) {
        let (tx, rx) = watch::channel(());
        let mut registry = self.registry.write().await;
        let id = registry.next_signal;
        registry.next_signal += 1;
        registry.signals.insert(id, tx);
        (id, rx)
    }

    /// Removes the signal; dropping the sender closes the channel, which
    /// terminates the subscribed sender task.
    pub async fn unsubscribe(&self, id: u64) {
        self.registry.write().await.signals.remove(&id);
    }

    /// Deposits one pulse into a single session's signal. Used for viewport
    /// moves, which nobody else needs to see.
    pub async fn pulse(&self, id: u64) {
        let registry = self.registry.read().await;
        if let Some(signal) = registry.signals.get(&id) {
            signal.send_replace(());
        }
    }

    /// Deposits one pulse into every subscribed signal. `send_replace` on a
    /// watch channel never waits, so a stuck consumer cannot slow anyone
    /// down; it just sees the latest pulse when it catches up.
    pub async fn broadcast(&self) {
        let registry = self.registry.read().await;
        for signal in registry.signals.values() {
            signal.send_replace(());
        }
    }

    pub async fn highscores(&self) -> Vec<HighscoreEntry> {
        let mut scores = {
            let registry = self.registry.read().await;
            let mut scores = Vec::with_capacity(registry.players.len());
            for player in registry.players.values() {
                let name = player.name().await;
                scores.push(HighscoreEntry {
                    name: if name.is_empty() {
                        ANON_NAME.to_string()
                    } else {
                        name
                    },
                    score: player.score(),
                });
            }
            scores
        };
        scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        scores.truncate(NUM_HIGHSCORES);
        scores
    }

    /// Writes the field snapshot. The field lock is released before any file
    /// I/O happens.
    pub async fn persist_field(&self) -> std::io::Result<()> {
        let snapshot = { self.field.read().await.to_snapshot() };
        let bytes = match encode(&snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("can't encode field snapshot: {err}, skipping write");
                return Ok(());
            }
        };
        persist::write_atomic(&self.field_path, &bytes).await
    }

    /// Writes the registry snapshot. Same locking rule as `persist_field`.
    pub async fn persist_registry(&self) -> std::io::Result<()> {
        let snapshot = {
            let registry = self.registry.read().await;
            let mut players = Vec::with_capacity(registry.players.len());
            for player in registry.players.values() {
                players.push(player.to_record().await);
            }
            RegistrySnapshot {
                version: REGISTRY_SNAPSHOT_VERSION,
                players,
            }
        };
        let bytes = match encode(&snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("can't encode registry snapshot: {err}, skipping write");
                return Ok(());
            }
        };
        persist::write_atomic(&self.registry_path, &bytes).await
    }
}

fn fresh_field(density: u32) -> Result<MineField, ServerError> {
    let mut seed = [0u8; 16];
    getrandom::fill(&mut seed).map_err(ServerError::Entropy)?;
    Ok(MineField::new(seed, density))
}

fn load_field(path: &Path) -> Option<MineField> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                "can't read field snapshot {}: {err}, starting a fresh field",
                path.display()
            );
            return None;
        }
    };
    let snapshot = match decode::<FieldSnapshot>(&bytes) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(
                "field snapshot {} is corrupt: {err}, starting a fresh field",
                path.display()
            );
            return None;
        }
    };
    if snapshot.version != FIELD_SNAPSHOT_VERSION {
        warn!(
            "field snapshot {} has unsupported version {}, starting a fresh field",
            path.display(),
            snapshot.version
        );
        return None;
    }
    Some(MineField::from_snapshot(snapshot))
}

fn load_registry(path: &Path) -> HashMap<String, Arc<Player>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                "can't read registry snapshot {}: {err}, starting with no players",
                path.display()
            );
            return HashMap::new();
        }
    };
    let snapshot = match decode::<RegistrySnapshot>(&bytes) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(
                "registry snapshot {} is corrupt: {err}, starting with no players",
                path.display()
            );
            return HashMap::new();
        }
    };
    if snapshot.version != REGISTRY_SNAPSHOT_VERSION {
        warn!(
            "registry snapshot {} has unsupported version {}, starting with no players",
            path.display(),
            snapshot.version
        );
        return HashMap::new();
    }
    snapshot
        .players
        .into_iter()
        .map(|record| (record.id.clone(), Arc::new(Player::from_record(record))))
        .collect()
}
