use rkyv::{Archive, Deserialize, Serialize};

use crate::field::Mark;
use crate::grid::{Point, Rect};

pub const FIELD_SNAPSHOT_VERSION: u32 = 1;
pub const REGISTRY_SNAPSHOT_VERSION: u32 = 1;

/// Durable form of the minefield. Everything needed to reproduce the world:
/// the oracle inputs plus the three state maps, flattened to vectors.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub version: u32,
    pub seed: [u8; 16],
    pub density: u32,
    pub uncovered: Vec<(Point, u8)>,
    pub triggered: Vec<Point>,
    pub marks: Vec<(Point, Mark)>,
}

/// Durable form of one registry entry. Session-scoped collaborators (update
/// signals, server handles) are rebuilt on load, never stored.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub viewport: Rect,
    pub score: u64,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub version: u32,
    pub players: Vec<PlayerRecord>,
}
