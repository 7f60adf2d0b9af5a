use std::sync::atomic::{AtomicU64, Ordering};

use sweeper_core::{PlayerRecord, Point, Rect};
use tokio::sync::RwLock;

pub const VIEWPORT_WIDTH: i64 = 20;
pub const VIEWPORT_HEIGHT: i64 = 20;
pub const MAX_NAME_CHARS: usize = 32;

#[derive(Debug)]
struct PlayerInner {
    name: String,
    viewport: Rect,
}

/// Per-player state. Name and viewport sit behind the player lock, the last
/// lock of the hierarchy; the score is a plain atomic so uncover handling
/// never needs the lock at all.
#[derive(Debug)]
pub struct Player {
    id: String,
    inner: RwLock<PlayerInner>,
    score: AtomicU64,
}

impl Player {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            inner: RwLock::new(PlayerInner {
                name: String::new(),
                viewport: Rect::centered(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            }),
            score: AtomicU64::new(0),
        }
    }

    pub fn from_record(record: PlayerRecord) -> Self {
        Self {
            id: record.id,
            inner: RwLock::new(PlayerInner {
                name: record.name,
                viewport: record.viewport,
            }),
            score: AtomicU64::new(record.score),
        }
    }

    pub async fn to_record(&self) -> PlayerRecord {
        let inner = self.inner.read().await;
        PlayerRecord {
            id: self.id.clone(),
            name: inner.name.clone(),
            viewport: inner.viewport,
            score: self.score(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn name(&self) -> String {
        self.inner.read().await.name.clone()
    }

    pub async fn set_name(&self, name: &str) {
        let name = truncate_name(name);
        self.inner.write().await.name = name;
    }

    pub async fn shift_viewport(&self, dx: i64, dy: i64) {
        self.inner.write().await.viewport.shift(dx, dy);
    }

    /// Translates viewport-relative click coordinates into a world cell.
    pub async fn map_to_world(&self, x: i64, y: i64) -> Point {
        let inner = self.inner.read().await;
        Point::new(inner.viewport.min.x + x, inner.viewport.min.y + y)
    }

    /// Name and viewport in one read, for the sender task's snapshot.
    pub async fn view_state(&self) -> (String, Rect) {
        let inner = self.inner.read().await;
        (inner.name.clone(), inner.viewport)
    }

    pub fn add_score(&self, delta: u64) {
        self.score.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn reset_score(&self) {
        self.score.store(0, Ordering::Relaxed);
    }

    pub fn score(&self) -> u64 {
        self.score.load(Ordering::Relaxed)
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(MAX_NAME_CHARS).collect();
    truncated.push_str(" ...");
    truncated
}
