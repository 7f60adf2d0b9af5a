use std::path::Path;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::warn;
use serde::Deserialize;
use sweeper_core::{AdminRequest, PlayerListEntry};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::server::Server;

/// The admin allowlist file: `{ "Cookies": ["<id>", ...] }`. It is reloaded
/// on each query so edits take effect without a restart.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Admins {
    pub cookies: Vec<String>,
}

impl Admins {
    pub async fn load(path: &Path) -> Option<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("can't read admins file {}: {err}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(admins) => Some(admins),
            Err(err) => {
                warn!("can't decode admins file {}: {err}", path.display());
                None
            }
        }
    }

    pub fn allowed(&self, id: &str) -> bool {
        self.cookies.iter().any(|cookie| cookie == id)
    }
}

impl Server {
    /// Every known player as name/score pairs, ids omitted. Registry lock in
    /// shared mode, then per-player reads; the field lock is never touched.
    pub async fn admin_players(&self) -> Vec<PlayerListEntry> {
        let registry = self.registry.read().await;
        let mut players = Vec::with_capacity(registry.players.len());
        for player in registry.players.values() {
            players.push(PlayerListEntry {
                name: player.name().await,
                score: player.score(),
            });
        }
        players
    }

    /// The subset of players whose id is on the allowlist.
    pub async fn admin_admins(&self, admins: &Admins) -> Vec<PlayerListEntry> {
        let registry = self.registry.read().await;
        let mut players = Vec::new();
        for (id, player) in &registry.players {
            if !admins.allowed(id) {
                continue;
            }
            players.push(PlayerListEntry {
                name: player.name().await,
                score: player.score(),
            });
        }
        players
    }
}

/// Runs one admin session: each request message is answered with one JSON
/// array. An unknown request closes the session.
pub async fn run(server: Arc<Server>, ws: WebSocketStream<TcpStream>, admins_path: &Path) {
    let (mut sink, mut stream) = ws.split();
    while let Some(message) = stream.next().await {
        let Ok(message) = message else {
            return;
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return,
            _ => continue,
        };
        let req: AdminRequest = match serde_json::from_str(text.as_str()) {
            Ok(req) => req,
            Err(err) => {
                warn!("can't decode admin request: {err}");
                continue;
            }
        };
        let players = match req.request.as_str() {
            "get-players" => server.admin_players().await,
            "get-admins" => {
                let admins = Admins::load(admins_path).await.unwrap_or_default();
                server.admin_admins(&admins).await
            }
            other => {
                warn!("unknown admin request {other:?}, closing session");
                return;
            }
        };
        let text = match serde_json::to_string(&players) {
            Ok(text) => text,
            Err(err) => {
                warn!("can't encode admin reply: {err}");
                return;
            }
        };
        if sink.send(Message::text(text)).await.is_err() {
            return;
        }
    }
}
