use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use uuid::Uuid;

use crate::admin;
use crate::server::Server;
use crate::session;

pub const ID_COOKIE: &str = "sweeperID";
pub const ADMIN_PATH: &str = "/admin";

/// Accepts connections forever. Each one is upgraded to a websocket and
/// routed by request path: `/admin` gets the read-only admin session,
/// everything else a player session keyed by the `sweeperID` cookie.
pub async fn serve(server: Arc<Server>, listener: TcpListener, admins_path: PathBuf) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!("can't accept connection: {err}");
                continue;
            }
        };
        let server = server.clone();
        let admins_path = admins_path.clone();
        tokio::spawn(async move {
            handle_connection(server, stream, &admins_path, peer.to_string()).await;
        });
    }
}

async fn handle_connection(server: Arc<Server>, stream: TcpStream, admins_path: &Path, peer: String) {
    let mut path = String::new();
    let mut cookie_id = None;
    let callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        path = req.uri().path().to_string();
        cookie_id = cookie_value(req, ID_COOKIE);
        Ok(response)
    };
    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!("can't upgrade connection from {peer}: {err}");
            return;
        }
    };

    if path == ADMIN_PATH {
        info!("admin session from {peer}");
        admin::run(server, ws, admins_path).await;
        return;
    }

    let player_id = match cookie_id {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            info!("no {ID_COOKIE} cookie from {peer}, using session id {id}");
            id
        }
    };
    let player = server.get_or_create_player(&player_id).await;
    session::run(server, player, ws).await;
}

fn cookie_value(req: &Request, name: &str) -> Option<String> {
    for header in req.headers().get_all("Cookie") {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            if parts.next() == Some(name) {
                return parts.next().map(|value| value.to_string());
            }
        }
    }
    None
}
