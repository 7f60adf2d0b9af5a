use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use sweeper_core::{ClientRequest, StateUpdate, UncoverOutcome};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::player::Player;
use crate::rate::TokenBucket;
use crate::server::Server;

/// Outbound state updates per second, and how many may go out back to back.
pub const UPDATE_RATE: f64 = 3.0;
pub const UPDATE_BURST: f64 = 5.0;

type WsStream = WebSocketStream<TcpStream>;

/// Runs one player session to completion: a sender task drains the update
/// signal while this task processes requests in arrival order. On any
/// transport error the signal is unsubscribed and closed, which ends the
/// sender; the player entry stays in the registry for reconnection.
pub async fn run(server: Arc<Server>, player: Arc<Player>, ws: WsStream) {
    let (sink, stream) = ws.split();
    let (signal_id, signal) = server.subscribe().await;
    let sender = tokio::spawn(send_updates(
        server.clone(),
        player.clone(),
        sink,
        signal,
    ));
    // the client gets its first state update without asking
    server.pulse(signal_id).await;

    receive_requests(&server, &player, stream, signal_id).await;

    server.unsubscribe(signal_id).await;
    let _ = sender.await;
    info!("player {} disconnected", player.id());
}

async fn send_updates(
    server: Arc<Server>,
    player: Arc<Player>,
    mut sink: SplitSink<WsStream, Message>,
    mut signal: watch::Receiver<()>,
) {
    let mut limiter = TokenBucket::new(UPDATE_RATE, UPDATE_BURST);
    while signal.changed().await.is_ok() {
        if !limiter.allow() {
            // the pulse is dropped; the next permitted one re-reads the
            // latest state anyway
            debug!("rate limit exceeded, skipping update");
            continue;
        }
        let update = compose_update(&server, &player).await;
        let text = match serde_json::to_string(&update) {
            Ok(text) => text,
            Err(err) => {
                warn!("can't encode state update: {err}");
                continue;
            }
        };
        if let Err(err) = sink.send(Message::text(text)).await {
            warn!("can't write state update for {}: {err}", player.id());
            return;
        }
    }
}

/// Captures one consistent state update. Each lock is taken in shared mode
/// and released before the next is acquired; nothing is held across the
/// actual network write.
async fn compose_update(server: &Server, player: &Player) -> StateUpdate {
    let (name, viewport) = player.view_state().await;
    let view_port = { server.field().read().await.extract_view(viewport) };
    let highscores = server.highscores().await;
    StateUpdate {
        score: player.score(),
        name,
        view_port,
        highscores,
    }
}

async fn receive_requests(
    server: &Arc<Server>,
    player: &Arc<Player>,
    mut stream: SplitStream<WsStream>,
    signal_id: u64,
) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                warn!("transport error for player {}: {err}", player.id());
                return;
            }
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return,
            _ => continue,
        };
        let req: ClientRequest = match serde_json::from_str(text.as_str()) {
            Ok(req) => req,
            Err(err) => {
                warn!("can't decode client request: {err}");
                continue;
            }
        };
        if !dispatch(server, player, signal_id, req).await {
            return;
        }
    }
}

/// Handles one request. Returns false when the session must close.
async fn dispatch(
    server: &Arc<Server>,
    player: &Arc<Player>,
    signal_id: u64,
    req: ClientRequest,
) -> bool {
    match req.kind.as_str() {
        "move" => {
            player.shift_viewport(req.x, req.y).await;
            // only this session's view changed
            server.pulse(signal_id).await;
            if let Err(err) = server.persist_registry().await {
                warn!("can't persist player registry: {err}");
            }
        }
        "uncover" => {
            let point = player.map_to_world(req.x, req.y).await;
            let (outcome, count) = { server.field().write().await.uncover(point) };
            match outcome {
                UncoverOutcome::Miss => player.add_score(count),
                UncoverOutcome::Boom => {
                    info!("BOOM at {point}, player {} resets", player.id());
                    player.reset_score();
                }
            }
            if let Err(err) = server.persist_field().await {
                warn!("can't persist minefield: {err}");
            }
            if let Err(err) = server.persist_registry().await {
                warn!("can't persist player registry: {err}");
            }
            server.broadcast().await;
        }
        "mark" => {
            let point = player.map_to_world(req.x, req.y).await;
            {
                server.field().write().await.mark(point);
            }
            if let Err(err) = server.persist_field().await {
                warn!("can't persist minefield: {err}");
            }
            server.broadcast().await;
        }
        "update-name" => {
            player.set_name(&req.name).await;
            if let Err(err) = server.persist_registry().await {
                warn!("can't persist player registry: {err}");
            }
            server.broadcast().await;
        }
        other => {
            warn!("unknown request kind {other:?}, closing session");
            return false;
        }
    }
    true
}
