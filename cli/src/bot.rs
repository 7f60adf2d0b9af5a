use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sweeper_core::{ClientRequest, StateUpdate};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(clap::Subcommand)]
pub(super) enum BotCommand {
    Run {
        #[arg(long, env = "SWEEPER_WS_URL", default_value = "ws://127.0.0.1:8080/ws")]
        url: String,
        #[arg(long, default_value_t = 3)]
        players: usize,
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,
        #[arg(long, default_value_t = 250)]
        think_min_ms: u64,
        #[arg(long, default_value_t = 1200)]
        think_max_ms: u64,
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub(super) async fn run(command: BotCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        BotCommand::Run {
            url,
            players,
            duration_secs,
            think_min_ms,
            think_max_ms,
            seed,
        } => {
            let base_seed = seed.unwrap_or_else(rand::random);
            let mut handles = Vec::with_capacity(players);
            for index in 0..players {
                let config = BotConfig {
                    url: url.clone(),
                    duration: Duration::from_secs(duration_secs),
                    think_min_ms,
                    think_max_ms: think_max_ms.max(think_min_ms + 1),
                };
                handles.push(tokio::spawn(run_bot(
                    index,
                    config,
                    base_seed.wrapping_add(index as u64),
                )));
            }
            for handle in handles {
                match handle.await {
                    Ok(Ok(report)) => println!("{report}"),
                    Ok(Err(err)) => eprintln!("bot failed: {err}"),
                    Err(err) => eprintln!("bot panicked: {err}"),
                }
            }
            Ok(())
        }
    }
}

#[derive(Clone)]
struct BotConfig {
    url: String,
    duration: Duration,
    think_min_ms: u64,
    think_max_ms: u64,
}

async fn run_bot(index: usize, config: BotConfig, seed: u64) -> Result<String, String> {
    let mut rng = StdRng::seed_from_u64(seed);

    let cookie: u64 = rng.random();
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|err| err.to_string())?;
    request.headers_mut().insert(
        "Cookie",
        format!("sweeperID=bot-{cookie:016x}")
            .parse()
            .map_err(|_| "can't build cookie header".to_string())?,
    );
    let (ws, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|err| err.to_string())?;
    let (mut write, mut read) = ws.split();

    // drain inbound updates so the server never backs up on this session,
    // remembering the last reported score
    let reader = tokio::spawn(async move {
        let mut updates = 0u64;
        let mut score = 0u64;
        while let Some(Ok(message)) = read.next().await {
            if let Message::Text(text) = message {
                if let Ok(update) = serde_json::from_str::<StateUpdate>(text.as_str()) {
                    updates += 1;
                    score = update.score;
                }
            }
        }
        (updates, score)
    });

    send(
        &mut write,
        &ClientRequest {
            kind: "update-name".to_string(),
            x: 0,
            y: 0,
            name: format!("bot-{index:02}"),
        },
    )
    .await?;

    let deadline = tokio::time::Instant::now() + config.duration;
    while tokio::time::Instant::now() < deadline {
        let think = rng.random_range(config.think_min_ms..config.think_max_ms);
        tokio::time::sleep(Duration::from_millis(think)).await;

        let request = match rng.random_range(0..10u32) {
            0 | 1 => ClientRequest {
                kind: "move".to_string(),
                x: rng.random_range(-4..=4),
                y: rng.random_range(-4..=4),
                name: String::new(),
            },
            2 => ClientRequest {
                kind: "mark".to_string(),
                x: rng.random_range(0..20),
                y: rng.random_range(0..20),
                name: String::new(),
            },
            _ => ClientRequest {
                kind: "uncover".to_string(),
                x: rng.random_range(0..20),
                y: rng.random_range(0..20),
                name: String::new(),
            },
        };
        send(&mut write, &request).await?;
    }

    write.close().await.map_err(|err| err.to_string())?;
    let (updates, score) = reader.await.map_err(|err| err.to_string())?;
    Ok(format!(
        "bot-{index:02}: {updates} updates seen, final score {score}"
    ))
}

async fn send(write: &mut SplitSink<WsStream, Message>, req: &ClientRequest) -> Result<(), String> {
    let payload = serde_json::to_string(req).map_err(|err| err.to_string())?;
    write
        .send(Message::text(payload))
        .await
        .map_err(|err| err.to_string())
}
