use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use sweeper_core::AdminRequest;
use tokio_tungstenite::tungstenite::Message;

mod bot;

#[derive(Parser)]
#[command(name = "sweeper-cli", version, about = "Operator tools for a running sweeper server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    Bot {
        #[command(subcommand)]
        command: bot::BotCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    Players {
        #[arg(long, env = "SWEEPER_ADMIN_URL", default_value = "ws://127.0.0.1:8080/admin")]
        url: String,
    },
    Admins {
        #[arg(long, env = "SWEEPER_ADMIN_URL", default_value = "ws://127.0.0.1:8080/admin")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => {
            let (request, url) = match command {
                AdminCommand::Players { url } => ("get-players", url),
                AdminCommand::Admins { url } => ("get-admins", url),
            };
            query(&url, request).await
        }
        Commands::Bot { command } => bot::run(command).await,
    }
}

async fn query(url: &str, request: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
    let (mut write, mut read) = ws.split();

    let payload = serde_json::to_string(&AdminRequest {
        request: request.to_string(),
    })?;
    write.send(Message::text(payload)).await?;

    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => {
                println!("{text}");
                break;
            }
            Message::Close(frame) => {
                println!("server closed: {frame:?}");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
