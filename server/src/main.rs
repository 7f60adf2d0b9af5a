use std::path::PathBuf;

use clap::Parser;
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use tokio::net::TcpListener;

use sweeper_server::listener;
use sweeper_server::server::{Server, ServerConfig};

#[derive(Parser)]
#[command(
    name = "sweeper-server",
    version,
    about = "Multiplayer server for a shared, unbounded minesweeper world"
)]
struct Args {
    #[arg(long, env = "SWEEPER_LISTEN", default_value = "127.0.0.1:8080")]
    listen: String,
    /// Directory holding the minefield and registry snapshots.
    #[arg(long, env = "SWEEPER_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,
    /// Roughly one in this many cells is a mine. Only used when no field
    /// snapshot exists yet.
    #[arg(
        long,
        env = "SWEEPER_DENSITY",
        default_value_t = sweeper_core::DEFAULT_DENSITY,
        value_parser = clap::value_parser!(u32).range(2..)
    )]
    density: u32,
    #[arg(long, env = "SWEEPER_ADMINS_FILE", default_value = "admins.json")]
    admins_file: PathBuf,
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = ServerConfig {
        data_dir: args.data_dir,
        density: args.density,
    };
    let server = Server::open(&config)?;

    let listener = TcpListener::bind(&args.listen).await?;
    info!("listening on {}", listener.local_addr()?);
    listener::serve(server, listener, args.admins_file).await;
    Ok(())
}
