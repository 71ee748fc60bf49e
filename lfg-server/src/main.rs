//! LFG Matchmaker Server
//!
//! A forum bot that pairs players for games: players message it a format
//! keyword, it opens a poll topic, and once enough players vote it creates a
//! game room and messages everyone the link.

mod config;
mod platform;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use lfg_core::processors::MatchmakingEngine;
use lfg_core::status::status_channel;
use lfg_sdk::client::{ConvokeClient, DiscourseClient};
use platform::{ConvokeRooms, DiscourseForum};
use server::{bind, build_router, run_server};
use shutdown::spawn_shutdown_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// LFG Matchmaker - forum matchmaking bot
#[derive(Parser, Debug)]
#[command(name = "lfg-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./lfg-config.toml")]
    config: PathBuf,

    /// Override the status listen address (e.g., 0.0.0.0:8088)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run a single cycle and exit
    #[arg(long, default_value = "false")]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting lfg-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(
        formats = loaded_config.engine.formats.len(),
        bot = %loaded_config.engine.bot_username,
        "Configuration loaded from {:?}",
        args.config
    );

    // Platform clients share one connection pool
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("lfg-server/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let forum = DiscourseForum::new(
        DiscourseClient::new(
            loaded_config.forum.base_url.clone(),
            loaded_config.forum.api_key.clone(),
            loaded_config.engine.bot_username.as_str(),
        )
        .with_http_client(http.clone()),
    );
    let rooms = ConvokeRooms::new(
        ConvokeClient::new(
            loaded_config.game_rooms.api_url.clone(),
            loaded_config.game_rooms.api_key.clone(),
        )
        .with_http_client(http),
    );

    let (status_tx, status_rx) = status_channel();
    let mut engine = MatchmakingEngine::new(loaded_config.engine, forum, rooms, status_tx);

    if args.once {
        let now = OffsetDateTime::now_utc();
        engine.restore(now).await;
        engine.run_cycle(now).await;
        let status = status_rx.borrow().clone();
        tracing::info!(
            open_topics = status.active_topics.len(),
            tracked_channels = status.tracked_channels,
            "Single cycle complete"
        );
        return Ok(());
    }

    // Startup failures below are fatal before the loop starts
    let listener = bind(loaded_config.server.listen).await.map_err(|e| {
        tracing::error!("Failed to bind {}: {}", loaded_config.server.listen, e);
        e
    })?;
    let shutdown_rx = spawn_shutdown_handler()?;

    engine.restore(OffsetDateTime::now_utc()).await;
    let engine_handle = tokio::spawn(engine.run(shutdown_rx.clone()));

    // Run the status server until shutdown
    let router = build_router(AppState::new(status_rx));
    let result = run_server(listener, router, shutdown_rx).await;

    // The engine finishes its current cycle before stopping, unless the
    // server died on its own and no shutdown is coming
    if result.is_err() {
        engine_handle.abort();
    }
    match engine_handle.await {
        Err(e) if !e.is_cancelled() => tracing::error!("Engine task failed: {}", e),
        _ => {}
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
