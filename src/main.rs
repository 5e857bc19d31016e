//! Arena Duel - entry point
//!
//! Starts a single-device game, hosts a networked one (serving the `/peer`
//! upgrade), or joins a host as the guest, depending on `ARENA_MODE`.

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_duel::app::AppState;
use arena_duel::config::{Config, LaunchMode};
use arena_duel::game::io::{LiveInput, LogScores, ScriptedInput, TraceRender};
use arena_duel::game::{ArenaParams, FinalScore, GameSession, Hooks, Role, SessionError, SessionTiming};
use arena_duel::http::build_router;
use arena_duel::net::transport;
use arena_duel::util::time::init_server_time;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);
    init_server_time();

    info!(mode = ?config.mode, "Starting Arena Duel");

    let params = ArenaParams {
        win_score: config.win_score,
        ..ArenaParams::default()
    };
    let timing = SessionTiming::from_config(&config);
    let hooks = build_hooks(&config).await?;

    let session = match config.mode {
        LaunchMode::SingleDevice => GameSession::single_device(params, timing, hooks),
        LaunchMode::Host => {
            let Some(link) = host(config.clone()).await? else {
                info!("Shut down before a peer joined");
                return Ok(());
            };
            GameSession::networked(Role::for_connection(true), link, params, timing, hooks)
        }
        LaunchMode::Guest => {
            // Presence is checked when the config is loaded
            let url = config.peer_url.as_deref().unwrap_or_default();
            let link = transport::dial(url).await?;
            GameSession::networked(Role::for_connection(false), link, params, timing, hooks)
        }
    };

    tokio::select! {
        result = session.run() => report(result)?,
        _ = shutdown_signal() => info!("Shutdown requested"),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Serve the peer endpoint until a guest connects
async fn host(config: Config) -> anyhow::Result<Option<arena_duel::net::PeerLink>> {
    let addr = config.listen_addr;
    let (state, mut link_rx) = AppState::new(config);
    let router = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Hosting on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Peer endpoint: ws://{}/peer", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "HTTP server stopped");
        }
    });

    tokio::select! {
        link = link_rx.recv() => Ok(link),
        _ = shutdown_signal() => Ok(None),
    }
}

async fn build_hooks(config: &Config) -> anyhow::Result<Hooks> {
    let mut hooks = Hooks::headless();
    hooks.input = match &config.input_script {
        Some(path) => {
            let script = tokio::fs::read_to_string(path).await?;
            let input = ScriptedInput::parse(&script);
            info!(path = %path, steps = input.remaining(), "Loaded input script");
            Box::new(input)
        }
        None => Box::new(LiveInput::from_stdin()),
    };
    hooks.render = Box::new(TraceRender::new(u64::from(config.tick_rate)));
    hooks.scores = Box::new(LogScores);
    Ok(hooks)
}

fn report(result: Result<FinalScore, SessionError>) -> anyhow::Result<()> {
    match result {
        Ok(done) => {
            info!(winner = ?done.winner, red = done.red, blue = done.blue, "Final score");
            Ok(())
        }
        Err(SessionError::ConnectionLost) => {
            warn!("Connection lost");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
