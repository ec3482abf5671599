// voicebox - text-to-speech gateway
// Looks up synthesized audio by text digest and only calls the provider on a miss

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use voicebox_server::config::ServerConfig;
use voicebox_server::http::{create_router, AppState};
use voicebox_server::logging;
use voicebox_spk::SpeechService;

#[derive(Parser)]
#[command(name = "voicebox-server")]
#[command(about = "Text-to-speech gateway with an on-disk audio cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// HTTP port
    #[arg(long, short)]
    port: Option<u16>,

    /// Directory for cached audio
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        let mut shown = config.clone();
        if shown.speech.api.api_key.is_some() {
            shown.speech.api.api_key = Some("********".to_string());
        }
        println!("{}", toml::to_string_pretty(&shown)?);
        return Ok(());
    }

    logging::init(&config.network.log_level, config.network.log_format)?;

    info!("🚀 Starting voicebox...");

    let service = SpeechService::from_config(config.speech.clone())?;
    info!(
        "📦 Audio cache at {} ({} digests, .{} files)",
        service.cache().dir().display(),
        config.speech.digest,
        service.cache().extension()
    );
    info!("🗣️  Synthesis via {} ({})", service.engine_name(), config.speech.voice.language);

    let app = create_router(AppState::new(service), &config.network);

    let addr = format!("{}:{}", config.network.bind_address, config.network.bind_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("✅ HTTP server listening on http://{}", listener.local_addr()?);
    info!("   POST {}", config.network.api_path);
    info!("   GET  {}/{{file}}", config.speech.url_prefix.trim_end_matches('/'));

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    info!("👋 voicebox stopped. Goodbye!");
    Ok(())
}

/// Defaults, then config file, then environment, then CLI flags
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ServerConfig::default(),
    };

    config.apply_env();

    if let Some(host) = &cli.host {
        config.network.bind_address = host.clone();
    }
    if let Some(port) = cli.port {
        config.network.bind_port = port;
    }
    if let Some(dir) = &cli.cache_dir {
        config.speech.cache_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.network.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Wait for shutdown signal
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
