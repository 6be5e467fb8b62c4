use anyhow::Result;
use clap::Parser;
use reel_chat::{AppState, Config, HttpRecommender, TranscriptionClient};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reel-chat", about = "Voice-driven movie recommendation chat service")]
struct Args {
    /// Config file base path (TOML, extension optional)
    #[arg(long, default_value = "config/reel-chat")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recommendation backend: {}", cfg.recommender.base_url);
    info!(
        "Transcription provider: {} (cap {} MB)",
        cfg.transcription.base_url,
        cfg.transcription.max_upload_bytes / (1024 * 1024)
    );

    let recommender = Arc::new(HttpRecommender::new(&cfg.recommender)?);
    let transcriber = Arc::new(TranscriptionClient::new(cfg.transcription.clone())?);

    let state = AppState::new(recommender, transcriber);
    let router = reel_chat::create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
