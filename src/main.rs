use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tracing::info;

use mixlink::audio::codec::OpusCodec;
use mixlink::config::Config;
use mixlink::room::RoomRegistry;
use mixlink::server::AppState;
use mixlink::transport::ChannelTransportFactory;
use mixlink::ws;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Using default config: {e}");
        Config::default()
    });

    let default_level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let codec = Arc::new(OpusCodec::new((&config.audio).into())?);
    let registry = RoomRegistry::new(codec);

    let shared_state = Arc::new(AppState::new(
        registry,
        Arc::new(ChannelTransportFactory::default()),
        config,
    ));
    let address: SocketAddr = shared_state.config.server.bind_addr()?;

    let app = Router::new()
        .route("/ws", get(ws::websocket_handler))
        .fallback_service(ServeDir::new(&shared_state.config.server.static_dir))
        .with_state(shared_state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    info!("Conference server listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
