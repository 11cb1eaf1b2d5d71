use axum::{
    Router,
    routing::{get, post},
};
use http::HeaderValue;
use std::{net::SocketAddr, sync::Arc};
use tokio::time::Duration as TokioDuration;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::compression::CompressionLevel;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error::{AppError, Result as AppResult};
use crate::state::AppState;

pub mod error;
pub mod handlers;

fn build_cors(server_config: &ServerConfig) -> CorsLayer {
    let cors_origins_result: Result<Vec<HeaderValue>, _> = server_config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .map_err(|e| format!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect();

    let cors_origins = cors_origins_result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "CORS config error. Defaulting to restrictive");
        vec![]
    });

    if cors_origins.is_empty() {
        tracing::info!("Restrictive CORS policy applied (no origins configured)");
        return CorsLayer::new();
    }
    tracing::info!(
        cors.origins.count = cors_origins.len(),
        "CORS configured with allowed origins"
    );
    CorsLayer::new()
        .allow_methods(vec![http::Method::GET, http::Method::POST])
        .allow_origin(cors_origins)
        .allow_headers(vec![
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::header::ACCEPT,
        ])
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route("/api/games", post(handlers::create_game_handler))
        .route("/api/games/{id}", get(handlers::get_game_handler))
        .route("/api/games/{id}/join", post(handlers::join_game_handler))
        .route("/api/games/{id}/start", post(handlers::start_game_handler))
        .route("/api/games/{id}/roll", post(handlers::roll_handler))
        .with_state(app_state)
}

#[tracing::instrument(skip(app_state, server_config), fields(
    server.port = server_config.port,
    cors.origins.count = server_config.cors_origins.len()
))]
pub async fn run_server(app_state: AppState, server_config: ServerConfig) -> AppResult<()> {
    let cors = build_cors(&server_config);

    // Clients poll the game endpoint, so the bucket is generous.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(100)
            .burst_size(60)
            .finish()
            .ok_or_else(|| AppError::Web("Invalid rate limiter configuration".to_string()))?,
    );
    tracing::info!(
        rate_limit.per_ms = 100,
        rate_limit.burst_size = 60,
        "Rate limiter configured"
    );

    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TokioDuration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    let app = router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CompressionLayer::new()
                .quality(CompressionLevel::Default)
                .gzip(true),
        )
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    tracing::info!(server.address = %addr, "HTTP server starting");

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(Into::into)
}
