// src/main.rs

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- Module Declarations ---
mod config;
mod error;
mod game_logic;
mod lobby;
mod state;
mod store;
mod web;

// --- Imports ---
use crate::config::load_settings;
use crate::error::Result as AppResult;
use crate::lobby::Lobby;
use crate::state::AppState;
use crate::store::GameRepository;
use crate::web::run_server;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Setup tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,tower_http=debug,{}::store=debug",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load Configuration
    let app_settings = load_settings()?;
    tracing::info!("Configuration loaded: {:?}", app_settings);

    let repository = Arc::new(GameRepository::open(&app_settings.storage).await?);

    let app_state = AppState {
        lobby: Lobby::new(repository, app_settings.games),
    };

    run_server(app_state, app_settings.server).await?;

    Ok(())
}
