use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::error::Result as WebResult;
use crate::config::GamesConfig;
use crate::game_logic::GameView;
use crate::lobby::{JoinedGame, NewGame};
use crate::state::AppState;

const DEFAULT_GAME_NAME: &str = "New Derby Game";
const DEFAULT_CREATOR_NAME: &str = "Player 1";
const DEFAULT_JOIN_NAME: &str = "Player";

/// Dollar amounts as sent by the browser client.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub game_name: Option<String>,
    pub player_name: Option<String>,
    pub max_players: Option<usize>,
    pub starting_balance: Option<f64>,
    pub standard_bet: Option<f64>,
}

impl CreateGameRequest {
    fn into_new_game(self, defaults: &GamesConfig) -> NewGame {
        NewGame {
            game_name: self
                .game_name
                .unwrap_or_else(|| DEFAULT_GAME_NAME.to_string()),
            player_name: self
                .player_name
                .unwrap_or_else(|| DEFAULT_CREATOR_NAME.to_string()),
            max_players: self.max_players.unwrap_or(defaults.default_max_players),
            starting_balance_cents: self
                .starting_balance
                .map(dollars_to_cents)
                .unwrap_or(defaults.default_starting_balance_cents),
            standard_bet_cents: self
                .standard_bet
                .map(dollars_to_cents)
                .unwrap_or(defaults.default_standard_bet_cents),
        }
    }
}

fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub player_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    #[serde(default)]
    pub player_id: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    pub player_id: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct GameEnvelope {
    pub game: GameView,
}

pub async fn create_game_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateGameRequest>,
) -> WebResult<(StatusCode, Json<JoinedGame>)> {
    tracing::info!("HTTP: Received create_game request: {:?}", payload);
    let request = payload.into_new_game(app_state.lobby.games_config());
    let created = app_state.lobby.create_game(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn join_game_handler(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<JoinGameRequest>,
) -> WebResult<(StatusCode, Json<JoinedGame>)> {
    let name = payload
        .player_name
        .unwrap_or_else(|| DEFAULT_JOIN_NAME.to_string());
    let joined = app_state.lobby.join_game(&game_id, &name).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}

pub async fn start_game_handler(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<PlayerRequest>,
) -> WebResult<Json<GameEnvelope>> {
    let game = app_state
        .lobby
        .start_game(&game_id, &payload.player_id)
        .await?;
    Ok(Json(GameEnvelope { game }))
}

pub async fn roll_handler(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Json(payload): Json<PlayerRequest>,
) -> WebResult<Json<GameEnvelope>> {
    let game = app_state.lobby.roll(&game_id, &payload.player_id).await?;
    Ok(Json(GameEnvelope { game }))
}

pub async fn get_game_handler(
    State(app_state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> WebResult<Json<GameEnvelope>> {
    let game = app_state
        .lobby
        .fetch_game(&game_id, query.player_id.as_deref())
        .await?;
    Ok(Json(GameEnvelope { game }))
}

pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
