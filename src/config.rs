use crate::error::{ConfigError, Result as AppResult};
use crate::game_logic::game::MAX_AMOUNT_CENTS;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

/// Defaults for fields a create request leaves out, plus autoplay tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct GamesConfig {
    pub default_max_players: usize,
    pub default_starting_balance_cents: i64,
    pub default_standard_bet_cents: i64,
    pub autoplay_roll_limit: usize,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            default_max_players: 4,
            default_starting_balance_cents: 2000,
            default_standard_bet_cents: 25,
            autoplay_roll_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub games: GamesConfig,
}

pub fn load_settings() -> AppResult<AppSettings> {
    let defaults = GamesConfig::default();
    let builder = Config::builder()
        .set_default("server.port", 8080)?
        .set_default("server.cors_origins", Vec::<String>::new())?
        .set_default("storage.data_dir", "data/games")?
        .set_default("games.default_max_players", defaults.default_max_players as u64)?
        .set_default(
            "games.default_starting_balance_cents",
            defaults.default_starting_balance_cents,
        )?
        .set_default(
            "games.default_standard_bet_cents",
            defaults.default_standard_bet_cents,
        )?
        .set_default("games.autoplay_roll_limit", defaults.autoplay_roll_limit as u64)?
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("DERBY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .try_parsing(true),
        );

    let settings = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let settings: AppSettings = settings
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &AppSettings) -> Result<(), ConfigError> {
    let games = &settings.games;
    if !(2..=10).contains(&games.default_max_players) {
        return Err(ConfigError::InvalidValue(format!(
            "games.default_max_players must be between 2 and 10, got {}",
            games.default_max_players
        )));
    }
    if games.default_starting_balance_cents <= 0 || games.default_standard_bet_cents <= 0 {
        return Err(ConfigError::InvalidValue(
            "games default amounts must be greater than 0".to_string(),
        ));
    }
    if games.default_starting_balance_cents > MAX_AMOUNT_CENTS
        || games.default_standard_bet_cents > MAX_AMOUNT_CENTS
    {
        return Err(ConfigError::InvalidValue(format!(
            "games default amounts must be at most {MAX_AMOUNT_CENTS} cents"
        )));
    }
    if games.autoplay_roll_limit == 0 {
        return Err(ConfigError::InvalidValue(
            "games.autoplay_roll_limit must be at least 1".to_string(),
        ));
    }
    if settings.storage.data_dir.trim().is_empty() {
        return Err(ConfigError::Missing("storage.data_dir".to_string()));
    }
    Ok(())
}
