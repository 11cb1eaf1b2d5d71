// src/lobby.rs
//
// Entry points for creating, joining, starting, rolling and viewing games.
// Every mutation runs under the repository's per-game lock.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::GamesConfig;
use crate::game_logic::{
    Game, GameError, GameSettings, GameStatus, GameView, InvariantError, RandomDice, RuleError,
    ValidationError, generate_game_id, new_player_id,
};
use crate::store::{GameRepository, StoreError};

const CREATE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for LobbyError {
    fn from(e: ValidationError) -> Self {
        LobbyError::Game(e.into())
    }
}

impl From<RuleError> for LobbyError {
    fn from(e: RuleError) -> Self {
        LobbyError::Game(e.into())
    }
}

impl From<InvariantError> for LobbyError {
    fn from(e: InvariantError) -> Self {
        LobbyError::Game(e.into())
    }
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub game_name: String,
    pub player_name: String,
    pub max_players: usize,
    pub starting_balance_cents: i64,
    pub standard_bet_cents: i64,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinedGame {
    pub game_id: String,
    pub player_id: String,
    pub game: GameView,
}

#[derive(Debug, Clone)]
pub struct Lobby {
    repository: Arc<GameRepository>,
    games_config: GamesConfig,
}

impl Lobby {
    pub fn new(repository: Arc<GameRepository>, games_config: GamesConfig) -> Self {
        Self {
            repository,
            games_config,
        }
    }

    pub fn games_config(&self) -> &GamesConfig {
        &self.games_config
    }

    #[tracing::instrument(skip(self, request), fields(game.name = %request.game_name))]
    pub async fn create_game(&self, request: NewGame) -> Result<JoinedGame, LobbyError> {
        let settings = GameSettings {
            name: request.game_name.trim().to_string(),
            max_players: request.max_players,
            starting_balance_cents: request.starting_balance_cents,
            standard_bet_cents: request.standard_bet_cents,
        };
        let creator_name = request.player_name.trim().to_string();
        settings.validate(&creator_name)?;

        let mut rng = StdRng::from_entropy();
        let player_id = new_player_id();
        let mut attempt = 1;
        let game = loop {
            let game_id = generate_game_id(&mut rng, |id| self.repository.id_exists(id))?;
            let game = Game::create(
                game_id,
                settings.clone(),
                player_id.clone(),
                creator_name.clone(),
            );
            match self.repository.create(&game).await {
                Ok(()) => break game,
                // Another create claimed the id after the existence check.
                Err(StoreError::AlreadyExists(id)) if attempt < CREATE_ATTEMPTS => {
                    tracing::debug!(game.id = %id, attempt, "Game id taken, drawing another");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };
        let game_id = game.id.clone();

        tracing::info!(
            game.id = %game_id,
            player.id = %player_id,
            game.max_players = game.max_players,
            "Game created"
        );
        Ok(JoinedGame {
            game: game.view(Some(&player_id)),
            game_id,
            player_id,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn join_game(&self, game_id: &str, player_name: &str) -> Result<JoinedGame, LobbyError> {
        let name = player_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingPlayerName.into());
        }
        let player_id = new_player_id();
        let view = self
            .repository
            .with_lock(game_id, |game| -> Result<GameView, LobbyError> {
                game.add_player(player_id.clone(), name.to_string())?;
                Ok(game.view(Some(&player_id)))
            })
            .await?;

        tracing::info!(game.id = %game_id, player.id = %player_id, "Player joined");
        Ok(JoinedGame {
            game_id: game_id.to_string(),
            player_id,
            game: view,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_game(&self, game_id: &str, player_id: &str) -> Result<GameView, LobbyError> {
        let roll_limit = self.games_config.autoplay_roll_limit;
        self.repository
            .with_lock(game_id, |game| -> Result<GameView, LobbyError> {
                if game.created_by != player_id {
                    return Err(RuleError::NotCreator.into());
                }
                let mut dice = RandomDice::from_entropy();
                game.start(&mut dice)?;
                game.autoplay_npc_turns(&mut dice, roll_limit)?;
                Ok(game.view(Some(player_id)))
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn roll(&self, game_id: &str, player_id: &str) -> Result<GameView, LobbyError> {
        if player_id.is_empty() {
            return Err(ValidationError::MissingPlayerId.into());
        }
        let roll_limit = self.games_config.autoplay_roll_limit;
        self.repository
            .with_lock(game_id, |game| -> Result<GameView, LobbyError> {
                let mut dice = RandomDice::from_entropy();
                game.roll_for_player(player_id, &mut dice)?;
                game.autoplay_npc_turns(&mut dice, roll_limit)?;
                Ok(game.view(Some(player_id)))
            })
            .await
    }

    /// Viewer-scoped snapshot. Games in progress get their pending NPC turns
    /// played first, under the lock.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_game(&self, game_id: &str, viewer_id: Option<&str>) -> Result<GameView, LobbyError> {
        let game = self
            .repository
            .find(game_id)
            .await?
            .ok_or_else(|| StoreError::GameNotFound(game_id.to_string()))?;

        if game.status != GameStatus::InProgress {
            return Ok(game.view(viewer_id));
        }

        let roll_limit = self.games_config.autoplay_roll_limit;
        self.repository
            .with_lock(game_id, |game| -> Result<GameView, LobbyError> {
                game.autoplay_npc_turns(&mut RandomDice::from_entropy(), roll_limit)?;
                Ok(game.view(viewer_id))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::game_logic::types::Phase;

    async fn test_lobby() -> Lobby {
        let dir = std::env::temp_dir().join(format!("derby-lobby-{}", new_player_id()));
        let repository = GameRepository::open(&StorageConfig {
            data_dir: dir.to_string_lossy().into_owned(),
        })
        .await
        .unwrap();
        Lobby::new(Arc::new(repository), GamesConfig::default())
    }

    fn new_game(max_players: usize) -> NewGame {
        NewGame {
            game_name: "Friday Derby".to_string(),
            player_name: "Alice".to_string(),
            max_players,
            starting_balance_cents: 2000,
            standard_bet_cents: 25,
        }
    }

    fn is_rule(err: &LobbyError, expected: &RuleError) -> bool {
        matches!(err, LobbyError::Game(GameError::Rule(rule)) if rule == expected)
    }

    #[tokio::test]
    async fn test_create_game_validates_input() {
        let lobby = test_lobby().await;

        let mut request = new_game(4);
        request.player_name = "   ".to_string();
        assert!(matches!(
            lobby.create_game(request).await,
            Err(LobbyError::Game(GameError::Validation(ValidationError::MissingNames)))
        ));

        assert!(matches!(
            lobby.create_game(new_game(12)).await,
            Err(LobbyError::Game(GameError::Validation(ValidationError::PlayerCount(12))))
        ));

        let mut request = new_game(4);
        request.starting_balance_cents = -5;
        assert!(matches!(
            lobby.create_game(request).await,
            Err(LobbyError::Game(GameError::Validation(ValidationError::NonPositiveAmount)))
        ));
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let lobby = test_lobby().await;
        let created = lobby.create_game(new_game(2)).await.unwrap();
        assert_eq!(created.game.status, GameStatus::Waiting);
        assert_eq!(created.game.viewer.as_ref().unwrap().id, created.player_id);

        let joined = lobby.join_game(&created.game_id, " Bob ").await.unwrap();
        assert_eq!(joined.game.players.len(), 2);
        assert_eq!(joined.game.players[1].name, "Bob");
        assert_eq!(joined.game.viewer.as_ref().unwrap().id, joined.player_id);

        let full = lobby.join_game(&created.game_id, "Carol").await.unwrap_err();
        assert!(is_rule(&full, &RuleError::Full));

        let empty = lobby.join_game(&created.game_id, "").await.unwrap_err();
        assert!(matches!(
            empty,
            LobbyError::Game(GameError::Validation(ValidationError::MissingPlayerName))
        ));
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let lobby = test_lobby().await;
        assert!(matches!(
            lobby.fetch_game("red-hoof-111", None).await,
            Err(LobbyError::Store(StoreError::GameNotFound(_)))
        ));
        assert!(matches!(
            lobby.join_game("red-hoof-111", "Bob").await,
            Err(LobbyError::Store(StoreError::GameNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_only_creator_can_start() {
        let lobby = test_lobby().await;
        let created = lobby.create_game(new_game(4)).await.unwrap();
        let joined = lobby.join_game(&created.game_id, "Bob").await.unwrap();

        let err = lobby
            .start_game(&created.game_id, &joined.player_id)
            .await
            .unwrap_err();
        assert!(is_rule(&err, &RuleError::NotCreator));

        let still_waiting = lobby.fetch_game(&created.game_id, None).await.unwrap();
        assert_eq!(still_waiting.status, GameStatus::Waiting);
    }

    #[tokio::test]
    async fn test_start_hands_turn_to_a_human() {
        let lobby = test_lobby().await;
        let created = lobby.create_game(new_game(5)).await.unwrap();
        let view = lobby
            .start_game(&created.game_id, &created.player_id)
            .await
            .unwrap();

        assert_eq!(view.players.len(), 5);
        assert_eq!(view.players.iter().filter(|p| p.is_npc).count(), 4);
        // NPC turns were played, so either the human rolls next or the game ended.
        match view.status {
            GameStatus::InProgress => {
                assert!(view.viewer.unwrap().can_roll);
                assert_ne!(view.phase, Phase::Waiting);
            }
            GameStatus::Finished => assert!(view.turn_player_id.is_none()),
            GameStatus::Waiting => panic!("game did not start"),
        }
    }

    #[tokio::test]
    async fn test_roll_requires_the_turn() {
        let lobby = test_lobby().await;
        let created = lobby.create_game(new_game(4)).await.unwrap();
        let bob = lobby.join_game(&created.game_id, "Bob").await.unwrap();
        let carol = lobby.join_game(&created.game_id, "Carol").await.unwrap();
        let dave = lobby.join_game(&created.game_id, "Dave").await.unwrap();
        let view = lobby
            .start_game(&created.game_id, &created.player_id)
            .await
            .unwrap();
        // Alice deals, Bob rolls first.
        assert_eq!(view.turn_player_id.as_deref(), Some(bob.player_id.as_str()));

        let err = lobby.roll(&created.game_id, &carol.player_id).await.unwrap_err();
        assert!(is_rule(&err, &RuleError::NotYourTurn));
        assert!(matches!(
            lobby.roll(&created.game_id, "").await,
            Err(LobbyError::Game(GameError::Validation(ValidationError::MissingPlayerId)))
        ));

        let view = lobby.roll(&created.game_id, &bob.player_id).await.unwrap();
        assert_eq!(view.scratches.len(), 1);
        assert_eq!(view.turn_player_id.as_deref(), Some(carol.player_id.as_str()));
        assert!(!view.viewer.unwrap().can_roll);

        let dave_view = lobby
            .fetch_game(&created.game_id, Some(&dave.player_id))
            .await
            .unwrap();
        assert_eq!(dave_view.scratches.len(), 1);
    }

    #[tokio::test]
    async fn test_full_game_keeps_invariants() {
        let lobby = test_lobby().await;
        let created = lobby.create_game(new_game(3)).await.unwrap();
        let mut view = lobby
            .start_game(&created.game_id, &created.player_id)
            .await
            .unwrap();

        let mut multiplier = view.elimination_multiplier;
        for _ in 0..20_000 {
            if view.status != GameStatus::InProgress {
                break;
            }
            let turn = view.turn_player_id.clone().unwrap();
            let turn_seat = view.players.iter().find(|p| p.id == turn).unwrap();
            assert!(!turn_seat.eliminated);
            assert!(view.pot_cents >= 0);
            assert!(view.elimination_multiplier >= multiplier);
            assert_eq!(view.elimination_multiplier.count_ones(), 1);
            multiplier = view.elimination_multiplier;

            view = if turn == created.player_id {
                lobby.roll(&created.game_id, &created.player_id).await.unwrap()
            } else {
                lobby
                    .fetch_game(&created.game_id, Some(&created.player_id))
                    .await
                    .unwrap()
            };
        }

        if view.status == GameStatus::Finished {
            assert!(view.turn_player_id.is_none());
            let survivors = view.players.iter().filter(|p| !p.eliminated).count();
            assert!(survivors <= 1);
            assert_eq!(view.winner_player_id.is_some(), survivors == 1);
        }
    }
}
