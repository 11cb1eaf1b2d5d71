use thiserror::Error;

use super::types::{GameStatus, Horse, Phase};

/// Malformed or out-of-range request input. Nothing has been touched yet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Game name and player name are required")]
    MissingNames,
    #[error("Player name is required")]
    MissingPlayerName,
    #[error("playerId is required")]
    MissingPlayerId,
    #[error("Players must be between 2 and 10, got {0}")]
    PlayerCount(usize),
    #[error("Starting balance and standard bet must be greater than 0")]
    NonPositiveAmount,
    #[error("Starting balance and standard bet must be at most {max} cents")]
    AmountTooLarge { max: i64 },
}

/// The request was well formed but the game is not in a state that allows it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Game is {actual}, expected {expected}")]
    InvalidTransition {
        expected: GameStatus,
        actual: GameStatus,
    },
    #[error("Game is full")]
    Full,
    #[error("Game is not active")]
    NotActive,
    #[error("Rolls are not allowed in the {0} phase")]
    InvalidPhase(Phase),
    #[error("No current turn")]
    NoCurrentTurn,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Player is eliminated")]
    Eliminated,
    #[error("Only the game creator can start the game")]
    NotCreator,
    #[error("Player {0} not found")]
    PlayerNotFound(String),
}

/// Internal consistency faults. These abort the operation and are never persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("Card dealing failed balance check (min {min}, max {max})")]
    DealingImbalance { min: usize, max: usize },
    #[error("Missing winner horse")]
    MissingWinnerHorse,
    #[error("No active players")]
    NoActivePlayers,
    #[error("Turn player {0} is not seated")]
    UnknownTurnPlayer(String),
    #[error("Horse {0} is not on the track")]
    UnknownHorse(Horse),
    #[error("Could not roll unique scratch horse after {attempts} attempts")]
    ScratchAssignmentExhausted { attempts: usize },
    #[error("Unable to generate game id after {attempts} attempts")]
    GameIdExhausted { attempts: usize },
    #[error("Money arithmetic overflowed")]
    AmountOverflow,
    #[error("Elimination multiplier overflowed after {eliminated} eliminations")]
    MultiplierOverflow { eliminated: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
