//! The derby table: dealing, scratches, the race, payouts and eliminations.
//!
//! A [`Game`] is an owned value. Every mutation takes `&mut Game` plus an
//! explicit [`dice::DiceSource`], so callers decide both where exclusive access
//! comes from and where randomness comes from.

pub mod error;
pub use error::{GameError, InvariantError, RuleError, ValidationError};

pub mod types;
pub use types::GameStatus;

pub mod dice;
pub use dice::RandomDice;

pub mod ids;
pub use ids::{generate_game_id, new_player_id};

mod seating;

pub mod deck;
pub mod game;
pub use game::{Game, GameSettings};

pub mod autoplay;
pub mod payout;
pub mod roll;

pub mod view;
pub use view::GameView;
