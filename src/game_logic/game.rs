// src/game_logic/game.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::deck::{assert_balanced_hands, build_deck, deal_round_robin};
use super::dice::DiceSource;
use super::error::{Result, RuleError, ValidationError};
use super::ids::new_player_id;
use super::seating::{active_indexes, first_active_index, next_active_index};
use super::types::{
    GameStatus, Horse, HorseState, LastRoll, Phase, Player, Scratch, new_horse_state,
};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;
/// Tables with fewer humans than this are filled up with NPCs on start.
pub const NPC_FILL_THRESHOLD: usize = 4;
pub const MAX_LOG_LINES: usize = 300;
/// Upper bound for the starting balance and the standard bet. A full table
/// holds at most `MAX_PLAYERS * MAX_AMOUNT_CENTS`, far below `i64::MAX`.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

/// Immutable table rules chosen at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub name: String,
    pub max_players: usize,
    pub starting_balance_cents: i64,
    pub standard_bet_cents: i64,
}

impl GameSettings {
    pub fn validate(&self, creator_name: &str) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() || creator_name.trim().is_empty() {
            return Err(ValidationError::MissingNames);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(ValidationError::PlayerCount(self.max_players));
        }
        if self.starting_balance_cents <= 0 || self.standard_bet_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.starting_balance_cents > MAX_AMOUNT_CENTS
            || self.standard_bet_cents > MAX_AMOUNT_CENTS
        {
            return Err(ValidationError::AmountTooLarge {
                max: MAX_AMOUNT_CENTS,
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,

    pub max_players: usize,
    pub starting_balance_cents: i64,
    pub standard_bet_cents: i64,

    pub status: GameStatus,
    pub round: u32,
    pub phase: Phase,

    /// Seating order; never reordered.
    pub players: Vec<Player>,
    pub dealer_index: usize,
    pub turn_player_id: Option<String>,
    pub pot_cents: i64,
    pub elimination_multiplier: i64,
    pub horses: BTreeMap<Horse, HorseState>,
    pub scratches: Vec<Scratch>,
    pub winner_horse: Option<Horse>,
    pub winner_player_id: Option<String>,
    pub last_roll: Option<LastRoll>,
    pub logs: Vec<String>,
}

impl Game {
    /// Builds a waiting game with the creator in the first seat. Settings are
    /// expected to have passed [`GameSettings::validate`].
    pub fn create(id: String, settings: GameSettings, creator_id: String, creator_name: String) -> Self {
        let creator = Player::new(
            creator_id.clone(),
            creator_name.clone(),
            false,
            settings.starting_balance_cents,
        );
        let mut game = Self {
            id,
            name: settings.name,
            created_by: creator_id,
            created_at: Utc::now(),
            max_players: settings.max_players,
            starting_balance_cents: settings.starting_balance_cents,
            standard_bet_cents: settings.standard_bet_cents,
            status: GameStatus::Waiting,
            round: 0,
            phase: Phase::Waiting,
            players: vec![creator],
            dealer_index: 0,
            turn_player_id: None,
            pot_cents: 0,
            elimination_multiplier: 1,
            horses: new_horse_state(),
            scratches: Vec::new(),
            winner_horse: None,
            winner_player_id: None,
            last_roll: None,
            logs: Vec::new(),
        };
        game.push_log(format!("Game created by {}", creator_name));
        game
    }

    pub fn add_player(&mut self, player_id: String, name: String) -> Result<()> {
        self.expect_status(GameStatus::Waiting)?;
        if self.players.len() >= self.max_players {
            return Err(RuleError::Full.into());
        }
        self.push_log(format!("{} joined the game", name));
        self.players.push(Player::new(
            player_id,
            name,
            false,
            self.starting_balance_cents,
        ));
        Ok(())
    }

    pub fn start(&mut self, dice: &mut dyn DiceSource) -> Result<()> {
        self.expect_status(GameStatus::Waiting)?;

        let humans = self.players.iter().filter(|p| !p.is_npc).count();
        if humans < NPC_FILL_THRESHOLD {
            let mut npc_number = 1;
            while self.players.len() < self.max_players {
                let name = format!("NPC {}", npc_number);
                npc_number += 1;
                self.players.push(Player::new(
                    new_player_id(),
                    name.clone(),
                    true,
                    self.starting_balance_cents,
                ));
                self.push_log(format!("{} was added", name));
            }
        }

        tracing::info!(
            game.id = %self.id,
            players.total = self.players.len(),
            players.human = humans,
            "Game starting"
        );
        self.status = GameStatus::InProgress;
        self.round = 0;
        self.setup_next_round(dice)
    }

    /// Resets per-round state, rotates the dealer and deals a fresh deck.
    /// Ends the game instead when fewer than two players remain.
    pub(crate) fn setup_next_round(&mut self, dice: &mut dyn DiceSource) -> Result<()> {
        self.round += 1;
        self.phase = Phase::Scratch;
        self.pot_cents = 0;
        self.scratches.clear();
        self.horses = new_horse_state();
        self.winner_horse = None;
        self.last_roll = None;

        let active = active_indexes(&self.players);
        if active.len() <= 1 {
            self.finish(&active);
            return Ok(());
        }

        let dealer_index = if self.round == 1 {
            first_active_index(&self.players)?
        } else {
            next_active_index(&self.players, self.dealer_index)?
        };
        self.dealer_index = dealer_index;

        for player in &mut self.players {
            player.hand.clear();
        }

        let mut deck = build_deck();
        dice.shuffle(&mut deck);
        deal_round_robin(&mut self.players, deck, dealer_index)?;
        assert_balanced_hands(&self.players)?;

        for &idx in &active {
            self.players[idx].hand.sort_unstable();
        }

        let first_roller = next_active_index(&self.players, dealer_index)?;
        self.turn_player_id = Some(self.players[first_roller].id.clone());

        tracing::debug!(
            game.id = %self.id,
            game.round = self.round,
            dealer.index = dealer_index,
            "Round dealt"
        );
        self.push_log(format!("Round {} started", self.round));
        Ok(())
    }

    /// Terminal transition. `remaining` holds the active seat indexes.
    pub(crate) fn finish(&mut self, remaining: &[usize]) {
        self.status = GameStatus::Finished;
        self.phase = Phase::Finished;
        self.turn_player_id = None;
        match remaining {
            [winner] => {
                let winner = &self.players[*winner];
                let (winner_id, winner_name) = (winner.id.clone(), winner.name.clone());
                if self.winner_player_id.is_none() {
                    self.winner_player_id = Some(winner_id);
                }
                self.push_log(format!("{} won the game", winner_name));
            }
            _ => self.push_log("All players were eliminated"),
        }
        tracing::info!(
            game.id = %self.id,
            game.round = self.round,
            winner.id = ?self.winner_player_id,
            "Game finished"
        );
    }

    fn expect_status(&self, expected: GameStatus) -> Result<(), RuleError> {
        if self.status != expected {
            return Err(RuleError::InvalidTransition {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub(crate) fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub(crate) fn push_log(&mut self, message: impl AsRef<str>) {
        self.logs.push(format!(
            "{} UTC | {}",
            Utc::now().format("%H:%M:%S"),
            message.as_ref()
        ));
        if self.logs.len() > MAX_LOG_LINES {
            let overflow = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..overflow);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game_logic::dice::ScriptedDice;
    use crate::game_logic::error::{GameError, InvariantError};

    pub(crate) fn settings(max_players: usize) -> GameSettings {
        GameSettings {
            name: "Test Derby".to_string(),
            max_players,
            starting_balance_cents: 2000,
            standard_bet_cents: 25,
        }
    }

    /// A started game with `humans` human seats and no NPCs.
    pub(crate) fn started_game(humans: usize) -> Game {
        let mut game = Game::create(
            "red-track-100".into(),
            settings(humans),
            "p0".into(),
            "Alice".into(),
        );
        for i in 1..humans {
            game.add_player(format!("p{i}"), format!("Player {i}"))
                .unwrap();
        }
        // The table is already full, so no NPCs get seated.
        game.start(&mut ScriptedDice::default()).unwrap();
        game
    }

    #[test]
    fn test_validate_settings() {
        assert!(settings(4).validate("Alice").is_ok());
        assert_eq!(
            settings(4).validate("  "),
            Err(ValidationError::MissingNames)
        );
        assert_eq!(
            settings(1).validate("Alice"),
            Err(ValidationError::PlayerCount(1))
        );
        assert_eq!(
            settings(11).validate("Alice"),
            Err(ValidationError::PlayerCount(11))
        );
        let mut broke = settings(4);
        broke.standard_bet_cents = 0;
        assert_eq!(
            broke.validate("Alice"),
            Err(ValidationError::NonPositiveAmount)
        );

        let mut largest = settings(4);
        largest.starting_balance_cents = MAX_AMOUNT_CENTS;
        largest.standard_bet_cents = MAX_AMOUNT_CENTS;
        assert!(largest.validate("Alice").is_ok());
        largest.standard_bet_cents = MAX_AMOUNT_CENTS + 1;
        assert_eq!(
            largest.validate("Alice"),
            Err(ValidationError::AmountTooLarge {
                max: MAX_AMOUNT_CENTS
            })
        );
        let mut huge = settings(4);
        huge.starting_balance_cents = 5_000_000_000_000_000_000;
        assert!(matches!(
            huge.validate("Alice"),
            Err(ValidationError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_create_game_seats_creator() {
        let game = Game::create("gold-hoof-321".into(), settings(4), "c".into(), "Carol".into());
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.phase, Phase::Waiting);
        assert_eq!(game.round, 0);
        assert_eq!(game.players.len(), 1);
        assert_eq!(game.players[0].balance_cents, 2000);
        assert!(!game.players[0].is_npc);
        assert_eq!(game.created_by, "c");
        assert_eq!(game.elimination_multiplier, 1);
        assert!(game.logs[0].ends_with("Game created by Carol"));
    }

    #[test]
    fn test_add_player_until_full() {
        let mut game = Game::create("x".into(), settings(2), "c".into(), "Carol".into());
        game.add_player("d".into(), "Dave".into()).unwrap();
        assert_eq!(
            game.add_player("e".into(), "Eve".into()),
            Err(GameError::Rule(RuleError::Full))
        );
        assert_eq!(game.players.len(), 2);
        assert!(game.logs.last().unwrap().ends_with("Dave joined the game"));
    }

    #[test]
    fn test_add_player_after_start_is_rejected() {
        let mut game = started_game(2);
        assert_eq!(
            game.add_player("late".into(), "Late".into()),
            Err(GameError::Rule(RuleError::InvalidTransition {
                expected: GameStatus::Waiting,
                actual: GameStatus::InProgress,
            }))
        );
    }

    #[test]
    fn test_start_pads_with_npcs() {
        let mut game = Game::create("x".into(), settings(6), "c".into(), "Carol".into());
        game.add_player("d".into(), "Dave".into()).unwrap();
        game.start(&mut ScriptedDice::default()).unwrap();

        assert_eq!(game.players.len(), 6);
        let npc_names: Vec<&str> = game
            .players
            .iter()
            .filter(|p| p.is_npc)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(npc_names, vec!["NPC 1", "NPC 2", "NPC 3", "NPC 4"]);
        assert!(game.logs.iter().any(|l| l.ends_with("NPC 4 was added")));
        assert_eq!(game.status, GameStatus::InProgress);
        assert_eq!(game.phase, Phase::Scratch);
        assert_eq!(game.round, 1);
    }

    #[test]
    fn test_start_with_four_humans_adds_no_npcs() {
        let mut game = Game::create("x".into(), settings(8), "p0".into(), "A".into());
        for i in 1..4 {
            game.add_player(format!("p{i}"), format!("P{i}")).unwrap();
        }
        game.start(&mut ScriptedDice::default()).unwrap();
        assert_eq!(game.players.len(), 4);
        assert!(game.players.iter().all(|p| !p.is_npc));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut game = started_game(4);
        assert!(matches!(
            game.start(&mut ScriptedDice::default()),
            Err(GameError::Rule(RuleError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn test_first_round_deal() {
        let game = started_game(4);
        assert_eq!(game.dealer_index, 0);
        assert_eq!(game.turn_player_id.as_deref(), Some("p1"));
        for player in &game.players {
            assert_eq!(player.hand.len(), 11);
            assert!(player.hand.windows(2).all(|w| w[0] <= w[1]));
        }
        assert!(game.logs.last().unwrap().ends_with("Round 1 started"));
    }

    #[test]
    fn test_dealer_rotates_past_eliminated_seats() {
        let mut game = started_game(4);
        game.players[1].eliminated = true;
        game.setup_next_round(&mut ScriptedDice::default()).unwrap();
        assert_eq!(game.round, 2);
        assert_eq!(game.dealer_index, 2);
        assert_eq!(game.turn_player_id.as_deref(), Some("p3"));
        assert!(game.players[1].hand.is_empty());
        let sizes: Vec<usize> = game
            .players
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.hand.len())
            .collect();
        assert_eq!(sizes.iter().sum::<usize>(), 44);
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_setup_with_one_survivor_finishes() {
        let mut game = started_game(3);
        game.players[0].eliminated = true;
        game.players[2].eliminated = true;
        game.setup_next_round(&mut ScriptedDice::default()).unwrap();
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.phase, Phase::Finished);
        assert_eq!(game.turn_player_id, None);
        assert_eq!(game.winner_player_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_logs_are_bounded() {
        let mut game = Game::create("x".into(), settings(4), "c".into(), "Carol".into());
        for i in 0..(MAX_LOG_LINES + 25) {
            game.push_log(format!("line {i}"));
        }
        assert_eq!(game.logs.len(), MAX_LOG_LINES);
        assert!(game.logs.last().unwrap().ends_with(&format!("line {}", MAX_LOG_LINES + 24)));
        assert!(game.logs[0].contains(" UTC | "));
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut game = started_game(4);
        game.scratches.push(Scratch {
            order: 1,
            horse: 6,
            amount_cents: 25,
        });
        game.last_roll = Some(LastRoll {
            player_id: "p1".into(),
            player_name: "Player 1".into(),
            value: 6,
            phase: Phase::Scratch,
        });
        let json = serde_json::to_string(&game).unwrap();
        let decoded: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, game);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let game = Game::create("x".into(), settings(4), "c".into(), "Carol".into());
        let mut value = serde_json::to_value(&game).unwrap();
        value["surprise"] = serde_json::json!(true);
        assert!(serde_json::from_value::<Game>(value).is_err());
    }

    #[test]
    fn test_no_active_players_is_an_invariant_error() {
        assert_eq!(
            first_active_index(&[]),
            Err(InvariantError::NoActivePlayers)
        );
    }
}
