// src/game_logic/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::InvariantError;

/// A horse is identified by the dice sum it runs for, 2 through 12.
pub type Horse = u8;

pub const FIRST_HORSE: Horse = 2;
pub const LAST_HORSE: Horse = 12;

/// Track length per horse. Rarer sums run shorter races.
pub const HORSE_STEPS: [(Horse, i32); 11] = [
    (2, 2),
    (3, 5),
    (4, 7),
    (5, 10),
    (6, 13),
    (7, 16),
    (8, 13),
    (9, 10),
    (10, 7),
    (11, 5),
    (12, 2),
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Scratch,
    Race,
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Scratch => "scratch",
            Phase::Race => "race",
            Phase::Finished => "finished",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub is_npc: bool,
    pub eliminated: bool,
    pub balance_cents: i64,
    pub hand: Vec<Horse>,
}

impl Player {
    pub fn new(id: String, name: String, is_npc: bool, balance_cents: i64) -> Self {
        Self {
            id,
            name,
            is_npc,
            eliminated: false,
            balance_cents,
            hand: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    pub fn cards_of(&self, horse: Horse) -> usize {
        self.hand.iter().filter(|&&card| card == horse).count()
    }

    /// Takes up to `amount_cents` from the balance and returns what was
    /// actually paid. A short balance is capped, never driven negative.
    pub(crate) fn pay(&mut self, amount_cents: i64) -> i64 {
        let paid = amount_cents.min(self.balance_cents).max(0);
        self.balance_cents -= paid;
        paid
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HorseState {
    pub steps: i32,
    /// Distance advanced, or `-order` once scratched.
    pub position: i32,
    pub scratched_order: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scratch {
    pub order: u8,
    pub horse: Horse,
    pub amount_cents: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LastRoll {
    pub player_id: String,
    pub player_name: String,
    pub value: Horse,
    pub phase: Phase,
}

pub fn new_horse_state() -> BTreeMap<Horse, HorseState> {
    HORSE_STEPS
        .iter()
        .map(|&(horse, steps)| {
            (
                horse,
                HorseState {
                    steps,
                    position: 0,
                    scratched_order: None,
                },
            )
        })
        .collect()
}

pub fn horse_label(horse: Horse) -> String {
    match horse {
        11 => "J (11)".to_string(),
        12 => "Q (12)".to_string(),
        other => other.to_string(),
    }
}

/// Adds two cent amounts, failing instead of wrapping.
pub(crate) fn add_cents(total: i64, amount: i64) -> Result<i64, InvariantError> {
    total
        .checked_add(amount)
        .ok_or(InvariantError::AmountOverflow)
}

pub fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
