use serde::Serialize;
use std::collections::BTreeMap;

use super::game::Game;
use super::types::{GameStatus, Horse, HorseState, LastRoll, Phase, Scratch};

/// How many of the most recent log lines a view carries.
pub const VIEW_LOG_LINES: usize = 40;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub is_npc: bool,
    pub eliminated: bool,
    pub balance_cents: i64,
    pub hand_count: usize,
    /// Only populated for the viewer's own seat.
    pub hand: Vec<Horse>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerView {
    pub id: String,
    pub name: String,
    pub eliminated: bool,
    pub balance_cents: i64,
    pub hand: Vec<Horse>,
    pub can_roll: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    pub name: String,
    pub status: GameStatus,
    pub round: u32,
    pub phase: Phase,
    pub pot_cents: i64,
    pub standard_bet_cents: i64,
    pub elimination_multiplier: i64,
    pub turn_player_id: Option<String>,
    pub turn_player_name: Option<String>,
    pub horses: BTreeMap<Horse, HorseState>,
    pub scratches: Vec<Scratch>,
    pub last_roll: Option<LastRoll>,
    pub winner_horse: Option<Horse>,
    pub winner_player_id: Option<String>,
    pub viewer: Option<ViewerView>,
    pub players: Vec<PlayerView>,
    pub logs: Vec<String>,
}

impl Game {
    /// Snapshot of the table as seen by `viewer_id`. Only the viewer's own
    /// hand is revealed; every other seat shows a card count.
    pub fn view(&self, viewer_id: Option<&str>) -> GameView {
        let viewer = viewer_id.and_then(|id| self.player(id)).map(|p| ViewerView {
            id: p.id.clone(),
            name: p.name.clone(),
            eliminated: p.eliminated,
            balance_cents: p.balance_cents,
            hand: p.hand.clone(),
            can_roll: self.status == GameStatus::InProgress
                && self.turn_player_id.as_deref() == Some(p.id.as_str()),
        });

        let players = self
            .players
            .iter()
            .map(|p| {
                let is_viewer = viewer_id == Some(p.id.as_str());
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    is_npc: p.is_npc,
                    eliminated: p.eliminated,
                    balance_cents: p.balance_cents,
                    hand_count: p.hand.len(),
                    hand: if is_viewer { p.hand.clone() } else { Vec::new() },
                }
            })
            .collect();

        let log_start = self.logs.len().saturating_sub(VIEW_LOG_LINES);

        GameView {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            round: self.round,
            phase: self.phase,
            pot_cents: self.pot_cents,
            standard_bet_cents: self.standard_bet_cents,
            elimination_multiplier: self.elimination_multiplier,
            turn_player_id: self.turn_player_id.clone(),
            turn_player_name: self
                .turn_player_id
                .as_deref()
                .and_then(|id| self.player(id))
                .map(|p| p.name.clone()),
            horses: self.horses.clone(),
            scratches: self.scratches.clone(),
            last_roll: self.last_roll.clone(),
            winner_horse: self.winner_horse,
            winner_player_id: self.winner_player_id.clone(),
            viewer,
            players,
            logs: self.logs[log_start..].to_vec(),
        }
    }
}
