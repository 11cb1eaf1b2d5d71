use super::dice::DiceSource;
use super::error::Result;
use super::game::Game;
use super::types::GameStatus;

impl Game {
    /// Resolves turns for NPC seats until a human holds the turn or the game
    /// is over. At most `roll_limit` rolls are made; the game resumes from
    /// where it stopped on the next call. Returns the number of rolls made.
    pub fn autoplay_npc_turns(&mut self, dice: &mut dyn DiceSource, roll_limit: usize) -> Result<usize> {
        let mut rolls = 0;
        while self.status == GameStatus::InProgress {
            let Some(turn_id) = self.turn_player_id.as_deref() else {
                break;
            };
            match self.player(turn_id) {
                Some(player) if player.is_npc => {}
                _ => break,
            }
            if rolls >= roll_limit {
                tracing::warn!(
                    game.id = %self.id,
                    autoplay.rolls = rolls,
                    players.active = self.active_player_count(),
                    "NPC autoplay roll limit reached, pausing"
                );
                break;
            }
            self.roll_current_turn(dice)?;
            rolls += 1;
        }
        if rolls > 0 {
            tracing::debug!(game.id = %self.id, autoplay.rolls = rolls, "NPC turns resolved");
        }
        Ok(rolls)
    }
}
