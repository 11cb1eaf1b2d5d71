// src/game_logic/roll.rs
use super::dice::DiceSource;
use super::error::{InvariantError, Result, RuleError};
use super::game::Game;
use super::seating::next_active_index;
use super::types::{GameStatus, Horse, LastRoll, Phase, Scratch, add_cents, horse_label, money};

pub const SCRATCHES_PER_ROUND: usize = 4;
pub const SCRATCH_DRAW_ATTEMPTS: usize = 100;

impl Game {
    /// Rolls for `player_id`, who must hold the current turn.
    pub fn roll_for_player(&mut self, player_id: &str, dice: &mut dyn DiceSource) -> Result<()> {
        if self.status != GameStatus::InProgress {
            return Err(RuleError::NotActive.into());
        }
        match self.turn_player_id.as_deref() {
            None => return Err(RuleError::NoCurrentTurn.into()),
            Some(turn) if turn != player_id => return Err(RuleError::NotYourTurn.into()),
            Some(_) => {}
        }
        let player = self
            .player(player_id)
            .ok_or_else(|| RuleError::PlayerNotFound(player_id.to_string()))?;
        if player.eliminated {
            return Err(RuleError::Eliminated.into());
        }
        self.roll_current_turn(dice)
    }

    /// Resolves one roll for whoever holds the turn, without caller checks.
    pub(crate) fn roll_current_turn(&mut self, dice: &mut dyn DiceSource) -> Result<()> {
        let turn_id = self
            .turn_player_id
            .clone()
            .ok_or(RuleError::NoCurrentTurn)?;
        let roller = self
            .player_index(&turn_id)
            .ok_or(InvariantError::UnknownTurnPlayer(turn_id))?;

        match self.phase {
            Phase::Scratch => {
                self.apply_scratch_roll(roller, dice)?;
                if self.scratches.len() >= SCRATCHES_PER_ROUND {
                    self.phase = Phase::Race;
                    self.push_log("Race started");
                }
                self.advance_turn(roller)
            }
            Phase::Race => self.apply_race_roll(roller, dice),
            other => Err(RuleError::InvalidPhase(other).into()),
        }
    }

    pub fn scratch_for(&self, horse: Horse) -> Option<&Scratch> {
        self.scratches.iter().find(|s| s.horse == horse)
    }

    /// Per-card penalty for the scratch at `order` under the current multiplier.
    pub fn scratch_amount_cents(&self, order: u8) -> i64 {
        self.standard_bet_cents
            .saturating_mul(i64::from(order))
            .saturating_mul(self.elimination_multiplier)
    }

    fn advance_turn(&mut self, from: usize) -> Result<()> {
        let next = next_active_index(&self.players, from)?;
        self.turn_player_id = Some(self.players[next].id.clone());
        Ok(())
    }

    fn draw_unscratched_horse(&self, dice: &mut dyn DiceSource) -> Result<Horse, InvariantError> {
        for _ in 0..SCRATCH_DRAW_ATTEMPTS {
            let sum = dice.roll_sum();
            if self.scratch_for(sum).is_none() {
                return Ok(sum);
            }
        }
        Err(InvariantError::ScratchAssignmentExhausted {
            attempts: SCRATCH_DRAW_ATTEMPTS,
        })
    }

    fn apply_scratch_roll(&mut self, roller: usize, dice: &mut dyn DiceSource) -> Result<()> {
        let order = self.scratches.len() as u8 + 1;
        let horse = self.draw_unscratched_horse(dice)?;
        let amount_cents = self.scratch_amount_cents(order);

        let state = self
            .horses
            .get_mut(&horse)
            .ok_or(InvariantError::UnknownHorse(horse))?;
        state.scratched_order = Some(order);
        state.position = -i32::from(order);
        self.scratches.push(Scratch {
            order,
            horse,
            amount_cents,
        });

        let mut collected = 0;
        for player in self.players.iter_mut().filter(|p| p.is_active()) {
            let held = player.cards_of(horse);
            if held == 0 {
                continue;
            }
            let paid = player.pay(amount_cents.saturating_mul(held as i64));
            self.pot_cents = add_cents(self.pot_cents, paid)?;
            collected = add_cents(collected, paid)?;
            player.hand.retain(|&card| card != horse);
        }

        let roller = &self.players[roller];
        let roller_name = roller.name.clone();
        self.last_roll = Some(LastRoll {
            player_id: roller.id.clone(),
            player_name: roller_name.clone(),
            value: horse,
            phase: Phase::Scratch,
        });

        tracing::debug!(
            game.id = %self.id,
            scratch.order = order,
            scratch.horse = horse,
            scratch.collected_cents = collected,
            "Horse scratched"
        );
        self.push_log(format!(
            "{} scratched horse {} for {} each card, collected {}",
            roller_name,
            horse_label(horse),
            money(amount_cents),
            money(collected)
        ));
        Ok(())
    }

    fn apply_race_roll(&mut self, roller: usize, dice: &mut dyn DiceSource) -> Result<()> {
        let sum = dice.roll_sum();
        let roller_name = self.players[roller].name.clone();
        self.last_roll = Some(LastRoll {
            player_id: self.players[roller].id.clone(),
            player_name: roller_name.clone(),
            value: sum,
            phase: Phase::Race,
        });

        // A scratched horse costs the roller alone one flat penalty.
        if let Some(penalty) = self.scratch_for(sum).map(|s| s.amount_cents) {
            let paid = self.players[roller].pay(penalty);
            self.pot_cents = add_cents(self.pot_cents, paid)?;
            self.push_log(format!(
                "{} rolled {} (scratched) and paid {}",
                roller_name,
                sum,
                money(paid)
            ));
            return self.advance_turn(roller);
        }

        let state = self
            .horses
            .get_mut(&sum)
            .ok_or(InvariantError::UnknownHorse(sum))?;
        state.position += 1;
        let finished = state.position >= state.steps;
        self.push_log(format!("{} rolled {}, horse moved", roller_name, sum));

        if finished {
            self.winner_horse = Some(sum);
            self.push_log(format!("Horse {} won the race", horse_label(sum)));
            return self.resolve_payout_and_round_end(dice);
        }
        self.advance_turn(roller)
    }
}
