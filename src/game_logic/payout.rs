// src/game_logic/payout.rs
use super::dice::DiceSource;
use super::error::{InvariantError, Result};
use super::game::Game;
use super::seating::active_indexes;
use super::types::add_cents;

/// Splits `pot_cents` across `(seat, shares)` pairs listed in seat order.
///
/// Every holder gets `shares * (pot / total_shares)`. The remainder goes to
/// the first seat holding at least one share. Returns the credit per seat;
/// empty when nobody holds a share or the pot is empty.
pub fn split_pot(pot_cents: i64, shares: &[(usize, usize)]) -> Vec<(usize, i64)> {
    let total_shares: i64 = shares.iter().map(|&(_, count)| count as i64).sum();
    if total_shares <= 0 || pot_cents <= 0 {
        return Vec::new();
    }
    let per_share = pot_cents / total_shares;
    let mut remainder = pot_cents % total_shares;

    let mut credits = Vec::new();
    for &(seat, count) in shares.iter().filter(|(_, count)| *count > 0) {
        let mut credit = count as i64 * per_share;
        if remainder > 0 {
            credit += remainder;
            remainder = 0;
        }
        credits.push((seat, credit));
    }
    credits
}

impl Game {
    /// Pays the pot out to holders of the winning horse, eliminates broke
    /// players and either deals the next round or ends the game.
    pub(crate) fn resolve_payout_and_round_end(&mut self, dice: &mut dyn DiceSource) -> Result<()> {
        let horse = self.winner_horse.ok_or(InvariantError::MissingWinnerHorse)?;

        let shares: Vec<(usize, usize)> = active_indexes(&self.players)
            .into_iter()
            .map(|idx| (idx, self.players[idx].cards_of(horse)))
            .collect();
        let credits = split_pot(self.pot_cents, &shares);
        if credits.is_empty() && self.pot_cents > 0 {
            tracing::info!(
                game.id = %self.id,
                pot.cents = self.pot_cents,
                winner.horse = horse,
                "Nobody held the winning horse, pot forfeited"
            );
        }
        for (idx, credit) in credits {
            let player = &mut self.players[idx];
            player.balance_cents = add_cents(player.balance_cents, credit)?;
        }
        self.pot_cents = 0;

        let mut eliminated = 0u32;
        let mut eliminated_names = Vec::new();
        for player in self.players.iter_mut() {
            if player.is_active() && player.balance_cents <= 0 {
                player.eliminated = true;
                eliminated += 1;
                eliminated_names.push(player.name.clone());
            }
        }
        for name in eliminated_names {
            self.push_log(format!("{} was eliminated", name));
        }

        if eliminated > 0 {
            self.elimination_multiplier = 2_i64
                .checked_pow(eliminated)
                .and_then(|factor| self.elimination_multiplier.checked_mul(factor))
                .ok_or(InvariantError::MultiplierOverflow { eliminated })?;
            self.push_log(format!(
                "Scratched horse amounts doubled x{}",
                self.elimination_multiplier
            ));
        }

        let remaining = active_indexes(&self.players);
        if remaining.len() <= 1 {
            self.finish(&remaining);
            return Ok(());
        }
        self.setup_next_round(dice)
    }
}
