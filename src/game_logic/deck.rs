use super::error::InvariantError;
use super::seating::next_active_index;
use super::types::{FIRST_HORSE, Horse, LAST_HORSE, Player};

pub const COPIES_PER_HORSE: usize = 4;

/// Four cards for every horse, 44 in total, in ascending order.
pub fn build_deck() -> Vec<Horse> {
    (FIRST_HORSE..=LAST_HORSE)
        .flat_map(|horse| std::iter::repeat_n(horse, COPIES_PER_HORSE))
        .collect()
}

/// Deals the whole deck one card at a time, starting with the seat after the
/// dealer and skipping eliminated seats. Cards come off the end of the deck.
pub(crate) fn deal_round_robin(
    players: &mut [Player],
    mut deck: Vec<Horse>,
    dealer_index: usize,
) -> Result<(), InvariantError> {
    let mut current = next_active_index(players, dealer_index)?;
    while let Some(card) = deck.pop() {
        players[current].hand.push(card);
        current = next_active_index(players, current)?;
    }
    Ok(())
}

pub(crate) fn assert_balanced_hands(players: &[Player]) -> Result<(), InvariantError> {
    let counts: Vec<usize> = players
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.hand.len())
        .collect();
    if counts.len() <= 1 {
        return Ok(());
    }
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    if max - min > 1 {
        return Err(InvariantError::DealingImbalance { min, max });
    }
    Ok(())
}
