// Seat arithmetic over the fixed seating order. Eliminated seats are skipped.
use super::error::InvariantError;
use super::types::Player;

pub(crate) fn active_indexes(players: &[Player]) -> Vec<usize> {
    players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_active())
        .map(|(idx, _)| idx)
        .collect()
}

pub(crate) fn first_active_index(players: &[Player]) -> Result<usize, InvariantError> {
    players
        .iter()
        .position(Player::is_active)
        .ok_or(InvariantError::NoActivePlayers)
}

/// The next active seat strictly after `after`, wrapping around. May return
/// `after` itself when it is the only active seat.
pub(crate) fn next_active_index(players: &[Player], after: usize) -> Result<usize, InvariantError> {
    let count = players.len();
    (1..=count)
        .map(|step| (after + step) % count)
        .find(|&idx| players[idx].is_active())
        .ok_or(InvariantError::NoActivePlayers)
}
