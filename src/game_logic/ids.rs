use rand::Rng;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;

use super::error::InvariantError;

const ADJECTIVES: [&str; 10] = [
    "red", "blue", "gold", "fast", "lucky", "wild", "swift", "brisk", "eager", "prime",
];
const NOUNS: [&str; 10] = [
    "track", "hoof", "sprint", "derby", "streak", "stride", "pacer", "thunder", "gallop", "stable",
];

pub const GAME_ID_ATTEMPTS: usize = 100;

/// Picks a readable id such as `lucky-gallop-417` that `exists` reports as
/// unused.
pub fn generate_game_id<R, F>(rng: &mut R, mut exists: F) -> Result<String, InvariantError>
where
    R: Rng,
    F: FnMut(&str) -> bool,
{
    for _ in 0..GAME_ID_ATTEMPTS {
        let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("red");
        let noun = NOUNS.choose(rng).copied().unwrap_or("track");
        let number: u16 = rng.gen_range(100..=999);
        let candidate = format!("{adjective}-{noun}-{number}");
        if !exists(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!(game.id = %candidate, "Game id collision, retrying");
    }
    Err(InvariantError::GameIdExhausted {
        attempts: GAME_ID_ATTEMPTS,
    })
}

/// 16 lowercase hex characters from the operating system RNG.
pub fn new_player_id() -> String {
    let bytes: [u8; 8] = OsRng.r#gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
