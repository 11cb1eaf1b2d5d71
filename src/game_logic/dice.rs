use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::types::Horse;

/// Source of every random decision the engine makes.
pub trait DiceSource {
    /// One fair six-sided die, 1..=6.
    fn roll_die(&mut self) -> u8;

    fn shuffle(&mut self, deck: &mut [Horse]);

    fn roll_sum(&mut self) -> Horse {
        self.roll_die() + self.roll_die()
    }
}

#[derive(Debug)]
pub struct RandomDice<R = StdRng> {
    rng: R,
}

impl RandomDice<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn shuffle(&mut self, deck: &mut [Horse]) {
        deck.shuffle(&mut self.rng);
    }
}

/// Replays queued dice sums and leaves the deck unshuffled.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedDice {
    dice: std::collections::VecDeque<u8>,
}

#[cfg(test)]
impl ScriptedDice {
    pub fn sums(sums: &[Horse]) -> Self {
        let mut dice = Self::default();
        dice.push_sums(sums);
        dice
    }

    pub fn push_sums(&mut self, sums: &[Horse]) {
        for &sum in sums {
            assert!((2..=12).contains(&sum), "impossible dice sum {sum}");
            let first = if sum <= 7 { 1 } else { sum - 6 };
            self.dice.push_back(first);
            self.dice.push_back(sum - first);
        }
    }

    pub fn remaining_sums(&self) -> usize {
        self.dice.len() / 2
    }
}

#[cfg(test)]
impl DiceSource for ScriptedDice {
    fn roll_die(&mut self) -> u8 {
        self.dice.pop_front().expect("scripted dice exhausted")
    }

    fn shuffle(&mut self, _deck: &mut [Horse]) {}
}
