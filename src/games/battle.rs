//! Battle royale winner selection

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Coins paid to each participant once a round settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRewards {
    pub winner: u64,
    pub loser: u64,
}

impl BattleRewards {
    pub fn for_outcome(&self, won: bool) -> u64 {
        if won {
            self.winner
        } else {
            self.loser
        }
    }
}

/// `max(1, round(participants × percent))`, never more than `participants`
pub fn winner_count(participants: usize, winner_percent: f64) -> usize {
    if participants == 0 {
        return 0;
    }
    let scaled = (participants as f64 * winner_percent).round() as usize;
    scaled.clamp(1, participants)
}

/// Shuffle a copy of `participants` and keep the first `winner_count` entries
pub fn select_winners<T: Clone, R: Rng + ?Sized>(
    participants: &[T],
    winner_percent: f64,
    rng: &mut R,
) -> Vec<T> {
    let mut pool = participants.to_vec();
    pool.shuffle(rng);
    pool.truncate(winner_count(participants.len(), winner_percent));
    pool
}
