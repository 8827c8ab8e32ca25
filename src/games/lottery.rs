//! Lottery tickets and the match-count reward table

use crate::errors::{CasinoError, CasinoResult};

/// Payout for 0..=6 matching numbers
const MATCH_REWARDS: [u64; 7] = [10, 20, 30, 40, 50, 60, 70];

/// Every drawn number matched
pub const JACKPOT_MATCHES: usize = 7;
pub const JACKPOT_REWARD: u64 = 1_000;

/// Coins for `matches` hits. Counts outside the table pay the base reward.
pub fn reward_for_matches(matches: usize) -> u64 {
    if matches == JACKPOT_MATCHES {
        return JACKPOT_REWARD;
    }
    MATCH_REWARDS.get(matches).copied().unwrap_or(MATCH_REWARDS[0])
}

/// How many ticket numbers appear in the draw
pub fn count_matches(ticket: &[u32], drawn: &[u32]) -> usize {
    ticket.iter().filter(|n| drawn.contains(n)).count()
}

/// Check a ticket against the draw shape and return it sorted
pub fn validate_ticket(numbers: &[u32], count: usize, max: u32) -> CasinoResult<Vec<u32>> {
    if numbers.len() != count {
        return Err(CasinoError::validation(format!(
            "A ticket needs exactly {} numbers, got {}",
            count,
            numbers.len()
        )));
    }
    if let Some(bad) = numbers.iter().find(|n| !(1..=max).contains(*n)) {
        return Err(CasinoError::validation(format!(
            "Number {} is outside 1..={}",
            bad, max
        )));
    }

    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(CasinoError::validation("Ticket numbers must be unique"));
    }
    Ok(sorted)
}
