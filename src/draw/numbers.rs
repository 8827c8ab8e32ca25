//! Deterministic draw numbers
//!
//! The generator is a plain LCG seeded by the slot time. Anyone who knows the
//! slot can compute the numbers in advance, so this gives agreement between
//! clients, not unpredictability.

use super::slot::draw_id;
use sha2::{Digest, Sha256};

const LCG_MULTIPLIER: f64 = 1_103_515_245.0;
const LCG_INCREMENT: f64 = 12_345.0;
const LCG_MODULUS: f64 = 2_147_483_648.0; // 2^31, i.e. `& 0x7fffffff`

/// Linear congruential generator `seed = (seed * 1103515245 + 12345) & 0x7fffffff`.
///
/// The product is evaluated in f64 before truncation, the same way the browser
/// clients evaluate it, so both sides walk an identical sequence.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seed from a slot start time: whole seconds since the epoch
    pub fn for_slot(slot_ms: u64) -> Self {
        Self::new((slot_ms / 1000) as u32)
    }

    pub fn next_u31(&mut self) -> u32 {
        let raw = self.state as f64 * LCG_MULTIPLIER + LCG_INCREMENT;
        self.state = (raw % LCG_MODULUS) as u32;
        self.state
    }

    /// Next value mapped onto `1..=max`
    pub fn next_in_range(&mut self, max: u32) -> u32 {
        self.next_u31() % max + 1
    }
}

/// Upper bound on generator steps per requested number
const MAX_STEPS_PER_NUMBER: usize = 1_000;

/// `count` distinct numbers in `1..=max` for the draw at `slot_ms`, ascending.
///
/// Returns an empty vector when no such draw exists: `count` is zero, larger
/// than `max`, or the generator cannot reach enough distinct values. The f64
/// rounding zeroes the low bits of large states, so an even `max` only ever
/// yields odd numbers.
pub fn generate_draw_numbers(slot_ms: u64, count: usize, max: u32) -> Vec<u32> {
    if count == 0 || max == 0 || count > max as usize {
        return Vec::new();
    }

    let mut lcg = Lcg::for_slot(slot_ms);
    let mut numbers = Vec::with_capacity(count);
    let mut steps = 0;
    while numbers.len() < count {
        if steps == count * MAX_STEPS_PER_NUMBER {
            return Vec::new();
        }
        steps += 1;

        let candidate = lcg.next_in_range(max);
        if !numbers.contains(&candidate) {
            numbers.push(candidate);
        }
    }
    numbers.sort_unstable();
    numbers
}

/// SHA-256 of the draw id, hex encoded
pub fn seed_commitment(slot_ms: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(draw_id(slot_ms).as_bytes());
    hex::encode(hasher.finalize())
}
