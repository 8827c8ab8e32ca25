//! Fortune wheel

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Coin value of each of the eight segments, clockwise from the pointer
pub const SEGMENTS: [u64; 8] = [10, 5, 30, 10, 5, 30, 10, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelSpin {
    pub segment: usize,
    pub reward: u64,
}

/// Every segment is equally likely
pub fn spin<R: Rng + ?Sized>(rng: &mut R) -> WheelSpin {
    let segment = rng.gen_range(0..SEGMENTS.len());
    WheelSpin {
        segment,
        reward: SEGMENTS[segment],
    }
}
