//! Time-slotted draws
//!
//! Every client derives the same draw from wall-clock time alone: the slot
//! boundary identifies the draw and seeds its numbers.

pub mod numbers;
pub mod slot;

pub use numbers::{generate_draw_numbers, seed_commitment, Lcg};
pub use slot::{current_slot, draw_id, next_slot, parse_draw_id, DrawSlot};
