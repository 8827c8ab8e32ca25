pub mod battle;
pub mod lottery;
pub mod mines;
pub mod mystery_box;
pub mod types;
pub mod wheel;

pub use battle::BattleRewards;
pub use mines::{MinesBoard, RevealOutcome};
pub use types::*;
