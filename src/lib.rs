//! tgcasino - rewards backend for a Telegram Mini App casino
//!
//! Time-slotted lottery draws from a deterministic generator, instant games
//! (wheel, mystery box, mines), battle rounds settled by a background job,
//! and the coin ledger and withdrawal queue behind them.

pub mod api;
pub mod common;
pub mod config;
pub mod draw;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod services;
pub mod settlement;
pub mod storage;
pub mod store;

pub use config::CasinoConfig;
pub use errors::{CasinoError, CasinoResult};
pub use services::CasinoService;
pub use storage::Storage;
