//! Persistent records stored in RocksDB.
//!
//! Each submodule owns one record family: its key layout, its serde type and
//! the load/store helpers. Writers take a [`Txn`](crate::storage::Txn) so a
//! request's changes land in one batch.

pub mod battle;
pub mod lottery;
pub mod stats;
pub mod users;
pub mod withdrawals;

pub use battle::{BattleParticipant, BattleRound, RoundStatus};
pub use lottery::LotteryTicket;
pub use stats::DailyStats;
pub use users::User;
pub use withdrawals::{Withdrawal, WithdrawalStatus};

/// Zero-padded so lexicographic key order matches numeric order
pub(crate) fn padded(n: u64) -> String {
    format!("{:020}", n)
}

#[cfg(test)]
pub(crate) fn temp_storage() -> (tempfile::TempDir, crate::storage::Storage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = crate::storage::Storage::open(dir.path()).unwrap();
    (dir, storage)
}
