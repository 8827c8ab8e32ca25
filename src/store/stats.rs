use crate::{
    errors::CasinoResult,
    storage::{Storage, Txn},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const STATS_PREFIX: &str = "stats:daily:";

/// Per-day counters, keyed by UTC date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub new_users: u64,
    pub games_played: u64,
    pub coins_awarded: u64,
    pub coins_spent: u64,
    pub withdrawals_requested: u64,
    pub withdrawn_amount: u64,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            ..Default::default()
        }
    }
}

fn stats_key(date: NaiveDate) -> Vec<u8> {
    format!("{}{}", STATS_PREFIX, date.format("%Y-%m-%d")).into_bytes()
}

pub fn load_stats(storage: &Storage, date: NaiveDate) -> CasinoResult<DailyStats> {
    Ok(storage
        .get(&stats_key(date))?
        .unwrap_or_else(|| DailyStats::empty(date)))
}

/// Read-modify-write the day's counters inside a write section
pub fn update_stats<F>(txn: &mut Txn<'_>, date: NaiveDate, f: F) -> CasinoResult<()>
where
    F: FnOnce(&mut DailyStats),
{
    let key = stats_key(date);
    let mut stats = txn
        .get::<DailyStats>(&key)?
        .unwrap_or_else(|| DailyStats::empty(date));
    f(&mut stats);
    txn.put(&key, &stats)
}

/// Count one finished game for the day
pub fn record_game_played(txn: &mut Txn<'_>, date: NaiveDate) -> CasinoResult<()> {
    update_stats(txn, date, |s| s.games_played += 1)
}
