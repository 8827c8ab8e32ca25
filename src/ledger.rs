//! Coin balance mutations
//!
//! Every change to a user's coins goes through here, inside a write section,
//! so balance, lifetime winnings and the daily counters move together.

use crate::{
    errors::{CasinoError, CasinoResult},
    games::CoinSource,
    storage::Txn,
    store::{stats, users},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest balance a user can hold; keeps every signed change representable
pub const MAX_BALANCE: u64 = i64::MAX as u64;

/// Balance after a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinUpdate {
    pub telegram_id: i64,
    pub new_coins: u64,
    pub new_total_winnings: u64,
    /// Signed change actually applied after clamping
    pub applied: i64,
}

/// Add `delta` coins (negative removes), clamping the balance at zero.
///
/// With `update_stats`, positive amounts also grow lifetime winnings and the
/// day's awarded or spent totals move by the applied change.
pub fn adjust(
    txn: &mut Txn<'_>,
    telegram_id: i64,
    delta: i64,
    source: CoinSource,
    update_stats: bool,
    now: DateTime<Utc>,
) -> CasinoResult<CoinUpdate> {
    let mut user = users::require_user(txn, telegram_id)?;

    let old = user.coins;
    user.coins = if delta >= 0 {
        old.checked_add(delta as u64)
            .filter(|c| *c <= MAX_BALANCE)
            .ok_or_else(|| {
                CasinoError::validation(format!(
                    "Balance of user {} cannot exceed {} coins",
                    telegram_id, MAX_BALANCE
                ))
            })?
    } else {
        old.saturating_sub(delta.unsigned_abs())
    };
    // Both balances are <= MAX_BALANCE, so the difference fits in i64.
    let applied = (user.coins as i128 - old as i128) as i64;

    if update_stats && delta > 0 {
        user.total_winnings = user.total_winnings.saturating_add(delta as u64);
    }
    user.updated_at = now;
    users::store_user(txn, &user)?;

    if update_stats {
        stats::update_stats(txn, now.date_naive(), |s| {
            if applied > 0 {
                s.coins_awarded = s.coins_awarded.saturating_add(applied as u64);
            } else {
                s.coins_spent = s.coins_spent.saturating_add(applied.unsigned_abs());
            }
        })?;
    }

    tracing::debug!(
        telegram_id,
        source = source.as_str(),
        delta,
        applied,
        balance = user.coins,
        "coins adjusted"
    );

    Ok(CoinUpdate {
        telegram_id,
        new_coins: user.coins,
        new_total_winnings: user.total_winnings,
        applied,
    })
}

/// Credit a reward; always counted in lifetime winnings and daily stats
pub fn credit(
    txn: &mut Txn<'_>,
    telegram_id: i64,
    amount: u64,
    source: CoinSource,
    now: DateTime<Utc>,
) -> CasinoResult<CoinUpdate> {
    adjust(txn, telegram_id, to_delta(amount)?, source, true, now)
}

/// Remove exactly `amount` coins or fail without touching the balance
pub fn debit(
    txn: &mut Txn<'_>,
    telegram_id: i64,
    amount: u64,
    source: CoinSource,
    now: DateTime<Utc>,
) -> CasinoResult<CoinUpdate> {
    let user = users::require_user(txn, telegram_id)?;
    if user.coins < amount {
        return Err(CasinoError::InsufficientFunds {
            balance: user.coins,
            required: amount,
        });
    }
    adjust(txn, telegram_id, -to_delta(amount)?, source, true, now)
}

/// Return coins taken by an earlier debit without counting them as winnings
pub fn refund(
    txn: &mut Txn<'_>,
    telegram_id: i64,
    amount: u64,
    source: CoinSource,
    now: DateTime<Utc>,
) -> CasinoResult<CoinUpdate> {
    adjust(txn, telegram_id, to_delta(amount)?, source, false, now)
}

pub(crate) fn to_delta(amount: u64) -> CasinoResult<i64> {
    i64::try_from(amount).map_err(|_| CasinoError::validation(format!("Amount {} too large", amount)))
}
