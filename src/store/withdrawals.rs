use super::padded;
use crate::{
    errors::{CasinoError, CasinoResult},
    storage::{Storage, Txn},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const WITHDRAWAL_PREFIX: &str = "withdrawal:id:";
const USER_INDEX_PREFIX: &str = "withdrawal:user:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Paid,
    Rejected,
}

impl WithdrawalStatus {
    /// `pending → approved → paid`, `pending → rejected`
    pub fn can_transition_to(self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (WithdrawalStatus::Pending, WithdrawalStatus::Approved)
                | (WithdrawalStatus::Pending, WithdrawalStatus::Rejected)
                | (WithdrawalStatus::Approved, WithdrawalStatus::Paid)
        )
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Paid => "paid",
            WithdrawalStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: String,
    pub telegram_id: i64,
    pub amount: u64,
    #[serde(default)]
    pub wallet_address: Option<String>,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Withdrawal {
    /// Move to `next`, rejecting anything outside the state machine
    pub fn transition(&mut self, next: WithdrawalStatus, now: DateTime<Utc>) -> CasinoResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CasinoError::validation(format!(
                "Withdrawal {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

fn withdrawal_key(id: &str) -> Vec<u8> {
    format!("{}{}", WITHDRAWAL_PREFIX, id).into_bytes()
}

fn user_prefix(telegram_id: i64) -> String {
    format!("{}{}:", USER_INDEX_PREFIX, telegram_id)
}

fn user_index_key(w: &Withdrawal) -> Vec<u8> {
    // Newest first: invert the creation time.
    let inv_ms = u64::MAX - w.created_at.timestamp_millis().max(0) as u64;
    format!("{}{}:{}", user_prefix(w.telegram_id), padded(inv_ms), w.id).into_bytes()
}

pub fn load_withdrawal(storage: &Storage, id: &str) -> CasinoResult<Option<Withdrawal>> {
    storage.get(&withdrawal_key(id))
}

pub fn txn_load_withdrawal(txn: &Txn<'_>, id: &str) -> CasinoResult<Withdrawal> {
    txn.get(&withdrawal_key(id))?
        .ok_or_else(|| CasinoError::not_found("Withdrawal", id))
}

/// Insert or update; the per-user index entry is written alongside
pub fn store_withdrawal(txn: &mut Txn<'_>, w: &Withdrawal) -> CasinoResult<()> {
    txn.put(&withdrawal_key(&w.id), w)?;
    txn.put_marker(&user_index_key(w));
    Ok(())
}

/// A user's withdrawals, newest first
pub fn list_for_user(storage: &Storage, telegram_id: i64) -> CasinoResult<Vec<Withdrawal>> {
    let prefix = user_prefix(telegram_id);
    let mut out = Vec::new();
    for (key, _) in storage.scan_prefix(prefix.as_bytes())? {
        let key = String::from_utf8_lossy(&key);
        let Some(id) = key.rsplit(':').next() else {
            continue;
        };
        if let Some(w) = load_withdrawal(storage, id)? {
            out.push(w);
        }
    }
    Ok(out)
}

/// Every withdrawal in `status`, oldest first
pub fn list_by_status(storage: &Storage, status: WithdrawalStatus) -> CasinoResult<Vec<Withdrawal>> {
    let mut all: Vec<Withdrawal> = storage.scan_records(WITHDRAWAL_PREFIX.as_bytes())?;
    all.retain(|w| w.status == status);
    all.sort_by_key(|w| w.created_at);
    Ok(all)
}
