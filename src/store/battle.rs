use super::padded;
use crate::{
    errors::CasinoResult,
    storage::{Storage, Txn},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ROUND_PREFIX: &str = "battle:round:";
const PARTICIPANT_PREFIX: &str = "battle:participant:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Waiting,
    Completed,
}

/// A battle round closes at `slot_ms`; it is settled exactly once after that
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRound {
    pub id: String,
    pub slot_ms: u64,
    pub status: RoundStatus,
    pub participant_count: usize,
    pub winner_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BattleRound {
    pub fn new(slot_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: round_id(slot_ms),
            slot_ms,
            status: RoundStatus::Waiting,
            participant_count: 0,
            winner_count: 0,
            created_at: now,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleParticipant {
    pub round_slot_ms: u64,
    pub telegram_id: i64,
    pub joined_at: DateTime<Utc>,
    /// Filled in at settlement
    #[serde(default)]
    pub is_winner: Option<bool>,
    #[serde(default)]
    pub reward: Option<u64>,
}

pub fn round_id(slot_ms: u64) -> String {
    format!("battle_{}", slot_ms)
}

fn round_key(slot_ms: u64) -> Vec<u8> {
    format!("{}{}", ROUND_PREFIX, padded(slot_ms)).into_bytes()
}

fn participant_prefix(slot_ms: u64) -> String {
    format!("{}{}:", PARTICIPANT_PREFIX, padded(slot_ms))
}

fn participant_key(slot_ms: u64, telegram_id: i64) -> Vec<u8> {
    format!("{}{}", participant_prefix(slot_ms), telegram_id).into_bytes()
}

pub fn load_round(storage: &Storage, slot_ms: u64) -> CasinoResult<Option<BattleRound>> {
    storage.get(&round_key(slot_ms))
}

pub fn txn_load_round(txn: &Txn<'_>, slot_ms: u64) -> CasinoResult<Option<BattleRound>> {
    txn.get(&round_key(slot_ms))
}

pub fn store_round(txn: &mut Txn<'_>, round: &BattleRound) -> CasinoResult<()> {
    txn.put(&round_key(round.slot_ms), round)
}

/// Waiting rounds whose deadline is at or before `now_ms`, oldest first
pub fn due_rounds(storage: &Storage, now_ms: u64) -> CasinoResult<Vec<BattleRound>> {
    let rounds: Vec<BattleRound> = storage.scan_records(ROUND_PREFIX.as_bytes())?;
    Ok(rounds
        .into_iter()
        .take_while(|r| r.slot_ms <= now_ms)
        .filter(|r| r.status == RoundStatus::Waiting)
        .collect())
}

pub fn txn_load_participant(
    txn: &Txn<'_>,
    slot_ms: u64,
    telegram_id: i64,
) -> CasinoResult<Option<BattleParticipant>> {
    txn.get(&participant_key(slot_ms, telegram_id))
}

pub fn store_participant(txn: &mut Txn<'_>, p: &BattleParticipant) -> CasinoResult<()> {
    txn.put(&participant_key(p.round_slot_ms, p.telegram_id), p)
}

pub fn load_participants(storage: &Storage, slot_ms: u64) -> CasinoResult<Vec<BattleParticipant>> {
    storage.scan_records(participant_prefix(slot_ms).as_bytes())
}
