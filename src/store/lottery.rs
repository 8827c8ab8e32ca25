use super::padded;
use crate::{
    errors::CasinoResult,
    storage::{Storage, Txn},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TICKET_PREFIX: &str = "lottery:ticket:";

/// One player's picks for one draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryTicket {
    pub draw_slot_ms: u64,
    pub telegram_id: i64,
    pub numbers: Vec<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub claimed: Option<TicketClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketClaim {
    pub matches: usize,
    pub reward: u64,
    pub claimed_at: DateTime<Utc>,
}

fn draw_prefix(slot_ms: u64) -> String {
    format!("{}{}:", TICKET_PREFIX, padded(slot_ms))
}

fn ticket_key(slot_ms: u64, telegram_id: i64) -> Vec<u8> {
    format!("{}{}", draw_prefix(slot_ms), telegram_id).into_bytes()
}

pub fn txn_load_ticket(txn: &Txn<'_>, slot_ms: u64, telegram_id: i64) -> CasinoResult<Option<LotteryTicket>> {
    txn.get(&ticket_key(slot_ms, telegram_id))
}

pub fn store_ticket(txn: &mut Txn<'_>, ticket: &LotteryTicket) -> CasinoResult<()> {
    txn.put(&ticket_key(ticket.draw_slot_ms, ticket.telegram_id), ticket)
}

/// Number of tickets sold for a draw
pub fn count_tickets(storage: &Storage, slot_ms: u64) -> CasinoResult<usize> {
    Ok(storage.scan_prefix(draw_prefix(slot_ms).as_bytes())?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_storage;

    #[test]
    fn test_tickets_are_per_draw() {
        let (_dir, storage) = temp_storage();
        let ticket = LotteryTicket {
            draw_slot_ms: 900_000,
            telegram_id: 1,
            numbers: vec![1, 2, 3, 4, 5, 6, 7],
            created_at: Utc::now(),
            claimed: None,
        };
        storage.atomic(|txn| store_ticket(txn, &ticket)).unwrap();

        storage
            .atomic(|txn| {
                assert_eq!(txn_load_ticket(txn, 900_000, 1)?, Some(ticket.clone()));
                assert_eq!(txn_load_ticket(txn, 1_800_000, 1)?, None);
                Ok(())
            })
            .unwrap();
        assert_eq!(count_tickets(&storage, 900_000).unwrap(), 1);
        assert_eq!(count_tickets(&storage, 1_800_000).unwrap(), 0);
    }
}
