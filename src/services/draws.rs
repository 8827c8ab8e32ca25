use super::CasinoService;
use crate::{
    draw::{self, DrawSlot},
    errors::{CasinoError, CasinoResult},
    games::{lottery, CoinSource, GameType},
    ledger,
    store::{
        lottery::{self as tickets, LotteryTicket, TicketClaim},
        stats, users,
    },
};
use serde::Serialize;
use tracing::info;

/// Schedule snapshot for a timed game
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDraw {
    pub game: GameType,
    #[serde(flatten)]
    pub slot: DrawSlot,
    pub current_draw_id: String,
    pub next_draw_id: String,
    /// Lottery only: the draw that started at the current slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_draw: Option<DrawResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_seed_commitment: Option<String>,
    /// Lottery only: tickets entered for the next draw so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets_sold: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub draw_id: String,
    pub slot_ms: u64,
    pub numbers: Vec<u32>,
    pub seed_commitment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReceipt {
    pub draw_id: String,
    pub draw_at_ms: u64,
    pub numbers: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketClaimResult {
    pub draw_id: String,
    pub numbers: Vec<u32>,
    pub drawn_numbers: Vec<u32>,
    pub matches: usize,
    pub reward: u64,
    pub new_coins: u64,
}

impl CasinoService {
    fn lottery_interval_ms(&self) -> u64 {
        self.config.lottery_interval().as_millis() as u64
    }

    fn battle_interval_ms(&self) -> u64 {
        self.config.battle_interval().as_millis() as u64
    }

    fn lottery_result(&self, slot_ms: u64) -> DrawResult {
        DrawResult {
            draw_id: draw::draw_id(slot_ms),
            slot_ms,
            numbers: draw::generate_draw_numbers(
                slot_ms,
                self.config.lottery.numbers_per_draw,
                self.config.lottery.max_number,
            ),
            seed_commitment: draw::seed_commitment(slot_ms),
        }
    }

    pub fn current_draw(&self, game: GameType) -> CasinoResult<CurrentDraw> {
        let interval_ms = match game {
            GameType::Lottery => self.lottery_interval_ms(),
            GameType::Battle => self.battle_interval_ms(),
            other => {
                return Err(CasinoError::validation(format!(
                    "{} has no draw schedule",
                    other
                )))
            }
        };
        let slot = DrawSlot::at(self.clock.now_ms(), interval_ms);
        let is_lottery = game == GameType::Lottery;
        let tickets_sold = if is_lottery {
            Some(tickets::count_tickets(&self.storage, slot.next_slot_ms)?)
        } else {
            None
        };

        Ok(CurrentDraw {
            game,
            current_draw_id: slot.current_draw_id(),
            next_draw_id: slot.next_draw_id(),
            last_draw: is_lottery.then(|| self.lottery_result(slot.current_slot_ms)),
            next_seed_commitment: is_lottery.then(|| draw::seed_commitment(slot.next_slot_ms)),
            tickets_sold,
            slot,
        })
    }

    /// Numbers of a lottery draw that has already started
    pub fn draw_by_id(&self, draw_id: &str) -> CasinoResult<DrawResult> {
        let slot_ms = self.started_lottery_slot(draw_id)?;
        Ok(self.lottery_result(slot_ms))
    }

    fn started_lottery_slot(&self, draw_id: &str) -> CasinoResult<u64> {
        let slot_ms = draw::parse_draw_id(draw_id)
            .ok_or_else(|| CasinoError::validation(format!("Malformed draw id {}", draw_id)))?;
        let schedule = DrawSlot::at(self.clock.now_ms(), self.lottery_interval_ms());
        if !schedule.is_aligned(slot_ms) {
            return Err(CasinoError::validation(format!(
                "{} is not on the lottery schedule",
                draw_id
            )));
        }
        if slot_ms > self.clock.now_ms() {
            return Err(CasinoError::validation(format!(
                "Draw {} has not happened yet",
                draw_id
            )));
        }
        Ok(slot_ms)
    }

    /// Enter the next lottery draw; one ticket per user per draw
    pub fn buy_ticket(&self, telegram_id: i64, numbers: &[u32]) -> CasinoResult<TicketReceipt> {
        let numbers = lottery::validate_ticket(
            numbers,
            self.config.lottery.numbers_per_draw,
            self.config.lottery.max_number,
        )?;
        let now = self.clock.now();
        let slot_ms = draw::next_slot(self.clock.now_ms(), self.lottery_interval_ms());

        let ticket = self.storage.atomic(|txn| {
            users::require_user(txn, telegram_id)?;
            if tickets::txn_load_ticket(txn, slot_ms, telegram_id)?.is_some() {
                return Err(CasinoError::conflict(format!(
                    "Already holding a ticket for {}",
                    draw::draw_id(slot_ms)
                )));
            }
            let ticket = LotteryTicket {
                draw_slot_ms: slot_ms,
                telegram_id,
                numbers,
                created_at: now,
                claimed: None,
            };
            tickets::store_ticket(txn, &ticket)?;
            Ok(ticket)
        })?;

        Ok(TicketReceipt {
            draw_id: draw::draw_id(ticket.draw_slot_ms),
            draw_at_ms: ticket.draw_slot_ms,
            numbers: ticket.numbers,
        })
    }

    /// Score a ticket against its draw and credit the reward, once
    pub fn claim_ticket(&self, telegram_id: i64, draw_id: &str) -> CasinoResult<TicketClaimResult> {
        let slot_ms = self.started_lottery_slot(draw_id)?;
        let drawn = self.lottery_result(slot_ms).numbers;
        let now = self.clock.now();

        let (ticket, matches, reward, update) = self.storage.atomic(|txn| {
            let mut ticket = tickets::txn_load_ticket(txn, slot_ms, telegram_id)?
                .ok_or_else(|| CasinoError::not_found("Ticket", format!("{}/{}", draw_id, telegram_id)))?;
            if ticket.claimed.is_some() {
                return Err(CasinoError::validation(format!(
                    "Ticket for {} already claimed",
                    draw_id
                )));
            }

            let matches = lottery::count_matches(&ticket.numbers, &drawn);
            let reward = lottery::reward_for_matches(matches);
            ticket.claimed = Some(TicketClaim {
                matches,
                reward,
                claimed_at: now,
            });
            tickets::store_ticket(txn, &ticket)?;
            let update = ledger::credit(txn, telegram_id, reward, CoinSource::Lottery, now)?;
            stats::record_game_played(txn, now.date_naive())?;
            Ok((ticket, matches, reward, update))
        })?;

        self.record_coins(CoinSource::Lottery, &update);
        self.metrics.record_game(CoinSource::Lottery.as_str());
        info!(telegram_id, draw_id, matches, reward, "lottery ticket claimed");

        Ok(TicketClaimResult {
            draw_id: draw_id.to_string(),
            numbers: ticket.numbers,
            drawn_numbers: drawn,
            matches,
            reward,
            new_coins: update.new_coins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{test_service, NOW_MS};

    const FIFTEEN_MIN: u64 = 15 * 60 * 1000;

    #[test]
    fn test_current_lottery_draw() {
        let t = test_service();
        let current = t.service.current_draw(GameType::Lottery).unwrap();
        // 12:07 sits in the 12:00 bucket.
        assert_eq!(current.slot.current_slot_ms, NOW_MS - 7 * 60 * 1000);
        assert_eq!(current.slot.next_slot_ms, current.slot.current_slot_ms + FIFTEEN_MIN);

        let last = current.last_draw.unwrap();
        assert_eq!(last.numbers.len(), 7);
        assert_eq!(last.draw_id, current.current_draw_id);
        assert!(current.next_seed_commitment.is_some());
    }

    #[test]
    fn test_tickets_sold_counts_next_draw() {
        let t = test_service();
        t.seed_user(1, 0);
        t.seed_user(2, 0);
        let before = t.service.current_draw(GameType::Lottery).unwrap();
        assert_eq!(before.tickets_sold, Some(0));

        t.service.buy_ticket(1, &[1, 2, 3, 4, 5, 6, 7]).unwrap();
        t.service.buy_ticket(2, &[8, 9, 10, 11, 12, 13, 14]).unwrap();
        assert_eq!(t.service.current_draw(GameType::Lottery).unwrap().tickets_sold, Some(2));

        // Those tickets belong to the draw that is now current.
        t.clock.advance(FIFTEEN_MIN);
        assert_eq!(t.service.current_draw(GameType::Lottery).unwrap().tickets_sold, Some(0));
        assert_eq!(t.service.current_draw(GameType::Battle).unwrap().tickets_sold, None);
    }

    #[test]
    fn test_battle_schedule_has_no_numbers() {
        let t = test_service();
        let current = t.service.current_draw(GameType::Battle).unwrap();
        assert_eq!(current.slot.interval_ms, 30 * 60 * 1000);
        assert!(current.last_draw.is_none());
        assert!(t.service.current_draw(GameType::Wheel).is_err());
    }

    #[test]
    fn test_future_draw_is_hidden() {
        let t = test_service();
        let current = t.service.current_draw(GameType::Lottery).unwrap();

        let past = t.service.draw_by_id(&current.current_draw_id).unwrap();
        assert_eq!(past, current.last_draw.unwrap());
        assert!(matches!(
            t.service.draw_by_id(&current.next_draw_id),
            Err(CasinoError::Validation(_))
        ));
        assert!(t.service.draw_by_id("draw_123").is_err());
        assert!(t.service.draw_by_id("nonsense").is_err());
    }

    #[test]
    fn test_ticket_lifecycle() {
        let t = test_service();
        t.seed_user(1, 0);

        let receipt = t.service.buy_ticket(1, &[7, 6, 5, 4, 3, 2, 1]).unwrap();
        assert_eq!(receipt.numbers, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(matches!(
            t.service.buy_ticket(1, &[1, 2, 3, 4, 5, 6, 8]),
            Err(CasinoError::Conflict(_))
        ));

        // Not drawn yet.
        assert!(t.service.claim_ticket(1, &receipt.draw_id).is_err());

        t.clock.set(receipt.draw_at_ms + 1);
        let claim = t.service.claim_ticket(1, &receipt.draw_id).unwrap();
        let expected = lottery::count_matches(&claim.numbers, &claim.drawn_numbers);
        assert_eq!(claim.matches, expected);
        assert_eq!(claim.reward, lottery::reward_for_matches(expected));
        assert_eq!(t.coins(1), claim.reward);

        assert!(matches!(
            t.service.claim_ticket(1, &receipt.draw_id),
            Err(CasinoError::Validation(_))
        ));
        assert_eq!(t.coins(1), claim.reward);
    }

    #[test]
    fn test_claim_without_ticket() {
        let t = test_service();
        t.seed_user(1, 0);
        let current = t.service.current_draw(GameType::Lottery).unwrap();
        assert!(matches!(
            t.service.claim_ticket(1, &current.current_draw_id),
            Err(CasinoError::NotFound { .. })
        ));
    }

    #[test]
    fn test_bad_ticket_rejected() {
        let t = test_service();
        t.seed_user(1, 0);
        assert!(t.service.buy_ticket(1, &[1, 2, 3]).is_err());
        assert!(t.service.buy_ticket(1, &[1, 2, 3, 4, 5, 6, 50]).is_err());
        assert!(t.service.buy_ticket(2, &[1, 2, 3, 4, 5, 6, 7]).is_err());
    }
}
