use super::CasinoService;
use crate::{
    errors::{CasinoError, CasinoResult},
    games::{mystery_box, wheel, CoinSource},
    ledger,
    store::{stats, users},
};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelResult {
    pub segment: usize,
    pub reward: u64,
    pub new_coins: u64,
    pub next_spin_at_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxResult {
    pub tier: usize,
    pub price: u64,
    pub reward: u64,
    pub new_coins: u64,
}

impl CasinoService {
    pub fn spin_wheel(&self, telegram_id: i64) -> CasinoResult<WheelResult> {
        self.spin_wheel_with_rng(telegram_id, &mut rand::thread_rng())
    }

    /// One free spin per cooldown window
    pub fn spin_wheel_with_rng<R: Rng + ?Sized>(
        &self,
        telegram_id: i64,
        rng: &mut R,
    ) -> CasinoResult<WheelResult> {
        let now = self.clock.now();
        let now_ms = self.clock.now_ms();
        let cooldown_ms = self.config.wheel.cooldown_secs * 1000;

        let (spin, update) = self.storage.atomic(|txn| {
            let mut user = users::require_user(txn, telegram_id)?;
            if let Some(last) = user.last_wheel_spin_ms {
                let ready_at = last + cooldown_ms;
                if now_ms < ready_at {
                    return Err(CasinoError::validation(format!(
                        "Wheel available again in {}s",
                        (ready_at - now_ms).div_ceil(1000)
                    )));
                }
            }
            user.last_wheel_spin_ms = Some(now_ms);
            users::store_user(txn, &user)?;

            let spin = wheel::spin(rng);
            let update = ledger::credit(txn, telegram_id, spin.reward, CoinSource::Wheel, now)?;
            stats::record_game_played(txn, now.date_naive())?;
            Ok((spin, update))
        })?;

        self.record_coins(CoinSource::Wheel, &update);
        self.metrics.record_game(CoinSource::Wheel.as_str());
        Ok(WheelResult {
            segment: spin.segment,
            reward: spin.reward,
            new_coins: update.new_coins,
            next_spin_at_ms: now_ms + cooldown_ms,
        })
    }

    pub fn open_box(&self, telegram_id: i64) -> CasinoResult<BoxResult> {
        self.open_box_with_rng(telegram_id, &mut rand::thread_rng())
    }

    /// Pay the box price and credit a weighted-tier reward
    pub fn open_box_with_rng<R: Rng + ?Sized>(
        &self,
        telegram_id: i64,
        rng: &mut R,
    ) -> CasinoResult<BoxResult> {
        let now = self.clock.now();
        let price = self.config.mystery_box.price;

        let (opening, debit, credit) = self.storage.atomic(|txn| {
            let debit = ledger::debit(txn, telegram_id, price, CoinSource::MysteryBox, now)?;
            let opening = mystery_box::open(rng);
            let credit = ledger::credit(txn, telegram_id, opening.reward, CoinSource::MysteryBox, now)?;
            stats::record_game_played(txn, now.date_naive())?;
            Ok((opening, debit, credit))
        })?;

        self.record_coins(CoinSource::MysteryBox, &debit);
        self.record_coins(CoinSource::MysteryBox, &credit);
        self.metrics.record_game(CoinSource::MysteryBox.as_str());
        Ok(BoxResult {
            tier: opening.tier,
            price,
            reward: opening.reward,
            new_coins: credit.new_coins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{games::wheel::SEGMENTS, services::testing::test_service};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_wheel_cooldown() {
        let t = test_service();
        t.seed_user(1, 0);
        let mut rng = StdRng::seed_from_u64(3);

        let spin = t.service.spin_wheel_with_rng(1, &mut rng).unwrap();
        assert_eq!(spin.reward, SEGMENTS[spin.segment]);
        assert_eq!(t.coins(1), spin.reward);

        assert!(matches!(
            t.service.spin_wheel_with_rng(1, &mut rng),
            Err(CasinoError::Validation(_))
        ));

        t.clock.advance(24 * 60 * 60 * 1000);
        let second = t.service.spin_wheel_with_rng(1, &mut rng).unwrap();
        assert_eq!(t.coins(1), spin.reward + second.reward);
        assert_eq!(t.service.daily_stats(None).unwrap().games_played, 1);
    }

    #[test]
    fn test_box_charges_price() {
        let t = test_service();
        t.seed_user(1, 10);
        let mut rng = StdRng::seed_from_u64(11);

        let opened = t.service.open_box_with_rng(1, &mut rng).unwrap();
        assert!(opened.reward >= 1);
        assert_eq!(opened.new_coins, opened.reward);
        assert_eq!(t.coins(1), opened.reward);
    }

    #[test]
    fn test_box_needs_funds() {
        let t = test_service();
        t.seed_user(1, 9);
        let err = t
            .service
            .open_box_with_rng(1, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, CasinoError::InsufficientFunds { .. }));
        assert_eq!(t.coins(1), 9);
    }
}
