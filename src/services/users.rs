use super::CasinoService;
use crate::{
    errors::{CasinoError, CasinoResult},
    games::CoinSource,
    ledger::{self, CoinUpdate},
    store::{
        stats::{self, DailyStats},
        users::{self, User},
    },
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Identity fields sent by the Mini App on launch
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUser {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub referrer_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCheck {
    pub subscribed: bool,
    pub bonus_awarded: bool,
    pub reward: u64,
    pub new_coins: u64,
}

impl CasinoService {
    /// Create the user on first launch, otherwise refresh the profile fields.
    ///
    /// A first sync naming another existing user as referrer credits that
    /// user's referral bonus.
    pub fn sync_user(&self, req: SyncUser) -> CasinoResult<User> {
        if req.telegram_id <= 0 {
            return Err(CasinoError::validation("telegramId must be positive"));
        }
        let now = self.clock.now();
        let bonus = self.config.rewards.referral_bonus;

        let (user, referral) = self.storage.atomic(|txn| {
            if let Some(mut user) = users::txn_load_user(txn, req.telegram_id)? {
                if req.username.is_some() {
                    user.username = req.username.clone();
                }
                if req.first_name.is_some() {
                    user.first_name = req.first_name.clone();
                }
                if req.last_name.is_some() {
                    user.last_name = req.last_name.clone();
                }
                user.updated_at = now;
                users::store_user(txn, &user)?;
                return Ok((user, None));
            }

            let mut user = User::new(req.telegram_id, self.config.rewards.starting_coins, now);
            user.username = req.username.clone();
            user.first_name = req.first_name.clone();
            user.last_name = req.last_name.clone();

            let referrer = match req.referrer_id {
                Some(id) if id != req.telegram_id => users::txn_load_user(txn, id)?,
                _ => None,
            };
            user.referred_by = referrer.as_ref().map(|r| r.telegram_id);
            users::store_user(txn, &user)?;
            stats::update_stats(txn, now.date_naive(), |s| s.new_users += 1)?;

            let referral = match referrer {
                Some(mut referrer) => {
                    referrer.referral_count += 1;
                    users::store_user(txn, &referrer)?;
                    let delta = ledger::to_delta(bonus)?;
                    Some(ledger::adjust(txn, referrer.telegram_id, delta, CoinSource::Referral, false, now)?)
                }
                None => None,
            };
            Ok((user, referral))
        })?;

        if let Some(update) = referral {
            self.record_coins(CoinSource::Referral, &update);
            info!(
                telegram_id = user.telegram_id,
                referrer = update.telegram_id,
                "referral credited"
            );
        }
        Ok(user)
    }

    pub fn get_user(&self, telegram_id: i64) -> CasinoResult<User> {
        users::load_user(&self.storage, telegram_id)?
            .ok_or_else(|| CasinoError::not_found("User", telegram_id))
    }

    /// Apply a client-reported balance change; the result never goes below zero.
    ///
    /// With `update_stats`, positive amounts count as winnings and game
    /// sources count one game played for the day.
    pub fn update_coins(
        &self,
        telegram_id: i64,
        amount: i64,
        source: CoinSource,
        update_stats: bool,
    ) -> CasinoResult<CoinUpdate> {
        let now = self.clock.now();
        let update = self.storage.atomic(|txn| {
            let update = ledger::adjust(txn, telegram_id, amount, source, update_stats, now)?;
            if update_stats && source.is_game() {
                stats::record_game_played(txn, now.date_naive())?;
            }
            Ok(update)
        })?;

        self.record_coins(source, &update);
        if update_stats && source.is_game() {
            self.metrics.record_game(source.as_str());
        }
        Ok(update)
    }

    /// Award the channel bonus the first time the user is seen subscribed
    pub async fn check_channel(&self, telegram_id: i64) -> CasinoResult<ChannelCheck> {
        // Fail fast on unknown users before asking the membership source.
        self.get_user(telegram_id)?;
        let subscribed = self.membership.is_member(telegram_id).await?;
        let bonus = self.config.rewards.channel_bonus;
        let now = self.clock.now();

        let (awarded, user) = self.storage.atomic(|txn| {
            let mut user = users::require_user(txn, telegram_id)?;
            if !subscribed || user.channel_bonus_claimed {
                return Ok((None, user));
            }
            user.channel_bonus_claimed = true;
            users::store_user(txn, &user)?;
            let update = ledger::adjust(txn, telegram_id, ledger::to_delta(bonus)?, CoinSource::Channel, false, now)?;
            let user = users::require_user(txn, telegram_id)?;
            Ok((Some(update), user))
        })?;

        if let Some(update) = &awarded {
            self.record_coins(CoinSource::Channel, update);
            info!(telegram_id, bonus, "channel bonus awarded");
        }
        Ok(ChannelCheck {
            subscribed,
            bonus_awarded: awarded.is_some(),
            reward: if awarded.is_some() { bonus } else { 0 },
            new_coins: user.coins,
        })
    }

    /// Counters for `date`, or today (UTC) when absent
    pub fn daily_stats(&self, date: Option<NaiveDate>) -> CasinoResult<DailyStats> {
        let date = date.unwrap_or_else(|| self.clock.now().date_naive());
        stats::load_stats(&self.storage, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_service;

    fn sync(telegram_id: i64, referrer_id: Option<i64>) -> SyncUser {
        SyncUser {
            telegram_id,
            username: Some(format!("user{}", telegram_id)),
            referrer_id,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_sync_creates_user() {
        let t = test_service();
        let user = t.service.sync_user(sync(1, None)).unwrap();
        assert_eq!(user.telegram_id, 1);
        assert_eq!(user.coins, 0);
        assert_eq!(t.service.daily_stats(None).unwrap().new_users, 1);

        // A second sync only refreshes the profile.
        let again = t
            .service
            .sync_user(SyncUser {
                telegram_id: 1,
                username: Some("renamed".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(again.username.as_deref(), Some("renamed"));
        assert_eq!(t.service.daily_stats(None).unwrap().new_users, 1);
    }

    #[test]
    fn test_referral_credits_referrer_once() {
        let t = test_service();
        t.service.sync_user(sync(1, None)).unwrap();
        let invited = t.service.sync_user(sync(2, Some(1))).unwrap();
        assert_eq!(invited.referred_by, Some(1));

        let referrer = t.service.get_user(1).unwrap();
        assert_eq!(referrer.referral_count, 1);
        assert_eq!(referrer.coins, 50);

        // Re-syncing the invited user does not pay again.
        t.service.sync_user(sync(2, Some(1))).unwrap();
        assert_eq!(t.coins(1), 50);
    }

    #[test]
    fn test_self_and_unknown_referrers_ignored() {
        let t = test_service();
        let own = t.service.sync_user(sync(3, Some(3))).unwrap();
        assert_eq!(own.referred_by, None);
        let orphan = t.service.sync_user(sync(4, Some(999))).unwrap();
        assert_eq!(orphan.referred_by, None);
        assert_eq!(t.coins(3), 0);
    }

    #[test]
    fn test_get_unknown_user() {
        let t = test_service();
        assert!(matches!(
            t.service.get_user(42).unwrap_err(),
            CasinoError::NotFound { .. }
        ));
    }

    #[test]
    fn test_update_coins_clamps_and_counts_games() {
        let t = test_service();
        t.seed_user(1, 5);

        let update = t.service.update_coins(1, -20, CoinSource::Bonus, false).unwrap();
        assert_eq!(update.new_coins, 0);

        let update = t.service.update_coins(1, 30, CoinSource::Wheel, true).unwrap();
        assert_eq!(update.new_coins, 30);
        assert_eq!(update.new_total_winnings, 30);

        let stats = t.service.daily_stats(None).unwrap();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.coins_awarded, 30);
    }

    #[tokio::test]
    async fn test_channel_bonus_once() {
        let t = test_service();
        // Member list in tests is [7].
        t.seed_user(7, 0);
        t.seed_user(8, 0);

        let first = t.service.check_channel(7).await.unwrap();
        assert!(first.subscribed && first.bonus_awarded);
        assert_eq!(first.new_coins, 100);

        let second = t.service.check_channel(7).await.unwrap();
        assert!(second.subscribed);
        assert!(!second.bonus_awarded);
        assert_eq!(t.coins(7), 100);

        let outsider = t.service.check_channel(8).await.unwrap();
        assert!(!outsider.subscribed && !outsider.bonus_awarded);
    }
}
