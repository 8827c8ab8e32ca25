//! Battle round settlement
//!
//! A round past its deadline is settled in one write section: the round is
//! re-read under the write lock, every participant is paid, and the round is
//! marked completed in the same batch. A second run (or a concurrent one)
//! finds the round completed and skips it, so nobody is paid twice.

use crate::{
    common::Clock,
    config::BattleConfig,
    errors::{CasinoError, CasinoResult},
    games::{battle, BattleRewards, CoinSource},
    ledger::{self, CoinUpdate},
    metrics::CasinoMetrics,
    services::CasinoService,
    storage::Storage,
    store::{
        battle::{self as rounds, RoundStatus},
        stats, users,
    },
};
use rand::Rng;
use serde::Serialize;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Summary of one settled round
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledRound {
    pub round_id: String,
    pub slot_ms: u64,
    pub participants: usize,
    pub winners: usize,
    pub coins_awarded: u64,
}

#[derive(Clone)]
pub struct BattleSettlement {
    storage: Storage,
    config: BattleConfig,
    clock: Arc<dyn Clock>,
    metrics: Arc<CasinoMetrics>,
}

impl BattleSettlement {
    pub fn new(
        storage: Storage,
        config: BattleConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<CasinoMetrics>,
    ) -> Self {
        Self {
            storage,
            config,
            clock,
            metrics,
        }
    }

    pub fn rewards(&self) -> BattleRewards {
        BattleRewards {
            winner: self.config.winner_reward,
            loser: self.config.loser_reward,
        }
    }

    pub fn run_once(&self) -> CasinoResult<Vec<SettledRound>> {
        self.run_once_with_rng(&mut rand::thread_rng())
    }

    /// Settle every waiting round whose slot has passed, oldest first
    pub fn run_once_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> CasinoResult<Vec<SettledRound>> {
        self.metrics.settlement_runs.inc();
        let now_ms = self.clock.now_ms();

        let mut settled = Vec::new();
        for round in rounds::due_rounds(&self.storage, now_ms)? {
            if let Some(summary) = self.settle_round(round.slot_ms, rng)? {
                settled.push(summary);
            }
        }
        if !settled.is_empty() {
            info!(rounds = settled.len(), "battle rounds settled");
        }
        Ok(settled)
    }

    fn settle_round<R: Rng + ?Sized>(
        &self,
        slot_ms: u64,
        rng: &mut R,
    ) -> CasinoResult<Option<SettledRound>> {
        let now = self.clock.now();
        let rewards = self.rewards();

        let outcome = self.storage.atomic(|txn| {
            let Some(mut round) = rounds::txn_load_round(txn, slot_ms)? else {
                return Ok(None);
            };
            if round.status != RoundStatus::Waiting {
                debug!(round = %round.id, "round already settled");
                return Ok(None);
            }

            let mut participants = rounds::load_participants(txn.storage(), slot_ms)?;
            let ids: Vec<i64> = participants.iter().map(|p| p.telegram_id).collect();
            let winners: HashSet<i64> = battle::select_winners(&ids, self.config.winner_percent, rng)
                .into_iter()
                .collect();

            let mut updates: Vec<CoinUpdate> = Vec::with_capacity(participants.len());
            let mut coins_awarded = 0u64;
            for participant in participants.iter_mut() {
                let won = winners.contains(&participant.telegram_id);
                let reward = rewards.for_outcome(won);
                participant.is_winner = Some(won);

                if users::txn_load_user(txn, participant.telegram_id)?.is_none() {
                    warn!(
                        round = %round.id,
                        telegram_id = participant.telegram_id,
                        "participant has no user record, skipping reward"
                    );
                    participant.reward = Some(0);
                } else {
                    match ledger::credit(txn, participant.telegram_id, reward, CoinSource::Battle, now) {
                        Ok(update) => {
                            updates.push(update);
                            stats::record_game_played(txn, now.date_naive())?;
                            participant.reward = Some(reward);
                            coins_awarded = coins_awarded.saturating_add(reward);
                        }
                        // A balance at the cap cannot take the reward; the round still settles.
                        Err(CasinoError::Validation(reason)) => {
                            warn!(
                                round = %round.id,
                                telegram_id = participant.telegram_id,
                                %reason,
                                "reward not credited"
                            );
                            participant.reward = Some(0);
                        }
                        Err(e) => return Err(e),
                    }
                }
                rounds::store_participant(txn, participant)?;
            }

            round.status = RoundStatus::Completed;
            round.participant_count = participants.len();
            round.winner_count = winners.len();
            round.completed_at = Some(now);
            rounds::store_round(txn, &round)?;

            Ok(Some((
                SettledRound {
                    round_id: round.id,
                    slot_ms,
                    participants: participants.len(),
                    winners: winners.len(),
                    coins_awarded,
                },
                updates,
            )))
        })?;

        let Some((summary, updates)) = outcome else {
            return Ok(None);
        };
        for update in &updates {
            self.metrics.record_coins(CoinSource::Battle.as_str(), update.applied);
            self.metrics.record_game(CoinSource::Battle.as_str());
        }
        self.metrics.rounds_settled.inc();
        info!(
            round = %summary.round_id,
            participants = summary.participants,
            winners = summary.winners,
            coins = summary.coins_awarded,
            "battle round settled"
        );
        Ok(Some(summary))
    }
}

/// Periodic settlement and mines session cleanup
pub fn spawn_scheduler(service: Arc<CasinoService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        info!("Settlement scheduler running every {:?}", period);

        loop {
            interval.tick().await;

            if let Err(e) = service.process_battles() {
                error!("Battle settlement failed: {}", e);
            }
            service.expire_mines_sessions();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::ManualClock,
        store::{
            battle::{store_participant, store_round, BattleParticipant, BattleRound},
            temp_storage,
            users::{load_user, store_user, User},
        },
    };
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    const SLOT: u64 = 1_800_000;

    fn settlement(storage: &Storage, now_ms: u64) -> BattleSettlement {
        BattleSettlement::new(
            storage.clone(),
            BattleConfig::default(),
            Arc::new(ManualClock::new(now_ms)),
            Arc::new(CasinoMetrics::new().unwrap()),
        )
    }

    fn seed_round(storage: &Storage, players: i64) {
        let now = Utc::now();
        storage
            .atomic(|txn| {
                let mut round = BattleRound::new(SLOT, now);
                for id in 1..=players {
                    store_user(txn, &User::new(id, 0, now))?;
                    store_participant(
                        txn,
                        &BattleParticipant {
                            round_slot_ms: SLOT,
                            telegram_id: id,
                            joined_at: now,
                            is_winner: None,
                            reward: None,
                        },
                    )?;
                    round.participant_count += 1;
                }
                store_round(txn, &round)
            })
            .unwrap();
    }

    #[test]
    fn test_round_before_deadline_untouched() {
        let (_dir, storage) = temp_storage();
        seed_round(&storage, 3);
        let settled = settlement(&storage, SLOT - 1)
            .run_once_with_rng(&mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(settled.is_empty());
    }

    #[test]
    fn test_settles_half_as_winners() {
        let (_dir, storage) = temp_storage();
        seed_round(&storage, 10);
        let settled = settlement(&storage, SLOT)
            .run_once_with_rng(&mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].winners, 5);
        assert_eq!(settled[0].coins_awarded, 5 * 20 + 5 * 40);

        let participants = rounds::load_participants(&storage, SLOT).unwrap();
        assert_eq!(participants.iter().filter(|p| p.is_winner == Some(true)).count(), 5);
        for p in participants {
            let user = load_user(&storage, p.telegram_id).unwrap().unwrap();
            assert_eq!(Some(user.coins), p.reward);
        }
        let round = rounds::load_round(&storage, SLOT).unwrap().unwrap();
        assert_eq!(round.status, RoundStatus::Completed);
        assert_eq!(round.winner_count, 5);
    }

    #[test]
    fn test_second_run_pays_nothing() {
        let (_dir, storage) = temp_storage();
        seed_round(&storage, 4);
        let job = settlement(&storage, SLOT + 10);
        job.run_once_with_rng(&mut StdRng::seed_from_u64(2)).unwrap();
        let before: u64 = (1..=4)
            .map(|id| load_user(&storage, id).unwrap().unwrap().coins)
            .sum();

        assert!(job.run_once_with_rng(&mut StdRng::seed_from_u64(3)).unwrap().is_empty());
        let after: u64 = (1..=4)
            .map(|id| load_user(&storage, id).unwrap().unwrap().coins)
            .sum();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_round_completes() {
        let (_dir, storage) = temp_storage();
        seed_round(&storage, 0);
        let settled = settlement(&storage, SLOT)
            .run_once_with_rng(&mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(settled[0].participants, 0);
        assert_eq!(settled[0].winners, 0);
        let round = rounds::load_round(&storage, SLOT).unwrap().unwrap();
        assert_eq!(round.status, RoundStatus::Completed);
    }

    #[test]
    fn test_single_player_wins() {
        let (_dir, storage) = temp_storage();
        seed_round(&storage, 1);
        let settled = settlement(&storage, SLOT)
            .run_once_with_rng(&mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(settled[0].winners, 1);
        assert_eq!(load_user(&storage, 1).unwrap().unwrap().coins, 20);
    }
}
