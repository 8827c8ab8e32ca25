use super::CasinoService;
use crate::{
    draw,
    errors::{CasinoError, CasinoResult},
    games::BattleRewards,
    settlement::SettledRound,
    store::{
        battle::{self as rounds, BattleParticipant, BattleRound, RoundStatus},
        users,
    },
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleJoin {
    pub round_id: String,
    pub slot_ms: u64,
    pub ms_until_start: u64,
    pub participant_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStatus {
    pub round_id: String,
    pub slot_ms: u64,
    pub ms_until_start: u64,
    pub status: RoundStatus,
    pub participant_count: usize,
    pub winner_percent: f64,
    pub rewards: BattleRewards,
}

impl CasinoService {
    fn upcoming_battle_slot(&self) -> (u64, u64) {
        let now_ms = self.clock.now_ms();
        let slot_ms = draw::next_slot(now_ms, self.config.battle_interval().as_millis() as u64);
        (slot_ms, slot_ms - now_ms)
    }

    /// Enter the round that starts at the next battle slot
    pub fn join_battle(&self, telegram_id: i64) -> CasinoResult<BattleJoin> {
        let (slot_ms, ms_until_start) = self.upcoming_battle_slot();
        let now = self.clock.now();

        let round = self.storage.atomic(|txn| {
            users::require_user(txn, telegram_id)?;
            let mut round = rounds::txn_load_round(txn, slot_ms)?
                .unwrap_or_else(|| BattleRound::new(slot_ms, now));
            if round.status != RoundStatus::Waiting {
                return Err(CasinoError::conflict(format!("Round {} already settled", round.id)));
            }
            if rounds::txn_load_participant(txn, slot_ms, telegram_id)?.is_some() {
                return Err(CasinoError::conflict(format!(
                    "Already joined round {}",
                    round.id
                )));
            }

            rounds::store_participant(
                txn,
                &BattleParticipant {
                    round_slot_ms: slot_ms,
                    telegram_id,
                    joined_at: now,
                    is_winner: None,
                    reward: None,
                },
            )?;
            round.participant_count += 1;
            rounds::store_round(txn, &round)?;
            Ok(round)
        })?;

        info!(telegram_id, round = %round.id, participants = round.participant_count, "joined battle");
        Ok(BattleJoin {
            round_id: round.id,
            slot_ms,
            ms_until_start,
            participant_count: round.participant_count,
        })
    }

    pub fn current_battle(&self) -> CasinoResult<BattleStatus> {
        let (slot_ms, ms_until_start) = self.upcoming_battle_slot();
        let round = rounds::load_round(&self.storage, slot_ms)?
            .unwrap_or_else(|| BattleRound::new(slot_ms, self.clock.now()));

        Ok(BattleStatus {
            round_id: round.id,
            slot_ms,
            ms_until_start,
            status: round.status,
            participant_count: round.participant_count,
            winner_percent: self.config.battle.winner_percent,
            rewards: self.settlement.rewards(),
        })
    }

    /// Settle every round past its deadline
    pub fn process_battles(&self) -> CasinoResult<Vec<SettledRound>> {
        self.settlement.run_once()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_service;

    #[test]
    fn test_join_once_per_round() {
        let t = test_service();
        t.seed_user(1, 0);
        t.seed_user(2, 0);

        let first = t.service.join_battle(1).unwrap();
        assert_eq!(first.participant_count, 1);
        // 12:07 -> the 12:30 round.
        assert_eq!(first.ms_until_start, 23 * 60 * 1000);

        assert!(matches!(t.service.join_battle(1), Err(CasinoError::Conflict(_))));
        let second = t.service.join_battle(2).unwrap();
        assert_eq!(second.round_id, first.round_id);
        assert_eq!(second.participant_count, 2);

        let status = t.service.current_battle().unwrap();
        assert_eq!(status.participant_count, 2);
        assert_eq!(status.status, RoundStatus::Waiting);
        assert_eq!(status.rewards, BattleRewards { winner: 20, loser: 40 });
    }

    #[test]
    fn test_unknown_user_cannot_join() {
        let t = test_service();
        assert!(matches!(t.service.join_battle(5), Err(CasinoError::NotFound { .. })));
        assert_eq!(t.service.current_battle().unwrap().participant_count, 0);
    }

    #[test]
    fn test_process_after_deadline() {
        let t = test_service();
        for id in 1..=4 {
            t.seed_user(id, 0);
            t.service.join_battle(id).unwrap();
        }
        let joined = t.service.current_battle().unwrap();

        assert!(t.service.process_battles().unwrap().is_empty());

        t.clock.advance(joined.ms_until_start);
        let settled = t.service.process_battles().unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].participants, 4);
        assert_eq!(settled[0].winners, 2);

        let total: u64 = (1..=4).map(|id| t.coins(id)).sum();
        assert_eq!(total, 2 * 20 + 2 * 40);
        assert!(t.service.process_battles().unwrap().is_empty());
    }
}
