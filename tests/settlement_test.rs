//! Battle settlement against a real RocksDB directory

use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tgcasino::{
    common::{ManualClock, StaticMembership},
    config::BattleConfig,
    metrics::CasinoMetrics,
    settlement::BattleSettlement,
    store::{battle, users},
    CasinoConfig, CasinoService, Storage,
};

/// 2024-01-01T12:07:00Z
const NOW_MS: u64 = 1_704_110_820_000;
const THIRTY_MIN: u64 = 30 * 60 * 1000;

fn service(storage: Storage, clock: Arc<ManualClock>) -> CasinoService {
    CasinoService::new(
        storage,
        Arc::new(CasinoConfig::default()),
        clock,
        Arc::new(CasinoMetrics::new().unwrap()),
        Arc::new(StaticMembership::default()),
    )
}

fn join_players(service: &CasinoService, players: i64) {
    for id in 1..=players {
        service
            .sync_user(tgcasino::services::SyncUser {
                telegram_id: id,
                ..Default::default()
            })
            .unwrap();
        service.join_battle(id).unwrap();
    }
}

fn total_coins(storage: &Storage, players: i64) -> u64 {
    (1..=players)
        .map(|id| users::load_user(storage, id).unwrap().unwrap().coins)
        .sum()
}

#[test]
fn test_ten_players_five_winners() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let casino = service(storage.clone(), clock.clone());
    join_players(&casino, 10);

    // 12:07 -> the round closes at 12:30.
    clock.set(NOW_MS - 7 * 60 * 1000 + THIRTY_MIN);
    let settled = casino
        .settlement()
        .run_once_with_rng(&mut StdRng::seed_from_u64(42))
        .unwrap();

    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].participants, 10);
    assert_eq!(settled[0].winners, 5);
    assert_eq!(total_coins(&storage, 10), 5 * 20 + 5 * 40);

    let round = battle::load_round(&storage, settled[0].slot_ms).unwrap().unwrap();
    assert_eq!(round.status, battle::RoundStatus::Completed);
    assert_eq!(round.winner_count, 5);
}

#[test]
fn test_repeated_and_parallel_runs_pay_once() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let casino = service(storage.clone(), clock.clone());
    join_players(&casino, 6);
    clock.advance(THIRTY_MIN);

    // Two independent job instances over the same database, as two
    // overlapping scheduler ticks would be.
    let jobs: Vec<BattleSettlement> = (0..4)
        .map(|_| {
            BattleSettlement::new(
                storage.clone(),
                BattleConfig::default(),
                clock.clone(),
                Arc::new(CasinoMetrics::new().unwrap()),
            )
        })
        .collect();

    let settled: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .enumerate()
            .map(|(i, job)| {
                scope.spawn(move || {
                    job.run_once_with_rng(&mut StdRng::seed_from_u64(i as u64))
                        .unwrap()
                        .len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(settled, 1);
    assert_eq!(total_coins(&storage, 6), 3 * 20 + 3 * 40);

    assert!(casino.process_battles().unwrap().is_empty());
    assert_eq!(total_coins(&storage, 6), 3 * 20 + 3 * 40);
}

#[test]
fn test_rounds_settle_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let casino = service(storage.clone(), clock.clone());

    join_players(&casino, 2);
    clock.advance(THIRTY_MIN);
    casino.join_battle(1).unwrap();
    clock.advance(THIRTY_MIN);

    let settled = casino.process_battles().unwrap();
    assert_eq!(settled.len(), 2);
    assert!(settled[0].slot_ms < settled[1].slot_ms);
    assert_eq!(settled[0].participants, 2);
    assert_eq!(settled[1].participants, 1);
    // A lone player always wins.
    assert_eq!(settled[1].winners, 1);
}

#[test]
fn test_capped_balance_does_not_block_round() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let casino = service(storage.clone(), clock.clone());
    join_players(&casino, 2);
    casino
        .update_coins(1, i64::MAX, tgcasino::games::CoinSource::Admin, false)
        .unwrap();
    clock.advance(THIRTY_MIN);

    let settled = casino
        .settlement()
        .run_once_with_rng(&mut StdRng::seed_from_u64(3))
        .unwrap();
    assert_eq!(settled.len(), 1);

    let round = battle::load_round(&storage, settled[0].slot_ms).unwrap().unwrap();
    assert_eq!(round.status, battle::RoundStatus::Completed);
    assert_eq!(users::load_user(&storage, 1).unwrap().unwrap().coins, i64::MAX as u64);
    assert!(users::load_user(&storage, 2).unwrap().unwrap().coins > 0);
}
