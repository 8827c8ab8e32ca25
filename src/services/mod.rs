//! Request-level operations
//!
//! `CasinoService` composes the record store, the ledger and the pure game
//! rules into the operations exposed over HTTP. Every state change runs in a
//! single [`Storage::atomic`] section; metrics are recorded after commit.

mod battle;
mod draws;
mod games;
mod mines;
mod users;
mod withdrawals;

pub use battle::{BattleJoin, BattleStatus};
pub use draws::{CurrentDraw, DrawResult, TicketClaimResult, TicketReceipt};
pub use games::{BoxResult, WheelResult};
pub use mines::{MinesCashout, MinesReveal, MinesSession, MinesStart};
pub use users::{ChannelCheck, SyncUser};

use crate::{
    common::{ChannelMembership, Clock},
    config::CasinoConfig,
    ledger::CoinUpdate,
    metrics::CasinoMetrics,
    settlement::BattleSettlement,
    storage::Storage,
    games::CoinSource,
};
use dashmap::DashMap;
use std::sync::Arc;

pub struct CasinoService {
    storage: Storage,
    config: Arc<CasinoConfig>,
    clock: Arc<dyn Clock>,
    metrics: Arc<CasinoMetrics>,
    membership: Arc<dyn ChannelMembership>,
    settlement: BattleSettlement,
    mines: DashMap<String, MinesSession>,
}

impl CasinoService {
    pub fn new(
        storage: Storage,
        config: Arc<CasinoConfig>,
        clock: Arc<dyn Clock>,
        metrics: Arc<CasinoMetrics>,
        membership: Arc<dyn ChannelMembership>,
    ) -> Self {
        let settlement = BattleSettlement::new(
            storage.clone(),
            config.battle.clone(),
            clock.clone(),
            metrics.clone(),
        );
        Self {
            storage,
            config,
            clock,
            metrics,
            membership,
            settlement,
            mines: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CasinoConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn metrics(&self) -> &CasinoMetrics {
        &self.metrics
    }

    pub fn settlement(&self) -> &BattleSettlement {
        &self.settlement
    }

    fn record_coins(&self, source: CoinSource, update: &CoinUpdate) {
        self.metrics.record_coins(source.as_str(), update.applied);
    }
}
