use super::CasinoService;
use crate::{
    errors::{CasinoError, CasinoResult},
    games::{mines, CoinSource, MinesBoard, RevealOutcome},
    ledger::{self, CoinUpdate},
    store::stats,
};
use dashmap::mapref::entry::Entry;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// A round in progress; the board never leaves the server until it ends
#[derive(Debug, Clone)]
pub struct MinesSession {
    pub id: String,
    pub telegram_id: i64,
    pub bet: u64,
    pub board: MinesBoard,
    pub last_active_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesStart {
    pub session_id: String,
    pub bet: u64,
    pub bombs: u8,
    pub multipliers: Vec<f64>,
    pub new_coins: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesReveal {
    pub session_id: String,
    pub cell: usize,
    #[serde(flatten)]
    pub outcome: RevealOutcome,
    /// Set once the round is over (bomb hit or board cleared)
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bomb_cells: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesCashout {
    pub session_id: String,
    pub revealed: usize,
    pub multiplier: f64,
    pub payout: u64,
    pub new_coins: u64,
    pub bomb_cells: Vec<usize>,
}

impl CasinoService {
    pub fn mines_start(&self, telegram_id: i64, bet: u64, bombs: u8) -> CasinoResult<MinesStart> {
        self.mines_start_with_rng(telegram_id, bet, bombs, &mut rand::thread_rng())
    }

    /// Debit the bet and deal a fresh board
    pub fn mines_start_with_rng<R: Rng + ?Sized>(
        &self,
        telegram_id: i64,
        bet: u64,
        bombs: u8,
        rng: &mut R,
    ) -> CasinoResult<MinesStart> {
        let limits = &self.config.mines;
        if bet < limits.min_bet || bet > limits.max_bet {
            return Err(CasinoError::validation(format!(
                "Bet must be between {} and {}",
                limits.min_bet, limits.max_bet
            )));
        }
        let board = MinesBoard::new(bombs, rng)?;
        let multipliers = mines::multiplier_table(bombs).unwrap_or_default();
        let now = self.clock.now();

        let update = self
            .storage
            .atomic(|txn| ledger::debit(txn, telegram_id, bet, CoinSource::Mines, now))?;
        self.record_coins(CoinSource::Mines, &update);

        let id = Uuid::new_v4().to_string();
        self.mines.insert(
            id.clone(),
            MinesSession {
                id: id.clone(),
                telegram_id,
                bet,
                board,
                last_active_ms: self.clock.now_ms(),
            },
        );
        debug!(telegram_id, bet, bombs, session = %id, "mines round started");

        Ok(MinesStart {
            session_id: id,
            bet,
            bombs,
            multipliers,
            new_coins: update.new_coins,
        })
    }

    /// Open one cell; clearing every safe cell cashes out automatically
    pub fn mines_reveal(&self, session_id: &str, cell: usize) -> CasinoResult<MinesReveal> {
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.config.mines.session_ttl_secs * 1000;

        let mut entry = match self.mines.entry(session_id.to_string()) {
            Entry::Occupied(entry) if now_ms.saturating_sub(entry.get().last_active_ms) <= ttl_ms => entry,
            Entry::Occupied(entry) => {
                entry.remove();
                return Err(CasinoError::not_found("Mines session", session_id));
            }
            Entry::Vacant(_) => return Err(CasinoError::not_found("Mines session", session_id)),
        };

        let session = entry.get_mut();
        session.last_active_ms = now_ms;
        let outcome = session.board.reveal(cell)?;

        match outcome {
            RevealOutcome::Bomb => {
                let session = entry.remove();
                self.settle_mines_loss(&session)?;
                Ok(MinesReveal {
                    session_id: session.id,
                    cell,
                    outcome,
                    finished: true,
                    payout: None,
                    bomb_cells: Some(session.board.bomb_cells()),
                })
            }
            RevealOutcome::Safe { .. } if session.board.is_cleared() => {
                let (payout, _) = self.settle_mines_cashout(entry.get())?;
                let session = entry.remove();
                Ok(MinesReveal {
                    session_id: session.id.clone(),
                    cell,
                    outcome,
                    finished: true,
                    payout: Some(payout),
                    bomb_cells: Some(session.board.bomb_cells()),
                })
            }
            RevealOutcome::Safe { .. } => Ok(MinesReveal {
                session_id: session.id.clone(),
                cell,
                outcome,
                finished: false,
                payout: None,
                bomb_cells: None,
            }),
        }
    }

    /// Take the current multiplier and end the round.
    ///
    /// The session is dropped only after the payout commits, so a failed
    /// credit leaves the round open to retry.
    pub fn mines_cashout(&self, session_id: &str) -> CasinoResult<MinesCashout> {
        let entry = match self.mines.entry(session_id.to_string()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return Err(CasinoError::not_found("Mines session", session_id)),
        };
        if entry.get().board.revealed_count() == 0 {
            return Err(CasinoError::validation("Reveal at least one cell before cashing out"));
        }

        let (payout, update) = self.settle_mines_cashout(entry.get())?;
        let session = entry.remove();
        let revealed = session.board.revealed_count();
        Ok(MinesCashout {
            session_id: session.id.clone(),
            revealed,
            multiplier: mines::multiplier(session.board.bombs(), revealed).unwrap_or_default(),
            payout,
            new_coins: update.new_coins,
            bomb_cells: session.board.bomb_cells(),
        })
    }

    fn settle_mines_cashout(&self, session: &MinesSession) -> CasinoResult<(u64, CoinUpdate)> {
        let revealed = session.board.revealed_count();
        let payout = mines::cash_out_amount(session.bet, session.board.bombs(), revealed)
            .ok_or_else(|| CasinoError::validation(format!("No multiplier for {} reveals", revealed)))?;
        let now = self.clock.now();

        let update = self.storage.atomic(|txn| {
            stats::record_game_played(txn, now.date_naive())?;
            ledger::credit(txn, session.telegram_id, payout, CoinSource::Mines, now)
        })?;
        self.record_coins(CoinSource::Mines, &update);
        self.metrics.record_game(CoinSource::Mines.as_str());
        info!(
            telegram_id = session.telegram_id,
            bet = session.bet,
            revealed,
            payout,
            "mines cashed out"
        );
        Ok((payout, update))
    }

    fn settle_mines_loss(&self, session: &MinesSession) -> CasinoResult<()> {
        let now = self.clock.now();
        self.storage
            .atomic(|txn| stats::record_game_played(txn, now.date_naive()))?;
        self.metrics.record_game(CoinSource::Mines.as_str());
        info!(telegram_id = session.telegram_id, bet = session.bet, "mines round lost");
        Ok(())
    }

    /// Drop sessions idle past their TTL; their bets stay forfeited
    pub fn expire_mines_sessions(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.config.mines.session_ttl_secs * 1000;
        let before = self.mines.len();
        self.mines
            .retain(|_, s| now_ms.saturating_sub(s.last_active_ms) <= ttl_ms);
        let expired = before.saturating_sub(self.mines.len());
        if expired > 0 {
            info!(expired, "expired idle mines sessions");
        }
        expired
    }

    pub fn active_mines_sessions(&self) -> usize {
        self.mines.len()
    }
}
