//! Mines: a 5x5 grid with hidden bombs and a growing cash-out multiplier

use crate::errors::{CasinoError, CasinoResult};
use rand::{seq::index::sample, Rng};
use serde::{Deserialize, Serialize};

pub const GRID_CELLS: usize = 25;
pub const MIN_BOMBS: u8 = 3;
pub const MAX_BOMBS: u8 = 6;

/// Share of the fair multiplier paid out
const PAYOUT_RATIO: f64 = 0.97;

/// Multipliers in hundredths for 1, 2, .. safe reveals with `bombs` on the board.
///
/// Entry `k - 1` is the fair odds of surviving `k` picks without replacement,
/// scaled by the payout ratio and floored to two decimals.
pub fn multiplier_cents_table(bombs: u8) -> Option<Vec<u64>> {
    if !(MIN_BOMBS..=MAX_BOMBS).contains(&bombs) {
        return None;
    }
    let safe_cells = GRID_CELLS - bombs as usize;

    let mut fair = 1.0f64;
    let table = (0..safe_cells)
        .map(|i| {
            fair *= (GRID_CELLS - i) as f64 / (safe_cells - i) as f64;
            (fair * PAYOUT_RATIO * 100.0).floor() as u64
        })
        .collect();
    Some(table)
}

/// [`multiplier_cents_table`] as decimal multipliers, for display
pub fn multiplier_table(bombs: u8) -> Option<Vec<f64>> {
    multiplier_cents_table(bombs).map(|t| t.into_iter().map(cents_to_multiplier).collect())
}

fn cents_to_multiplier(cents: u64) -> f64 {
    cents as f64 / 100.0
}

/// Multiplier in hundredths after `revealed` safe cells; `None` outside the table
pub fn multiplier_cents(bombs: u8, revealed: usize) -> Option<u64> {
    if revealed == 0 {
        return None;
    }
    multiplier_cents_table(bombs)?.get(revealed - 1).copied()
}

pub fn multiplier(bombs: u8, revealed: usize) -> Option<f64> {
    multiplier_cents(bombs, revealed).map(cents_to_multiplier)
}

/// `floor(bet × multiplier)`, computed on integer hundredths
pub fn cash_out_amount(bet: u64, bombs: u8, revealed: usize) -> Option<u64> {
    multiplier_cents(bombs, revealed).map(|cents| bet.saturating_mul(cents) / 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RevealOutcome {
    Safe { revealed: usize, multiplier: f64 },
    Bomb,
}

/// Hidden board state for one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinesBoard {
    bombs: u8,
    mines: [bool; GRID_CELLS],
    revealed: [bool; GRID_CELLS],
}

impl MinesBoard {
    pub fn new<R: Rng + ?Sized>(bombs: u8, rng: &mut R) -> CasinoResult<Self> {
        if !(MIN_BOMBS..=MAX_BOMBS).contains(&bombs) {
            return Err(CasinoError::validation(format!(
                "Bomb count must be between {} and {}",
                MIN_BOMBS, MAX_BOMBS
            )));
        }
        let mut mines = [false; GRID_CELLS];
        for cell in sample(rng, GRID_CELLS, bombs as usize) {
            mines[cell] = true;
        }
        Ok(Self {
            bombs,
            mines,
            revealed: [false; GRID_CELLS],
        })
    }

    pub fn bombs(&self) -> u8 {
        self.bombs
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    /// Every safe cell has been opened
    pub fn is_cleared(&self) -> bool {
        self.revealed_count() == GRID_CELLS - self.bombs as usize
    }

    pub fn reveal(&mut self, cell: usize) -> CasinoResult<RevealOutcome> {
        if cell >= GRID_CELLS {
            return Err(CasinoError::validation(format!(
                "Cell {} is outside the {}-cell grid",
                cell, GRID_CELLS
            )));
        }
        if self.revealed[cell] {
            return Err(CasinoError::conflict(format!("Cell {} already revealed", cell)));
        }
        if self.mines[cell] {
            return Ok(RevealOutcome::Bomb);
        }

        self.revealed[cell] = true;
        let revealed = self.revealed_count();
        let multiplier = multiplier(self.bombs, revealed).ok_or_else(|| {
            CasinoError::validation(format!("No multiplier for {} reveals", revealed))
        })?;
        Ok(RevealOutcome::Safe {
            revealed,
            multiplier,
        })
    }

    /// Bomb positions, for showing the board once the round is over
    pub fn bomb_cells(&self) -> Vec<usize> {
        (0..GRID_CELLS).filter(|c| self.mines[*c]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_tables_monotonic_for_every_bomb_count() {
        for bombs in MIN_BOMBS..=MAX_BOMBS {
            let table = multiplier_table(bombs).unwrap();
            assert_eq!(table.len(), GRID_CELLS - bombs as usize);
            assert!(table.windows(2).all(|w| w[0] <= w[1]), "bombs={}", bombs);
        }
    }

    #[test]
    fn test_more_bombs_pay_more() {
        for revealed in 1..=(GRID_CELLS - MAX_BOMBS as usize) {
            let low = multiplier(MIN_BOMBS, revealed).unwrap();
            let high = multiplier(MAX_BOMBS, revealed).unwrap();
            assert!(high >= low);
        }
    }

    #[test]
    fn test_known_values() {
        // 3 bombs, one reveal: 25/22 * 0.97 = 1.1022..
        assert_eq!(multiplier(3, 1), Some(1.10));
        assert_eq!(multiplier(3, 0), None);
        assert_eq!(multiplier(3, 23), None);
        assert_eq!(multiplier(2, 1), None);
        assert_eq!(multiplier(7, 1), None);
    }

    #[test]
    fn test_cash_out_floors() {
        assert_eq!(cash_out_amount(100, 3, 1), Some(110));
        assert_eq!(cash_out_amount(9, 3, 1), Some(9));
        assert_eq!(cash_out_amount(100, 3, 0), None);
    }

    #[test]
    fn test_cash_out_is_exact_on_whole_hundredths() {
        // 3 bombs, 6 reveals: 2.30, where 50 * 2.30 in f64 is 114.999..
        assert_eq!(multiplier_cents(3, 6), Some(230));
        assert_eq!(cash_out_amount(50, 3, 6), Some(115));

        for bombs in MIN_BOMBS..=MAX_BOMBS {
            let cents = multiplier_cents_table(bombs).unwrap();
            for (i, c) in cents.iter().enumerate() {
                assert_eq!(cash_out_amount(100, bombs, i + 1), Some(*c));
                for bet in [1u64, 7, 50, 333, 1_000] {
                    assert_eq!(cash_out_amount(bet, bombs, i + 1), Some(bet * c / 100));
                }
            }
        }
        assert_eq!(cash_out_amount(u64::MAX, 3, 1), Some(u64::MAX / 100));
    }

    #[test]
    fn test_board_places_requested_bombs() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = MinesBoard::new(4, &mut rng).unwrap();
        assert_eq!(board.bomb_cells().len(), 4);
        assert!(MinesBoard::new(2, &mut rng).is_err());
    }

    #[test]
    fn test_reveal_flow() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut board = MinesBoard::new(3, &mut rng).unwrap();
        let bombs = board.bomb_cells();
        let safe: Vec<usize> = (0..GRID_CELLS).filter(|c| !bombs.contains(c)).collect();

        match board.reveal(safe[0]).unwrap() {
            RevealOutcome::Safe { revealed, multiplier } => {
                assert_eq!(revealed, 1);
                assert_eq!(multiplier, 1.10);
            }
            RevealOutcome::Bomb => panic!("expected a safe cell"),
        }
        assert!(board.reveal(safe[0]).is_err());
        assert!(board.reveal(GRID_CELLS).is_err());
        assert_eq!(board.reveal(bombs[0]).unwrap(), RevealOutcome::Bomb);
    }

    #[test]
    fn test_clearing_the_board() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut board = MinesBoard::new(6, &mut rng).unwrap();
        let bombs = board.bomb_cells();
        for cell in (0..GRID_CELLS).filter(|c| !bombs.contains(c)) {
            board.reveal(cell).unwrap();
        }
        assert!(board.is_cleared());
    }
}
