use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Lottery,
    Wheel,
    MysteryBox,
    Mines,
    Battle,
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Lottery => write!(f, "lottery"),
            GameType::Wheel => write!(f, "wheel"),
            GameType::MysteryBox => write!(f, "mystery_box"),
            GameType::Mines => write!(f, "mines"),
            GameType::Battle => write!(f, "battle"),
        }
    }
}

/// Where a coin balance change came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CoinSource {
    Lottery,
    Wheel,
    MysteryBox,
    Mines,
    Battle,
    Referral,
    Channel,
    Withdrawal,
    WithdrawalRefund,
    /// Ad views, tasks and other client-reported rewards
    Bonus,
    Admin,
}

impl CoinSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinSource::Lottery => "lottery",
            CoinSource::Wheel => "wheel",
            CoinSource::MysteryBox => "mystery_box",
            CoinSource::Mines => "mines",
            CoinSource::Battle => "battle",
            CoinSource::Referral => "referral",
            CoinSource::Channel => "channel",
            CoinSource::Withdrawal => "withdrawal",
            CoinSource::WithdrawalRefund => "withdrawal_refund",
            CoinSource::Bonus => "bonus",
            CoinSource::Admin => "admin",
        }
    }

    /// Sources whose credits count as a game played in the daily stats
    pub fn is_game(&self) -> bool {
        matches!(
            self,
            CoinSource::Lottery
                | CoinSource::Wheel
                | CoinSource::MysteryBox
                | CoinSource::Mines
                | CoinSource::Battle
        )
    }
}

impl From<GameType> for CoinSource {
    fn from(game: GameType) -> Self {
        match game {
            GameType::Lottery => CoinSource::Lottery,
            GameType::Wheel => CoinSource::Wheel,
            GameType::MysteryBox => CoinSource::MysteryBox,
            GameType::Mines => CoinSource::Mines,
            GameType::Battle => CoinSource::Battle,
        }
    }
}

impl fmt::Display for CoinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
