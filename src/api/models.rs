//! API Request and Response Models
//!
//! Bodies are camelCase JSON, as sent by the Mini App.

use crate::games::{CoinSource, GameType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoinsRequest {
    pub telegram_id: i64,
    /// Signed change; negative removes coins
    pub amount: i64,
    pub source: CoinSource,
    #[serde(default)]
    pub update_stats: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoinsResponse {
    pub success: bool,
    pub new_coins: u64,
    pub new_total_winnings: u64,
}

/// Body for endpoints that only need the player
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    pub telegram_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawQuery {
    #[serde(default = "default_game")]
    pub game: GameType,
}

fn default_game() -> GameType {
    GameType::Lottery
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyTicketRequest {
    pub telegram_id: i64,
    pub numbers: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTicketRequest {
    pub telegram_id: i64,
    pub draw_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesStartRequest {
    pub telegram_id: i64,
    pub bet: u64,
    pub bombs: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesRevealRequest {
    pub session_id: String,
    pub cell: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesCashoutRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleProcessResponse {
    pub processed: usize,
    pub rounds: Vec<crate::settlement::SettledRound>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub telegram_id: i64,
    pub amount: u64,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalsQuery {
    pub telegram_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}
