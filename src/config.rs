//! Configuration management with validation and defaults
//!
//! Values come from (in order) built-in defaults, an optional TOML file and
//! `TGCASINO_*` environment variables. CLI flags are applied by the binary.

use crate::errors::{CasinoResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};

/// Full service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub lottery: LotteryConfig,
    pub battle: BattleConfig,
    pub wheel: WheelConfig,
    pub mystery_box: MysteryBoxConfig,
    pub mines: MinesConfig,
    pub rewards: RewardsConfig,
    pub withdrawals: WithdrawalConfig,
    pub monitoring: MonitoringConfig,
}

/// HTTP server settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Shared secret for `/api/admin/*`. Admin routes reject everything when unset.
    pub admin_api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            admin_api_key: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_directory: String,
    /// Whether to clear database on startup (testing only!)
    pub clear_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_directory: "./DB/tgcasino".to_string(),
            clear_on_start: false,
        }
    }
}

/// Lottery draw settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub interval_secs: u64,
    pub numbers_per_draw: usize,
    pub max_number: u32,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
            numbers_per_draw: 7,
            max_number: 49,
        }
    }
}

/// Battle royale round settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub interval_secs: u64,
    pub winner_percent: f64,
    pub winner_reward: u64,
    pub loser_reward: u64,
    /// How often the background job looks for rounds past their deadline
    pub settlement_poll_secs: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            winner_percent: 0.5,
            winner_reward: 20,
            loser_reward: 40,
            settlement_poll_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub cooldown_secs: u64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MysteryBoxConfig {
    pub price: u64,
}

impl Default for MysteryBoxConfig {
    fn default() -> Self {
        Self { price: 10 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesConfig {
    pub min_bet: u64,
    pub max_bet: u64,
    /// Sessions untouched for this long are dropped (bet forfeited)
    pub session_ttl_secs: u64,
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            min_bet: 1,
            max_bet: 10_000,
            session_ttl_secs: 30 * 60,
        }
    }
}

/// One-off bonuses
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub starting_coins: u64,
    pub referral_bonus: u64,
    pub channel_bonus: u64,
    /// Telegram user ids treated as subscribed to the project channel
    pub channel_members: Vec<i64>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            starting_coins: 0,
            referral_bonus: 50,
            channel_bonus: 100,
            channel_members: vec![],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalConfig {
    pub min_amount: u64,
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self { min_amount: 1_000 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    /// Used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_filter: "tgcasino=info,tower_http=info".to_string(),
        }
    }
}

impl CasinoConfig {
    /// Validate configuration for logical consistency
    pub fn validate(&self) -> CasinoResult<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "0", "Port cannot be zero"));
        }
        if self.lottery.interval_secs == 0 {
            return Err(invalid("lottery.interval_secs", "0", "Interval must be > 0"));
        }
        if self.battle.interval_secs == 0 {
            return Err(invalid("battle.interval_secs", "0", "Interval must be > 0"));
        }
        if self.lottery.numbers_per_draw == 0
            || self.lottery.numbers_per_draw > self.lottery.max_number as usize
        {
            return Err(invalid(
                "lottery.numbers_per_draw",
                &self.lottery.numbers_per_draw.to_string(),
                "Must be between 1 and lottery.max_number",
            ));
        }
        if !(self.battle.winner_percent > 0.0 && self.battle.winner_percent <= 1.0) {
            return Err(invalid(
                "battle.winner_percent",
                &self.battle.winner_percent.to_string(),
                "Must be in (0, 1]",
            ));
        }
        if self.battle.settlement_poll_secs == 0 {
            return Err(invalid("battle.settlement_poll_secs", "0", "Must be > 0"));
        }
        if self.mines.min_bet == 0 || self.mines.min_bet > self.mines.max_bet {
            return Err(invalid(
                "mines.min_bet",
                &self.mines.min_bet.to_string(),
                "Must be > 0 and <= mines.max_bet",
            ));
        }
        if self.withdrawals.min_amount == 0 {
            return Err(invalid("withdrawals.min_amount", "0", "Must be > 0"));
        }
        Ok(())
    }

    pub fn lottery_interval(&self) -> Duration {
        Duration::from_secs(self.lottery.interval_secs)
    }

    pub fn battle_interval(&self) -> Duration {
        Duration::from_secs(self.battle.interval_secs)
    }

    pub fn settlement_poll_interval(&self) -> Duration {
        Duration::from_secs(self.battle.settlement_poll_secs)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> crate::errors::CasinoError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Configuration loader with environment variable support
#[derive(Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> CasinoResult<CasinoConfig> {
        let mut config = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => CasinoConfig::default(),
        };

        apply_env_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(path: &str) -> CasinoResult<CasinoConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        parse_toml(&content)
    }
}

/// Parse a TOML document into a configuration. Missing sections keep their defaults.
pub fn parse_toml(content: &str) -> CasinoResult<CasinoConfig> {
    toml::from_str(content)
        .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
}

/// Apply `TGCASINO_*` overrides through `lookup` (usually `std::env::var`).
pub fn apply_env_overrides<F>(config: &mut CasinoConfig, lookup: F) -> CasinoResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("TGCASINO_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("TGCASINO_PORT") {
        config.server.port = parse_env("TGCASINO_PORT", port)?;
    }
    if let Some(key) = lookup("TGCASINO_ADMIN_API_KEY") {
        config.server.admin_api_key = Some(key);
    }
    if let Some(dir) = lookup("TGCASINO_DATA_DIR") {
        config.storage.data_directory = dir;
    }
    if let Some(percent) = lookup("TGCASINO_BATTLE_WINNER_PERCENT") {
        config.battle.winner_percent = parse_env("TGCASINO_BATTLE_WINNER_PERCENT", percent)?;
    }
    if let Some(poll) = lookup("TGCASINO_SETTLEMENT_POLL_SECS") {
        config.battle.settlement_poll_secs = parse_env("TGCASINO_SETTLEMENT_POLL_SECS", poll)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(field: &str, value: String) -> CasinoResult<T> {
    value.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "Could not parse value".to_string(),
        }
        .into()
    })
}
