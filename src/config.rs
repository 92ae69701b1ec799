//! Configuration structures
//!
//! Every struct deserializes from TOML with sensible per-field defaults, so a
//! partial config file (or none at all) still yields a working setup.
//! Validation of business constraints happens in `StakeConfig::validate`,
//! called when a policy is constructed: bad money-management parameters are
//! faults and fail fast, they never reach the trading loop.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Money-management policy variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Fixed,
    Martingale,
    Soros,
    MartingaleSoros,
    FixedWithRecovery,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Fixed => write!(f, "fixed"),
            PolicyKind::Martingale => write!(f, "martingale"),
            PolicyKind::Soros => write!(f, "soros"),
            PolicyKind::MartingaleSoros => write!(f, "martingale-soros"),
            PolicyKind::FixedWithRecovery => write!(f, "fixed-with-recovery"),
        }
    }
}

/// Stake-sizing configuration shared by all policy variants.
///
/// Fields not used by the selected variant are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeConfig {
    #[serde(rename = "type", default)]
    pub kind: PolicyKind,
    #[serde(default = "default_initial_stake")]
    pub initial_stake: Decimal,
    /// Payout as a percentage of the stake, e.g. 92 for 92%
    #[serde(default = "default_profit_percent")]
    pub profit_percent: Decimal,
    /// Hard cap on any single stake; unlimited when absent
    #[serde(default)]
    pub max_stake: Option<Decimal>,
    /// Martingale: force-reset after this many consecutive losses
    #[serde(default)]
    pub max_loss: Option<u32>,
    /// How many compounding wins before soros resets to the initial stake
    #[serde(default = "default_soros_level")]
    pub soros_level: u32,
    /// fixed-with-recovery: compound a percentage of winning profits
    #[serde(default)]
    pub enable_soros: bool,
    /// fixed-with-recovery: percentage of the last profit to compound
    #[serde(default = "default_soros_percent")]
    pub soros_percent: Decimal,
    /// fixed-with-recovery: consecutive wins required before a recovery stake
    #[serde(default = "default_wins_before_recovery")]
    pub wins_before_recovery: u32,
    /// martingale-soros: upper bound for the randomized recovery win count
    #[serde(default = "default_wins_before_martingale")]
    pub wins_before_martingale: u32,
    /// Session profit target; reaching it resets the session
    #[serde(default)]
    pub target_profit: Option<Decimal>,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
}

fn default_initial_stake() -> Decimal {
    dec!(1)
}

fn default_profit_percent() -> Decimal {
    dec!(92)
}

fn default_soros_level() -> u32 {
    1
}

fn default_soros_percent() -> Decimal {
    dec!(20)
}

fn default_wins_before_recovery() -> u32 {
    3
}

fn default_wins_before_martingale() -> u32 {
    3
}

fn default_initial_balance() -> Decimal {
    dec!(1000)
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            kind: PolicyKind::Fixed,
            initial_stake: default_initial_stake(),
            profit_percent: default_profit_percent(),
            max_stake: None,
            max_loss: None,
            soros_level: default_soros_level(),
            enable_soros: false,
            soros_percent: default_soros_percent(),
            wins_before_recovery: default_wins_before_recovery(),
            wins_before_martingale: default_wins_before_martingale(),
            target_profit: None,
            initial_balance: default_initial_balance(),
        }
    }
}

impl StakeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_stake <= Decimal::ZERO {
            return Err(Error::invalid_config("initial_stake must be positive"));
        }
        if self.profit_percent <= Decimal::ZERO {
            return Err(Error::invalid_config("profit_percent must be positive"));
        }
        if self.initial_balance <= Decimal::ZERO {
            return Err(Error::invalid_config("initial_balance must be positive"));
        }
        if let Some(max) = self.max_stake {
            if max < self.initial_stake {
                return Err(Error::invalid_config(
                    "max_stake must not be below initial_stake",
                ));
            }
        }
        if self.soros_percent < Decimal::ZERO || self.soros_percent > dec!(100) {
            return Err(Error::invalid_config("soros_percent must be within 0..=100"));
        }
        if let Some(target) = self.target_profit {
            if target <= Decimal::ZERO {
                return Err(Error::invalid_config("target_profit must be positive"));
            }
        }
        Ok(())
    }

    /// Payout rate as a fraction (92 -> 0.92).
    pub fn profit_rate(&self) -> Decimal {
        self.profit_percent / dec!(100)
    }

    /// Effective stake cap; `Decimal::MAX` when unconfigured.
    pub fn stake_cap(&self) -> Decimal {
        self.max_stake.unwrap_or(Decimal::MAX)
    }
}

/// Sequence-window monitoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Trades per window
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Win-rate percentage below which a completed window spawns a probation window
    #[serde(default = "default_probation_threshold")]
    pub probation_threshold: f64,
}

fn default_window_size() -> usize {
    25
}

fn default_probation_threshold() -> f64 {
    80.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            probation_threshold: default_probation_threshold(),
        }
    }
}

/// Backtest scan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_min_horizon")]
    pub min_horizon: usize,
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,
    /// Horizon whose signals feed the equity simulation
    #[serde(default = "default_max_horizon")]
    pub target_horizon: usize,
    /// Digit that must appear for an entry (digit strategies)
    #[serde(default)]
    pub entry_digit: Option<u8>,
    /// Digit the resolution value must exceed for a win
    #[serde(default = "default_compare_digit")]
    pub compare_digit: u8,
    #[serde(default = "default_backtest_balance")]
    pub initial_balance: Decimal,
}

fn default_min_horizon() -> usize {
    1
}

fn default_max_horizon() -> usize {
    10
}

fn default_compare_digit() -> u8 {
    1
}

fn default_backtest_balance() -> Decimal {
    dec!(100)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_horizon: default_min_horizon(),
            max_horizon: default_max_horizon(),
            target_horizon: default_max_horizon(),
            entry_digit: None,
            compare_digit: default_compare_digit(),
            initial_balance: default_backtest_balance(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_horizon == 0 {
            return Err(Error::invalid_config("min_horizon must be at least 1"));
        }
        if self.max_horizon < self.min_horizon {
            return Err(Error::invalid_config(
                "max_horizon must not be below min_horizon",
            ));
        }
        Ok(())
    }
}

/// Trade ledger persistence parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Offset applied to UTC when bucketing ledger dates and hours
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

fn default_db_path() -> String {
    "trades.db".to_string()
}

fn default_utc_offset() -> i32 {
    -3
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            utc_offset_hours: default_utc_offset(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stake: StakeConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl AppConfig {
    /// Load from a TOML file (optional) overlaid with `BOT__*` env vars.
    pub fn load(path: &str) -> Result<Self> {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("BOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.stake.validate()?;
        cfg.backtest.validate()?;
        Ok(cfg)
    }
}
