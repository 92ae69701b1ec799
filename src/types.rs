//! Shared domain types
//!
//! Plain data produced by the backtest engine, the equity simulator and the
//! stake policies. Everything here is immutable once constructed and
//! serializable for the reporting/storage layers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single entry signal emitted by the backtest engine.
///
/// `position` indexes into the observation array the signal was derived
/// from; signals for one horizon are ordered by `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Index of the entry observation
    pub position: usize,
    /// Whether the trade would have won
    pub success: bool,
    /// Observation value at resolution (`position + horizon`)
    pub result_value: f64,
}

/// An executed trade, simulated or live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub success: bool,
    pub stake: Decimal,
    /// Signed: positive on win, `-stake` on loss
    pub profit: Decimal,
    pub balance_after: Decimal,
}

/// Per-horizon outcome of a backtest scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestAnalysis {
    /// Holding horizon in observation steps
    pub ticks: usize,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage, 0 when no trades
    pub win_rate: f64,
    pub loss_rate: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub trades: Vec<TradeSignal>,
    /// Candidates rejected by the trade-spacing cooldown
    pub skipped_trades: usize,
    /// All candidates where the entry rule fired
    pub possible_trades: usize,
}

impl BacktestAnalysis {
    /// Zero-trade analysis for a horizon (degenerate input path).
    pub fn empty(ticks: usize) -> Self {
        Self {
            ticks,
            total_trades: 0,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            loss_rate: 0.0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            trades: Vec::new(),
            skipped_trades: 0,
            possible_trades: 0,
        }
    }
}

/// Largest stake the simulator had to place during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaxStakeInfo {
    pub stake: Decimal,
    /// Balance at the moment the stake was placed
    pub balance: Decimal,
    /// 1-based index into the executed trade log
    pub trade_number: usize,
}

/// Why an equity run halted before consuming every signal.
///
/// These are terminal trading conditions, not faults: the caller decides
/// whether a stopped run is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Balance reached zero or below
    BalanceExhausted,
    /// Policy signalled "do not trade" with a zero stake
    ZeroStake,
    /// Required stake exceeded the available balance
    StakeExceedsBalance,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::BalanceExhausted => write!(f, "BALANCE_EXHAUSTED"),
            StopReason::ZeroStake => write!(f, "ZERO_STAKE"),
            StopReason::StakeExceedsBalance => write!(f, "STAKE_EXCEEDS_BALANCE"),
        }
    }
}

/// Result of replaying a signal sequence through a stake policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityRun {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    /// Sum of every stake placed
    pub total_volume: Decimal,
    /// Highest balance seen across the whole run
    pub max_balance: Decimal,
    /// Lowest balance seen across the whole run
    pub min_balance: Decimal,
    /// `(max - min) / max * 100` over the run's global extremes
    pub max_drawdown_pct: Decimal,
    pub trades: Vec<TradeResult>,
    pub max_stake_used: MaxStakeInfo,
    /// Set when the run halted before the last signal
    pub stopped: Option<StopReason>,
}

impl EquityRun {
    pub fn total_profit(&self) -> Decimal {
        self.trades.iter().map(|t| t.profit).sum()
    }

    pub fn win_count(&self) -> usize {
        self.trades.iter().filter(|t| t.success).count()
    }
}
