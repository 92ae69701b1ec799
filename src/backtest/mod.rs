//! Backtest engine
//!
//! Scans an ordered observation array once per holding horizon, asking an
//! injected entry rule whether each position is an entry point, and spacing
//! counted trades so overlapping contracts never double-count the same
//! movement. The scan is a pure function of its input: same observations and
//! rule, same analyses.

pub mod report;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use report::{run_backtest, BacktestParams, BacktestReport, HorizonReport};
pub use simulator::EquitySimulator;

use crate::types::{BacktestAnalysis, TradeSignal};
use tracing::debug;

/// Observation steps that must elapse after a trade resolves before the next
/// entry is counted.
pub const RESULT_DELAY: usize = 2;

/// Pluggable entry predicate.
///
/// `evaluate` returns `None` when the position is not an eligible entry
/// point, otherwise whether a trade entered there would win after `horizon`
/// steps. Implementations must not look past `position + horizon`.
pub trait EntryRule {
    fn name(&self) -> &str;

    fn evaluate(&self, observations: &[f64], position: usize, horizon: usize) -> Option<bool>;
}

/// Horizon-range scanner over a single entry rule.
pub struct Backtest<'a> {
    rule: &'a dyn EntryRule,
    min_horizon: usize,
    max_horizon: usize,
}

impl<'a> Backtest<'a> {
    pub fn new(rule: &'a dyn EntryRule, min_horizon: usize, max_horizon: usize) -> Self {
        Self {
            rule,
            min_horizon,
            max_horizon,
        }
    }

    /// One `BacktestAnalysis` per horizon in the configured closed range.
    ///
    /// Horizons are evaluated independently; degenerate input (empty array,
    /// horizon beyond the array) yields zero-trade analyses.
    pub fn run(&self, observations: &[f64]) -> Vec<BacktestAnalysis> {
        (self.min_horizon..=self.max_horizon)
            .map(|horizon| self.scan_horizon(observations, horizon))
            .collect()
    }

    fn scan_horizon(&self, observations: &[f64], horizon: usize) -> BacktestAnalysis {
        let mut analysis = BacktestAnalysis::empty(horizon);
        let Some(scan_end) = observations.len().checked_sub(horizon) else {
            return analysis;
        };

        let mut consecutive_wins = 0usize;
        let mut consecutive_losses = 0usize;
        let mut last_trade_position: Option<usize> = None;

        for position in 0..scan_end {
            let Some(success) = self.rule.evaluate(observations, position, horizon) else {
                continue;
            };
            analysis.possible_trades += 1;

            // Cooldown: the previous trade needs `horizon` steps to resolve
            // plus the fixed settlement delay.
            let eligible = last_trade_position
                .map_or(true, |last| position >= last + horizon + RESULT_DELAY);
            if !eligible {
                analysis.skipped_trades += 1;
                continue;
            }

            analysis.total_trades += 1;
            analysis.trades.push(TradeSignal {
                position,
                success,
                result_value: observations[position + horizon],
            });
            last_trade_position = Some(position);

            if success {
                analysis.wins += 1;
                consecutive_wins += 1;
                consecutive_losses = 0;
                analysis.max_consecutive_wins =
                    analysis.max_consecutive_wins.max(consecutive_wins);
            } else {
                analysis.losses += 1;
                consecutive_losses += 1;
                consecutive_wins = 0;
                analysis.max_consecutive_losses =
                    analysis.max_consecutive_losses.max(consecutive_losses);
            }
        }

        if analysis.total_trades > 0 {
            analysis.win_rate = analysis.wins as f64 / analysis.total_trades as f64 * 100.0;
            analysis.loss_rate = analysis.losses as f64 / analysis.total_trades as f64 * 100.0;
        }

        debug!(
            rule = self.rule.name(),
            horizon,
            trades = analysis.total_trades,
            win_rate = analysis.win_rate,
            skipped = analysis.skipped_trades,
            "horizon scan complete"
        );
        analysis
    }
}
