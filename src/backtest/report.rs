//! Backtest report assembly
//!
//! Glues the horizon scanner, the streak analytics and the equity simulator
//! into one report per run: per-horizon signal statistics, an equity
//! simulation for the configured target horizon, and (for digit strategies)
//! the captured digit history that feeds the optimizer.

use crate::analysis::{
    self,
    optimizer::{capture_digit_stats, DigitStats},
    ContinuationStats, StreakDistribution,
};
use crate::backtest::{Backtest, EntryRule, EquitySimulator};
use crate::config::{BacktestConfig, StakeConfig};
use crate::error::Result;
use crate::money::StakePolicy;
use crate::types::{BacktestAnalysis, EquityRun};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Everything one report run needs.
#[derive(Debug, Clone)]
pub struct BacktestParams {
    pub scan: BacktestConfig,
    pub stake: StakeConfig,
}

/// One horizon's scan enriched with streak analytics.
#[derive(Debug, Clone, Serialize)]
pub struct HorizonReport {
    #[serde(flatten)]
    pub analysis: BacktestAnalysis,
    pub average_consecutive_wins: f64,
    pub average_consecutive_losses: f64,
    pub streak_distribution: StreakDistribution,
    /// Keyed by loss-streak length
    pub wins_after_losses: BTreeMap<usize, ContinuationStats>,
    /// Keyed by win-streak length
    pub losses_after_wins: BTreeMap<usize, ContinuationStats>,
}

impl HorizonReport {
    fn from_analysis(analysis: BacktestAnalysis) -> Self {
        let trades = &analysis.trades;
        Self {
            average_consecutive_wins: analysis::average_consecutive(trades, true),
            average_consecutive_losses: analysis::average_consecutive(trades, false),
            streak_distribution: analysis::streak_distribution(trades),
            wins_after_losses: analysis::continuation_after_losses(trades),
            losses_after_wins: analysis::continuation_after_wins(trades),
            analysis,
        }
    }
}

/// Full output of one backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub horizons: Vec<HorizonReport>,
    /// Equity simulation over the target horizon's signals
    pub equity: Option<EquityRun>,
    /// Digit history capture, present when an entry digit is configured
    pub digit_stats: Option<DigitStats>,
}

/// Scan `observations` with `rule` and assemble the full report.
///
/// The equity simulation runs on a fresh policy seeded with the scan's
/// starting balance, so repeated runs over the same data are identical.
pub fn run_backtest(
    rule: &dyn EntryRule,
    observations: &[f64],
    params: &BacktestParams,
) -> Result<BacktestReport> {
    params.scan.validate()?;

    let scanner = Backtest::new(rule, params.scan.min_horizon, params.scan.max_horizon);
    let analyses = scanner.run(observations);

    let equity = analyses
        .iter()
        .find(|a| a.ticks == params.scan.target_horizon)
        .map(|analysis| -> Result<EquityRun> {
            let mut stake = params.stake.clone();
            stake.initial_balance = params.scan.initial_balance;
            // The session profit target is a live-trading side effect; a
            // mid-replay session reset would snap the balance back and
            // break the run's conservation of profit.
            stake.target_profit = None;
            let policy = StakePolicy::new(stake)?;
            Ok(EquitySimulator::new(policy).run(&analysis.trades))
        })
        .transpose()?;

    let digit_stats = match (params.scan.entry_digit, analyses.first()) {
        (Some(digit), Some(first)) => {
            Some(capture_digit_stats(&first.trades, observations, digit))
        }
        _ => None,
    };

    let horizons: Vec<HorizonReport> = analyses
        .into_iter()
        .map(HorizonReport::from_analysis)
        .collect();

    info!(
        rule = rule.name(),
        observations = observations.len(),
        horizons = horizons.len(),
        simulated = equity.is_some(),
        "backtest report assembled"
    );

    Ok(BacktestReport {
        horizons,
        equity,
        digit_stats,
    })
}
