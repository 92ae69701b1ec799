//! Digit-condition optimizer
//!
//! Mines the digit sequences that followed historical entries to answer:
//! given what just happened, which entry digit and holding horizon has the
//! best empirical win rate right now?

use crate::types::TradeSignal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How many recent trades feed a digit-history capture.
const CAPTURE_TRADES: usize = 1000;
/// Digits recorded after each matching entry.
const SEQUENCE_LEN: usize = 10;
/// Most recent complete sequences kept per digit.
const KEPT_SEQUENCES: usize = 500;

/// Post-entry digit history for one entry digit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitStats {
    pub digit: u8,
    /// Trades that entered on this digit within the capture window
    pub trades: usize,
    /// Percentage over those trades, rounded to one decimal
    pub win_rate: f64,
    /// For each trade, the floored digits of the next `SEQUENCE_LEN`
    /// observations; incomplete tails are dropped
    pub history: Vec<Vec<u8>>,
}

/// Extract the digit history for `entry_digit` from a finished scan.
///
/// `trades` are the counted signals of the scan; `observations` is the array
/// they index into.
pub fn capture_digit_stats(
    trades: &[TradeSignal],
    observations: &[f64],
    entry_digit: u8,
) -> DigitStats {
    let start = trades.len().saturating_sub(CAPTURE_TRADES);
    let target: Vec<&TradeSignal> = trades[start..]
        .iter()
        .filter(|t| floor_digit(observations[t.position]) == entry_digit)
        .collect();

    let wins = target.iter().filter(|t| t.success).count();
    let win_rate = if target.is_empty() {
        0.0
    } else {
        round1(wins as f64 / target.len() as f64 * 100.0)
    };

    let mut history: Vec<Vec<u8>> = target
        .iter()
        .filter_map(|t| {
            let start = t.position + 1;
            let seq = observations.get(start..start + SEQUENCE_LEN)?;
            Some(seq.iter().map(|&v| floor_digit(v)).collect())
        })
        .collect();
    if history.len() > KEPT_SEQUENCES {
        history.drain(..history.len() - KEPT_SEQUENCES);
    }

    DigitStats {
        digit: entry_digit,
        trades: target.len(),
        win_rate,
        history,
    }
}

/// The trade that just resolved, plus the digits leading into its entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTrade {
    pub win: bool,
    pub entry_digit: u8,
    pub result_digit: u8,
    /// Horizon the trade ran for
    pub ticks: usize,
    /// Digits observed immediately before resolution, oldest first
    pub recent_digits: Vec<u8>,
}

/// Entry digit and horizon recommended by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalConfig {
    pub entry_digit: u8,
    pub ticks: usize,
    /// Win-rate fraction (0..=1) backing the recommendation, one decimal
    pub win_rate: f64,
}

impl OptimalConfig {
    /// Recommendation with nothing backing it; callers treat it as "keep the
    /// current configuration".
    pub fn zero_confidence(entry_digit: u8) -> Self {
        Self {
            entry_digit,
            ticks: 0,
            win_rate: 0.0,
        }
    }
}

/// Win/loss tally at one post-entry offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OffsetStats {
    pub wins: usize,
    pub losses: usize,
    /// Fraction, 0 when the offset never occurs
    pub win_rate: f64,
}

/// Picks the next entry digit and horizon from captured digit histories.
pub struct DigitOptimizer {
    stats: Vec<DigitStats>,
    /// Digit a post-entry observation must exceed to count as a win
    compare_digit: u8,
}

impl DigitOptimizer {
    pub fn new(stats: Vec<DigitStats>, compare_digit: u8) -> Self {
        Self {
            stats,
            compare_digit,
        }
    }

    /// Win rate per 1-based offset across a set of post-entry sequences.
    pub fn offset_stats(&self, sequences: &[&Vec<u8>]) -> BTreeMap<usize, OffsetStats> {
        let mut result: BTreeMap<usize, OffsetStats> = BTreeMap::new();
        for sequence in sequences {
            for (i, &digit) in sequence.iter().enumerate() {
                let entry = result.entry(i + 1).or_default();
                if digit > self.compare_digit {
                    entry.wins += 1;
                } else {
                    entry.losses += 1;
                }
            }
        }
        for entry in result.values_mut() {
            let total = entry.wins + entry.losses;
            if total > 0 {
                entry.win_rate = entry.wins as f64 / total as f64;
            }
        }
        result
    }

    /// Best entry digit and horizon given the trade that just resolved.
    ///
    /// Matches the trade's trailing digits against each stored sequence at
    /// the aligned positions (a digit landing outside a sequence is a
    /// non-match), then takes the offset with the strictly best win rate.
    pub fn next_config(&self, last_trade: &LastTrade) -> OptimalConfig {
        let context = &last_trade.recent_digits;
        // Position of each context digit inside a stored sequence, aligned
        // so the last context digit sits at `ticks - 1`.
        let positions: Vec<isize> = (0..context.len())
            .map(|idx| last_trade.ticks as isize - (context.len() - idx) as isize)
            .collect();

        let mut best = OptimalConfig::zero_confidence(last_trade.entry_digit);
        for digit_stat in &self.stats {
            let matching: Vec<&Vec<u8>> = digit_stat
                .history
                .iter()
                .filter(|sequence| {
                    context.iter().zip(&positions).all(|(&digit, &pos)| {
                        usize::try_from(pos)
                            .ok()
                            .and_then(|p| sequence.get(p))
                            .is_some_and(|&d| d == digit)
                    })
                })
                .collect();

            let stats = self.offset_stats(&matching);
            let mut best_rate = 0.0f64;
            let mut best_tick = 0usize;
            for (&tick, offset) in &stats {
                if offset.win_rate > best_rate {
                    best_rate = offset.win_rate;
                    best_tick = tick;
                }
            }

            debug!(
                digit = digit_stat.digit,
                matching = matching.len(),
                best_tick,
                best_rate,
                "scored digit history"
            );

            if best_rate > best.win_rate {
                best = OptimalConfig {
                    entry_digit: digit_stat.digit,
                    ticks: best_tick,
                    win_rate: best_rate,
                };
            }
        }

        best.win_rate = round1(best.win_rate);
        best
    }
}

fn floor_digit(value: f64) -> u8 {
    value.floor() as u8
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
