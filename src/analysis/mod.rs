//! Streak analytics over ordered outcome sequences
//!
//! Pure functions answering "how long do win/loss streaks run" and "what
//! happens after a streak" for any ordered sequence of trade outcomes. Used
//! by the backtest reports and the live dashboards; counts stay integral,
//! only rates and averages are `f64`.

pub mod optimizer;


use crate::types::{TradeResult, TradeSignal};
use serde::Serialize;
use std::collections::BTreeMap;

/// Anything with a binary win/loss outcome.
pub trait WinLoss {
    fn is_win(&self) -> bool;
}

impl WinLoss for TradeSignal {
    fn is_win(&self) -> bool {
        self.success
    }
}

impl WinLoss for TradeResult {
    fn is_win(&self) -> bool {
        self.success
    }
}

impl WinLoss for bool {
    fn is_win(&self) -> bool {
        *self
    }
}

/// Lengths of every maximal run of wins (or losses) in order of occurrence.
pub fn streak_lengths<T: WinLoss>(outcomes: &[T], for_win: bool) -> Vec<usize> {
    let mut streaks = Vec::new();
    let mut current = 0usize;
    for outcome in outcomes {
        if outcome.is_win() == for_win {
            current += 1;
        } else if current > 0 {
            streaks.push(current);
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current);
    }
    streaks
}

/// Mean streak length; `0.0` when the outcome never occurs.
pub fn average_consecutive<T: WinLoss>(outcomes: &[T], for_win: bool) -> f64 {
    let streaks = streak_lengths(outcomes, for_win);
    if streaks.is_empty() {
        return 0.0;
    }
    streaks.iter().sum::<usize>() as f64 / streaks.len() as f64
}

/// How many streaks of each exact length occurred, wins and losses separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreakDistribution {
    pub wins: BTreeMap<usize, usize>,
    pub losses: BTreeMap<usize, usize>,
}

pub fn streak_distribution<T: WinLoss>(outcomes: &[T]) -> StreakDistribution {
    let mut dist = StreakDistribution::default();
    for len in streak_lengths(outcomes, true) {
        *dist.wins.entry(len).or_insert(0) += 1;
    }
    for len in streak_lengths(outcomes, false) {
        *dist.losses.entry(len).or_insert(0) += 1;
    }
    dist
}

/// What follows a streak of a given exact length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ContinuationStats {
    /// How many streaks of exactly this length ended inside the sequence
    pub occurrences: usize,
    /// Mean length of the opposite-outcome run that followed (at least 1)
    pub average_run_after: f64,
    /// `occurrences / sequence length * 100`
    pub rate: f64,
}

/// For each loss-streak length, how the sequence continued afterwards.
///
/// A streak only counts once an opposite outcome ends it; a trailing streak
/// that runs off the end of the sequence is ignored.
pub fn continuation_after_losses<T: WinLoss>(outcomes: &[T]) -> BTreeMap<usize, ContinuationStats> {
    continuation_after(outcomes, false)
}

/// Mirror of [`continuation_after_losses`] for win streaks.
pub fn continuation_after_wins<T: WinLoss>(outcomes: &[T]) -> BTreeMap<usize, ContinuationStats> {
    continuation_after(outcomes, true)
}

fn continuation_after<T: WinLoss>(
    outcomes: &[T],
    for_win: bool,
) -> BTreeMap<usize, ContinuationStats> {
    let mut stats: BTreeMap<usize, ContinuationStats> = BTreeMap::new();
    if outcomes.is_empty() {
        return stats;
    }

    let mut streak = 0usize;
    for i in 0..outcomes.len() - 1 {
        if outcomes[i].is_win() == for_win {
            streak += 1;
            continue;
        }
        if streak > 0 {
            // The streak ended at `i`; measure how far the opposite run
            // starting here extends.
            let run_after = outcomes[i..]
                .iter()
                .take_while(|o| o.is_win() != for_win)
                .count();
            let entry = stats.entry(streak).or_default();
            entry.occurrences += 1;
            entry.average_run_after += (run_after as f64 - entry.average_run_after)
                / entry.occurrences as f64;
        }
        streak = 0;
    }

    let len = outcomes.len() as f64;
    for entry in stats.values_mut() {
        entry.rate = entry.occurrences as f64 / len * 100.0;
    }
    stats
}
