//! Entry rules
//!
//! Concrete `EntryRule` implementations the backtest engine scans with. Each
//! rule is a small pure predicate over the observation array; they hold no
//! per-scan state.

#[cfg(test)]
mod tests;

use crate::backtest::EntryRule;

/// Enter when the current digit equals `entry_digit`; win when the digit
/// `horizon` steps later is strictly greater than `compare_digit`.
///
/// Observations are floored before comparison, so raw quote values work as
/// well as pre-extracted digits.
pub struct DigitOverRule {
    pub entry_digit: u8,
    pub compare_digit: u8,
    name: String,
}

impl DigitOverRule {
    pub fn new(entry_digit: u8, compare_digit: u8) -> Self {
        Self {
            entry_digit,
            compare_digit,
            name: format!("digit {entry_digit} over {compare_digit}"),
        }
    }
}

impl EntryRule for DigitOverRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, observations: &[f64], position: usize, horizon: usize) -> Option<bool> {
        if observations[position].floor() as u8 != self.entry_digit {
            return None;
        }
        let target = observations.get(position + horizon)?;
        Some(target.floor() as u8 > self.compare_digit)
    }
}

/// Enter everywhere; win when the value `horizon` steps later is strictly
/// above the entry value.
pub struct RiseRule;

impl EntryRule for RiseRule {
    fn name(&self) -> &str {
        "rise"
    }

    fn evaluate(&self, observations: &[f64], position: usize, horizon: usize) -> Option<bool> {
        let target = observations.get(position + horizon)?;
        Some(*target > observations[position])
    }
}

/// Mirror of [`RiseRule`]: win when the later value is strictly below.
pub struct FallRule;

impl EntryRule for FallRule {
    fn name(&self) -> &str {
        "fall"
    }

    fn evaluate(&self, observations: &[f64], position: usize, horizon: usize) -> Option<bool> {
        let target = observations.get(position + horizon)?;
        Some(*target < observations[position])
    }
}
