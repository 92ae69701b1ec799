//! Live session context
//!
//! Owns one trading session's mutable state: the stake policy, the
//! sequence-window monitor and the outcome-flip tracker. The trading loop
//! feeds each resolved trade in once and gets back everything that changed,
//! so side effects (persistence, notifications) happen in one place.

#[cfg(test)]
mod tests;

use crate::config::{MonitorConfig, StakeConfig};
use crate::error::Result;
use crate::money::{PolicyEvent, StakePolicy};
use crate::monitor::{MonitorEvent, SequenceMonitor};
use crate::types::TradeResult;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Direction of an outcome flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Flip {
    ToWin,
    ToLoss,
}

/// Reports when a trade's outcome differs from the previous trade's.
///
/// The very first trade always flips: there is no previous outcome to match.
#[derive(Debug, Default)]
pub struct ResultFlipTracker {
    previous: Option<bool>,
}

impl ResultFlipTracker {
    pub fn record(&mut self, is_win: bool) -> Option<Flip> {
        let flipped = self.previous != Some(is_win);
        self.previous = Some(is_win);
        flipped.then_some(if is_win { Flip::ToWin } else { Flip::ToLoss })
    }
}

/// Everything one resolved trade changed.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub result: TradeResult,
    pub policy_event: Option<PolicyEvent>,
    pub monitor_events: Vec<MonitorEvent>,
    pub flip: Option<Flip>,
}

/// Mutable state of one live trading session.
pub struct SessionContext {
    policy: StakePolicy,
    monitor: SequenceMonitor,
    flips: ResultFlipTracker,
}

impl SessionContext {
    pub fn new(stake: StakeConfig, monitor: MonitorConfig) -> Result<Self> {
        Ok(Self {
            policy: StakePolicy::new(stake)?,
            monitor: SequenceMonitor::new(monitor),
            flips: ResultFlipTracker::default(),
        })
    }

    /// Resume with a monitor restored from persisted windows.
    pub fn from_parts(policy: StakePolicy, monitor: SequenceMonitor) -> Self {
        Self {
            policy,
            monitor,
            flips: ResultFlipTracker::default(),
        }
    }

    pub fn policy(&self) -> &StakePolicy {
        &self.policy
    }

    pub fn monitor(&self) -> &SequenceMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut SequenceMonitor {
        &mut self.monitor
    }

    pub fn next_stake(&self) -> Decimal {
        self.policy.next_stake()
    }

    /// Route one resolved trade through the policy, the monitor and the
    /// flip tracker.
    pub fn record_outcome(&mut self, success: bool, stake: Decimal) -> SessionUpdate {
        let policy_event = self.policy.record_outcome(success, stake);
        let result = self
            .policy
            .last_trade()
            .copied()
            .unwrap_or(TradeResult {
                success,
                stake,
                profit: Decimal::ZERO,
                balance_after: self.policy.balance(),
            });
        let monitor_events = self.monitor.record_outcome(success);
        let flip = self.flips.record(success);

        debug!(
            success,
            %stake,
            balance = %result.balance_after,
            monitor_events = monitor_events.len(),
            ?flip,
            "session outcome recorded"
        );

        SessionUpdate {
            result,
            policy_event,
            monitor_events,
            flip,
        }
    }

    /// Restart the money-management session; window history is unaffected.
    pub fn reset(&mut self) {
        self.policy.reset_session();
        self.flips = ResultFlipTracker::default();
    }
}
