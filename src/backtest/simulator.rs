//! Equity simulator
//!
//! Replays an ordered signal sequence through a bound stake policy and
//! records the resulting balance trajectory. Consumes abstract signals only,
//! so the same code paths validate historical scans and live trade streams.

use crate::money::StakePolicy;
use crate::types::{EquityRun, MaxStakeInfo, StopReason, TradeResult, TradeSignal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

/// Replays trade signals against one stake policy.
///
/// Running out of balance or being unable to stake is a normal terminal
/// condition reported in the run result, never an error. Bind a policy
/// without a session profit target here: a mid-run session reset would break
/// the run's balance accounting.
pub struct EquitySimulator {
    policy: StakePolicy,
}

impl EquitySimulator {
    pub fn new(policy: StakePolicy) -> Self {
        Self { policy }
    }

    pub fn run(mut self, signals: &[TradeSignal]) -> EquityRun {
        let initial_balance = self.policy.balance();
        let mut trades: Vec<TradeResult> = Vec::new();
        let mut max_balance = initial_balance;
        let mut min_balance = initial_balance;
        let mut total_volume = Decimal::ZERO;
        let mut max_stake_used = MaxStakeInfo::default();
        let mut stopped = None;

        for signal in signals {
            let balance = self.policy.balance();
            if balance <= Decimal::ZERO {
                warn!(%balance, "stopping run: balance exhausted");
                stopped = Some(StopReason::BalanceExhausted);
                break;
            }

            let stake = self.policy.next_stake();
            if stake <= Decimal::ZERO {
                warn!(%balance, "stopping run: policy refused to stake");
                stopped = Some(StopReason::ZeroStake);
                break;
            }
            if stake > balance {
                warn!(%stake, %balance, "stopping run: stake exceeds balance");
                stopped = Some(StopReason::StakeExceedsBalance);
                break;
            }
            // Losing this stake would leave nothing to continue with.
            if !signal.success && balance - stake <= Decimal::ZERO {
                warn!(%stake, %balance, "stopping run: a loss would exhaust the balance");
                stopped = Some(StopReason::BalanceExhausted);
                break;
            }

            total_volume += stake;
            if stake > max_stake_used.stake {
                max_stake_used = MaxStakeInfo {
                    stake,
                    balance,
                    trade_number: trades.len() + 1,
                };
            }

            // Session target events are irrelevant in a replay, drop them.
            let _ = self.policy.record_outcome(signal.success, stake);
            if let Some(result) = self.policy.last_trade().copied() {
                max_balance = max_balance.max(result.balance_after);
                min_balance = min_balance.min(result.balance_after);
                trades.push(result);
            }
        }

        let final_balance = self.policy.balance();
        let max_drawdown_pct = if max_balance > Decimal::ZERO {
            (max_balance - min_balance) / max_balance * dec!(100)
        } else {
            Decimal::ZERO
        };

        debug!(
            trades = trades.len(),
            %final_balance,
            drawdown = %max_drawdown_pct,
            ?stopped,
            "equity run complete"
        );

        EquityRun {
            initial_balance,
            final_balance,
            total_volume,
            max_balance,
            min_balance,
            max_drawdown_pct,
            trades,
            max_stake_used,
            stopped,
        }
    }
}
