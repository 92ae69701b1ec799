//! Money management: stake-sizing policy state machine
//!
//! One `StakePolicy` instance per live session. The policy owns the session
//! balance and all sizing state; `record_outcome` is the only mutation point
//! and `next_stake` is a read-only query, so the two can never disagree about
//! what the last trade did. No I/O happens here; callers feed resolved
//! outcomes in and render the returned events.


use crate::config::{PolicyKind, StakeConfig};
use crate::error::Result;
use crate::types::TradeResult;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Notification raised by `record_outcome`.
///
/// Returned as plain data instead of invoking a registered callback; the
/// caller (notification layer) decides how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PolicyEvent {
    /// Session profit reached the configured target; the policy has already
    /// reset itself to the session's initial state.
    TargetReached { profit: Decimal, balance: Decimal },
}

/// Snapshot of the policy's sizing state, for dashboards and logs.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyStats {
    pub current_balance: Decimal,
    pub initial_balance: Decimal,
    pub session_profit: Decimal,
    pub target_profit: Option<Decimal>,
    pub consecutive_wins: u32,
    pub consecutive_losses: u32,
    pub soros_level: u32,
    pub recovery_mode: bool,
    pub wins_required: u32,
    pub last_stake: Decimal,
    pub last_profit: Decimal,
}

/// Stake-sizing state machine covering all five policy variants.
pub struct StakePolicy {
    config: StakeConfig,
    balance: Decimal,
    initial_balance: Decimal,
    session_profit: Decimal,
    /// Stake planned for the next trade, before the balance/cap guards
    current_stake: Decimal,
    last_trade: Option<TradeResult>,
    consecutive_wins: u32,
    consecutive_losses: u32,
    /// Profit of the last winning trade
    last_profit: Decimal,
    /// Current soros compounding depth
    soros_level: u32,
    /// fixed-with-recovery compounding counter
    soros_count: u32,
    /// Running sum of lost stakes since the last win (martingale)
    accumulated_losses: Decimal,
    /// Outstanding loss pot to recover (martingale-soros recovery)
    accumulated_loss: Decimal,
    recovery_mode: bool,
    /// Wins required before the recovery stake fires
    current_wins_required: u32,
    max_wins_required: u32,
    /// Last planned stake was a lump-sum recovery stake
    is_martingale_trade: bool,
    rng: StdRng,
}

impl StakePolicy {
    pub fn new(config: StakeConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Construct with an explicit RNG so the randomized recovery win-count
    /// draw is reproducible in tests.
    pub fn with_rng(config: StakeConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let max_wins_required = if config.wins_before_martingale == 0 {
            3
        } else {
            config.wins_before_martingale
        };
        Ok(Self {
            balance: config.initial_balance,
            initial_balance: config.initial_balance,
            session_profit: Decimal::ZERO,
            current_stake: config.initial_stake,
            last_trade: None,
            consecutive_wins: 0,
            consecutive_losses: 0,
            last_profit: Decimal::ZERO,
            soros_level: 0,
            soros_count: 0,
            accumulated_losses: Decimal::ZERO,
            accumulated_loss: Decimal::ZERO,
            recovery_mode: false,
            current_wins_required: max_wins_required,
            max_wins_required,
            is_martingale_trade: false,
            rng,
            config,
        })
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn last_trade(&self) -> Option<&TradeResult> {
        self.last_trade.as_ref()
    }

    pub fn kind(&self) -> PolicyKind {
        self.config.kind
    }

    /// Stake for the next trade. `0` means "do not trade": the balance is
    /// exhausted or the required stake exceeds the balance or the cap.
    pub fn next_stake(&self) -> Decimal {
        if self.balance <= Decimal::ZERO {
            warn!(balance = %self.balance, "balance exhausted, refusing to stake");
            return Decimal::ZERO;
        }
        let stake = if self.last_trade.is_none() {
            self.config.initial_stake.min(self.balance)
        } else {
            self.current_stake
        };
        if stake <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if stake > self.balance {
            warn!(%stake, balance = %self.balance, "stake exceeds balance");
            return Decimal::ZERO;
        }
        if stake > self.config.stake_cap() {
            warn!(%stake, cap = %self.config.stake_cap(), "stake exceeds cap");
            return Decimal::ZERO;
        }
        stake
    }

    /// Record a resolved trade and compute the stake for the following one.
    ///
    /// `stake` is the amount actually risked, which may differ from the
    /// planned stake if the execution layer adjusted it.
    pub fn record_outcome(&mut self, success: bool, stake: Decimal) -> Option<PolicyEvent> {
        let profit = if success {
            stake * self.config.profit_rate()
        } else {
            -stake
        };

        self.balance += profit;
        self.session_profit += profit;

        // Wins shrink the outstanding recovery pot by their profit.
        if success && self.accumulated_loss > Decimal::ZERO {
            self.accumulated_loss = (self.accumulated_loss - profit).max(Decimal::ZERO);
        }

        let mut event = None;
        if let Some(target) = self.config.target_profit {
            if self.session_profit >= target {
                info!(
                    profit = %self.session_profit,
                    %target,
                    balance = %self.balance,
                    "session profit target reached, resetting session"
                );
                event = Some(PolicyEvent::TargetReached {
                    profit: self.session_profit,
                    balance: self.balance,
                });
                self.reset_session();
            }
        }

        self.last_trade = Some(TradeResult {
            success,
            stake,
            profit,
            balance_after: self.balance,
        });

        if success {
            self.consecutive_wins += 1;
            self.consecutive_losses = 0;
            self.accumulated_losses = Decimal::ZERO;
            self.last_profit = profit;
        } else {
            self.consecutive_losses += 1;
            self.consecutive_wins = 0;
            self.soros_level = 0;
            self.soros_count = 0;
            self.accumulated_losses += stake;
            self.last_profit = Decimal::ZERO;
        }

        self.current_stake = self.compute_next_stake(success, stake);
        event
    }

    /// Adjust the payout percentage mid-session (contract terms changed).
    pub fn update_profit_percent(&mut self, profit_percent: Decimal) {
        self.config.profit_percent = profit_percent;
    }

    /// Reset every counter and the balance back to the session's initial
    /// state. Called on the target-profit event and on explicit restarts.
    pub fn reset_session(&mut self) {
        self.balance = self.initial_balance;
        self.session_profit = Decimal::ZERO;
        self.current_stake = self.config.initial_stake;
        self.consecutive_wins = 0;
        self.consecutive_losses = 0;
        self.soros_level = 0;
        self.soros_count = 0;
        self.accumulated_losses = Decimal::ZERO;
        self.accumulated_loss = Decimal::ZERO;
        self.recovery_mode = false;
        self.is_martingale_trade = false;
        self.current_wins_required = self.max_wins_required;
    }

    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            current_balance: self.balance,
            initial_balance: self.initial_balance,
            session_profit: self.session_profit,
            target_profit: self.config.target_profit,
            consecutive_wins: self.consecutive_wins,
            consecutive_losses: self.consecutive_losses,
            soros_level: self.soros_level,
            recovery_mode: self.recovery_mode,
            wins_required: self.current_wins_required,
            last_stake: self.last_trade.map(|t| t.stake).unwrap_or(Decimal::ZERO),
            last_profit: self.last_trade.map(|t| t.profit).unwrap_or(Decimal::ZERO),
        }
    }

    fn compute_next_stake(&mut self, success: bool, stake: Decimal) -> Decimal {
        match self.config.kind {
            PolicyKind::Fixed => self.config.initial_stake.min(self.balance),
            PolicyKind::Martingale => self.martingale_stake(success),
            PolicyKind::Soros => self.soros_stake(success),
            PolicyKind::MartingaleSoros => self.martingale_soros_stake(success, stake),
            PolicyKind::FixedWithRecovery => self.fixed_with_recovery_stake(success),
        }
    }

    fn martingale_stake(&mut self, success: bool) -> Decimal {
        if success {
            return self.config.initial_stake;
        }
        if let Some(max_loss) = self.config.max_loss {
            if self.consecutive_losses >= max_loss {
                warn!(
                    losses = self.consecutive_losses,
                    max_loss, "max consecutive losses reached, forcing reset"
                );
                self.consecutive_losses = 0;
                self.accumulated_losses = Decimal::ZERO;
                return self.config.initial_stake;
            }
        }
        let required =
            (self.accumulated_losses + self.config.initial_stake) / self.config.profit_rate();
        required
            .max(self.config.initial_stake)
            .min(self.config.stake_cap())
            .min(self.balance)
    }

    fn soros_stake(&mut self, success: bool) -> Decimal {
        if !success {
            // soros_level already cleared by the counter update
            return self.config.initial_stake;
        }
        self.soros_level += 1;
        if self.soros_level > self.config.soros_level {
            self.soros_level = 0;
            return self.config.initial_stake;
        }
        (self.config.initial_stake + self.last_profit).min(self.config.stake_cap())
    }

    fn martingale_soros_stake(&mut self, success: bool, stake: Decimal) -> Decimal {
        if success {
            if self.recovery_mode {
                if self.consecutive_wins >= self.current_wins_required {
                    let recovery = (self.accumulated_loss + self.config.initial_stake)
                        / self.config.profit_rate();
                    let final_stake = recovery.min(self.config.stake_cap()).min(self.balance);
                    debug!(
                        pot = %self.accumulated_loss,
                        stake = %final_stake,
                        "recovery win count reached, placing lump-sum recovery stake"
                    );
                    self.recovery_mode = false;
                    self.consecutive_wins = 0;
                    self.accumulated_loss = Decimal::ZERO;
                    self.is_martingale_trade = true;
                    return final_stake;
                }
                return self.config.initial_stake;
            }
            self.is_martingale_trade = false;
            return self.soros_stake(true);
        }

        if self.is_martingale_trade {
            // The lump-sum recovery trade itself lost: redraw how many wins
            // are required before the next attempt.
            self.current_wins_required = self.rng.random_range(1..=self.max_wins_required);
            debug!(
                wins_required = self.current_wins_required,
                "recovery stake lost, redrew required win count"
            );
        }
        self.recovery_mode = true;
        self.accumulated_loss += stake;
        self.is_martingale_trade = false;
        self.config.initial_stake
    }

    fn fixed_with_recovery_stake(&mut self, success: bool) -> Decimal {
        let cfg = &self.config;
        if self.soros_count >= cfg.soros_level {
            self.soros_count = 0;
            return cfg.initial_stake;
        }

        if self.balance < self.initial_balance
            && self.consecutive_wins >= cfg.wins_before_recovery
        {
            let to_recover = self.initial_balance - self.balance;
            let recovery = (to_recover / cfg.profit_rate()).round_dp(2);
            if recovery <= cfg.stake_cap() {
                return recovery.max(cfg.initial_stake);
            }
        }

        if cfg.enable_soros
            && success
            && self.balance > self.initial_balance
            && self.last_profit > Decimal::ZERO
        {
            let compounded = cfg.initial_stake + self.last_profit * cfg.soros_percent / dec!(100);
            self.soros_count += 1;
            return compounded.round_dp(2).min(cfg.stake_cap());
        }

        self.soros_count = 0;
        cfg.initial_stake
    }
}
