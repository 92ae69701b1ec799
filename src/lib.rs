//! Digit Trading Bot Core
//!
//! Money management, backtesting and live-session monitoring for short-dated
//! binary digit contracts.
//!
//! ## Architecture
//!
//! ```text
//! Observations → Backtest (EntryRule scans) → Reports (streaks, equity, digit stats)
//!                                                ↑
//! Live trades → SessionContext → StakePolicy (sizing) + SequenceMonitor (windows)
//!                     ↓
//!               TradeStore (SQLite ledger, hourly stats, window history)
//! ```

pub mod analysis;
pub mod backtest;
pub mod config;
pub mod error;
pub mod money;
pub mod monitor;
pub mod session;
pub mod storage;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod types_tests;
