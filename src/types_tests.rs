//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn trade(success: bool, profit: Decimal) -> TradeResult {
        TradeResult {
            success,
            stake: dec!(1),
            profit,
            balance_after: dec!(100),
        }
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(
            StopReason::BalanceExhausted.to_string(),
            "BALANCE_EXHAUSTED"
        );
        assert_eq!(StopReason::ZeroStake.to_string(), "ZERO_STAKE");
        assert_eq!(
            StopReason::StakeExceedsBalance.to_string(),
            "STAKE_EXCEEDS_BALANCE"
        );
    }

    #[test]
    fn test_empty_analysis_is_all_zero() {
        let analysis = BacktestAnalysis::empty(4);
        assert_eq!(analysis.ticks, 4);
        assert_eq!(analysis.total_trades, 0);
        assert_eq!(analysis.win_rate, 0.0);
        assert!(analysis.trades.is_empty());
    }

    #[test]
    fn test_equity_run_totals() {
        let run = EquityRun {
            initial_balance: dec!(100),
            final_balance: dec!(100.84),
            total_volume: dec!(3),
            max_balance: dec!(101.84),
            min_balance: dec!(100),
            max_drawdown_pct: Decimal::ZERO,
            trades: vec![
                trade(true, dec!(0.92)),
                trade(true, dec!(0.92)),
                trade(false, dec!(-1)),
            ],
            max_stake_used: MaxStakeInfo::default(),
            stopped: None,
        };
        assert_eq!(run.total_profit(), dec!(0.84));
        assert_eq!(run.win_count(), 2);
    }

    #[test]
    fn test_trade_signal_serialization() {
        let signal = TradeSignal {
            position: 12,
            success: true,
            result_value: 7.0,
        };
        let json = serde_json::to_string(&signal).unwrap();
        let back: TradeSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signal);
    }
}
