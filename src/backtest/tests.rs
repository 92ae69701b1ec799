//! Unit tests for the backtest scanner, simulator and report assembly

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::{BacktestConfig, PolicyKind, StakeConfig};
    use crate::money::StakePolicy;
    use crate::strategy::DigitOverRule;
    use crate::types::{StopReason, TradeSignal};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn stake_config() -> StakeConfig {
        StakeConfig {
            kind: PolicyKind::Fixed,
            initial_stake: dec!(1),
            profit_percent: dec!(100),
            initial_balance: dec!(100),
            ..StakeConfig::default()
        }
    }

    fn win(position: usize) -> TradeSignal {
        TradeSignal {
            position,
            success: true,
            result_value: 9.0,
        }
    }

    fn loss(position: usize) -> TradeSignal {
        TradeSignal {
            position,
            success: false,
            result_value: 0.0,
        }
    }

    #[test]
    fn test_scan_counts_and_spaces_trades() {
        // Entries on digit 3 at positions 0, 1, 2 and 4; the trade at 0
        // locks positions 1 and 2 out (1-step horizon plus 2-step delay).
        let observations = [3.0, 3.0, 3.0, 6.0, 3.0, 2.0];
        let rule = DigitOverRule::new(3, 1);
        let analysis = &Backtest::new(&rule, 1, 1).run(&observations)[0];

        assert_eq!(analysis.possible_trades, 4);
        assert_eq!(analysis.total_trades, 2);
        assert_eq!(analysis.skipped_trades, 2);
        assert_eq!(
            analysis.trades.iter().map(|t| t.position).collect::<Vec<_>>(),
            vec![0, 4]
        );
        // Targets 3 and 2 are both above the compare digit 1
        assert_eq!(analysis.wins, 2);
        assert_eq!(analysis.losses, 0);
        assert!((analysis.win_rate - 100.0).abs() < 1e-9);
        assert_eq!(analysis.max_consecutive_wins, 2);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let observations: Vec<f64> = (0..200).map(|i| (i * 7 % 10) as f64).collect();
        let rule = DigitOverRule::new(3, 1);
        let scanner = Backtest::new(&rule, 1, 5);

        let a = scanner.run(&observations);
        let b = scanner.run(&observations);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.total_trades, y.total_trades);
            assert_eq!(x.wins, y.wins);
            assert_eq!(x.trades, y.trades);
        }
    }

    #[test]
    fn test_counted_trades_respect_cooldown() {
        let observations: Vec<f64> = (0..500).map(|i| (i * 3 % 10) as f64).collect();
        let rule = DigitOverRule::new(3, 4);
        for analysis in Backtest::new(&rule, 1, 10).run(&observations) {
            for pair in analysis.trades.windows(2) {
                assert!(
                    pair[1].position >= pair[0].position + analysis.ticks + RESULT_DELAY,
                    "horizon {}: trades at {} and {} overlap",
                    analysis.ticks,
                    pair[0].position,
                    pair[1].position
                );
            }
        }
    }

    #[test]
    fn test_degenerate_input_yields_zero_trades() {
        let rule = DigitOverRule::new(3, 1);
        let scanner = Backtest::new(&rule, 1, 10);

        for analysis in scanner.run(&[]) {
            assert_eq!(analysis.total_trades, 0);
            assert_eq!(analysis.possible_trades, 0);
            assert_eq!(analysis.win_rate, 0.0);
        }
        // Horizon longer than the whole array
        for analysis in scanner.run(&[3.0, 5.0]) {
            if analysis.ticks >= 2 {
                assert_eq!(analysis.total_trades, 0);
            }
        }
    }

    #[test]
    fn test_simulator_conserves_balance() {
        let policy = StakePolicy::new(stake_config()).unwrap();
        let signals = vec![win(0), loss(4), win(8), win(12), loss(16)];
        let run = EquitySimulator::new(policy).run(&signals);

        assert_eq!(run.trades.len(), 5);
        assert_eq!(run.initial_balance + run.total_profit(), run.final_balance);
        assert_eq!(run.final_balance, dec!(101));
        assert_eq!(run.total_volume, dec!(5));
        assert!(run.stopped.is_none());
    }

    #[test]
    fn test_simulator_tracks_extremes_and_drawdown() {
        let policy = StakePolicy::new(stake_config()).unwrap();
        let signals = vec![win(0), loss(4), loss(8)];
        let run = EquitySimulator::new(policy).run(&signals);

        assert_eq!(run.max_balance, dec!(101));
        assert_eq!(run.min_balance, dec!(99));
        // (101 - 99) / 101 * 100
        let expected = dec!(2) / dec!(101) * dec!(100);
        assert!((run.max_drawdown_pct - expected).abs() < dec!(0.0001));
    }

    #[test]
    fn test_simulator_stops_before_ruinous_loss() {
        let mut cfg = stake_config();
        cfg.initial_stake = dec!(5);
        cfg.initial_balance = dec!(10);
        let policy = StakePolicy::new(cfg).unwrap();

        let signals = vec![loss(0), loss(4), loss(8)];
        let run = EquitySimulator::new(policy).run(&signals);

        // Second loss would take the balance from 5 to 0: refused
        assert_eq!(run.trades.len(), 1);
        assert_eq!(run.final_balance, dec!(5));
        assert_eq!(run.stopped, Some(StopReason::BalanceExhausted));
    }

    #[test]
    fn test_simulator_records_max_stake() {
        let mut cfg = stake_config();
        cfg.kind = PolicyKind::Martingale;
        let policy = StakePolicy::new(cfg).unwrap();

        let signals = vec![loss(0), loss(4), win(8)];
        let run = EquitySimulator::new(policy).run(&signals);

        // Stakes grow 1, 2, 5: the martingale recovery stake is the largest
        assert_eq!(run.trades.len(), 3);
        assert_eq!(run.max_stake_used.trade_number, 3);
        assert!(run.max_stake_used.stake > run.trades[0].stake);
    }

    #[test]
    fn test_report_simulates_target_horizon_and_captures_digits() {
        let observations: Vec<f64> = (0..400).map(|i| (i * 7 % 10) as f64).collect();
        let rule = DigitOverRule::new(3, 1);
        let params = BacktestParams {
            scan: BacktestConfig {
                min_horizon: 1,
                max_horizon: 3,
                target_horizon: 2,
                entry_digit: Some(3),
                ..BacktestConfig::default()
            },
            stake: stake_config(),
        };

        let report = run_backtest(&rule, &observations, &params).unwrap();
        assert_eq!(report.horizons.len(), 3);

        let equity = report.equity.expect("target horizon simulated");
        assert_eq!(
            equity.trades.len(),
            report.horizons[1].analysis.total_trades
        );
        assert_eq!(equity.initial_balance, params.scan.initial_balance);

        let digits = report.digit_stats.expect("entry digit configured");
        assert_eq!(digits.digit, 3);
        assert_eq!(digits.trades, report.horizons[0].analysis.total_trades);
    }

    #[test]
    fn test_report_equity_ignores_session_target() {
        // Entries on every 3 win after one step; spacing 4 clears the cooldown
        let observations: Vec<f64> = [3.0, 9.0, 0.0, 0.0].repeat(30);
        let rule = DigitOverRule::new(3, 1);
        let mut stake = stake_config();
        stake.target_profit = Some(dec!(2));
        let params = BacktestParams {
            scan: BacktestConfig {
                min_horizon: 1,
                max_horizon: 1,
                target_horizon: 1,
                ..BacktestConfig::default()
            },
            stake,
        };

        let report = run_backtest(&rule, &observations, &params).unwrap();
        let equity = report.equity.expect("target horizon simulated");
        assert!(equity.total_profit() > dec!(2));
        // No mid-replay session reset: the run conserves profit
        assert_eq!(
            equity.initial_balance + equity.total_profit(),
            equity.final_balance
        );
    }

    #[test]
    fn test_report_rejects_invalid_scan_range() {
        let rule = DigitOverRule::new(3, 1);
        let params = BacktestParams {
            scan: BacktestConfig {
                min_horizon: 5,
                max_horizon: 2,
                ..BacktestConfig::default()
            },
            stake: stake_config(),
        };
        assert!(run_backtest(&rule, &[3.0, 5.0, 1.0], &params).is_err());
    }
}
