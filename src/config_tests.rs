//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stake_config_defaults() {
        let config: StakeConfig = toml::from_str("").unwrap();
        assert_eq!(config.kind, PolicyKind::Fixed);
        assert_eq!(config.initial_stake, dec!(1));
        assert_eq!(config.profit_percent, dec!(92));
        assert_eq!(config.max_stake, None);
        assert_eq!(config.max_loss, None);
        assert_eq!(config.soros_level, 1);
        assert!(!config.enable_soros);
        assert_eq!(config.soros_percent, dec!(20));
        assert_eq!(config.wins_before_recovery, 3);
        assert_eq!(config.wins_before_martingale, 3);
        assert_eq!(config.target_profit, None);
        assert_eq!(config.initial_balance, dec!(1000));
    }

    #[test]
    fn test_stake_config_from_toml() {
        let toml_str = r#"
type = "martingale-soros"
initial_stake = 0.35
profit_percent = 87
max_stake = 50
max_loss = 7
target_profit = 25
"#;
        let config: StakeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.kind, PolicyKind::MartingaleSoros);
        assert_eq!(config.initial_stake, dec!(0.35));
        assert_eq!(config.profit_percent, dec!(87));
        assert_eq!(config.max_stake, Some(dec!(50)));
        assert_eq!(config.max_loss, Some(7));
        assert_eq!(config.target_profit, Some(dec!(25)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_kind_names_round_trip() {
        for kind in [
            PolicyKind::Fixed,
            PolicyKind::Martingale,
            PolicyKind::Soros,
            PolicyKind::MartingaleSoros,
            PolicyKind::FixedWithRecovery,
        ] {
            let toml_str = format!("type = \"{kind}\"");
            let config: StakeConfig = toml::from_str(&toml_str).unwrap();
            assert_eq!(config.kind, kind);
        }
    }

    #[test]
    fn test_monitor_config_defaults() {
        let config: MonitorConfig = toml::from_str("").unwrap();
        assert_eq!(config.window_size, 25);
        assert_eq!(config.probation_threshold, 80.0);
    }

    #[test]
    fn test_backtest_config_defaults_and_validation() {
        let config: BacktestConfig = toml::from_str("").unwrap();
        assert_eq!(config.min_horizon, 1);
        assert_eq!(config.max_horizon, 10);
        assert_eq!(config.target_horizon, 10);
        assert_eq!(config.entry_digit, None);
        assert_eq!(config.compare_digit, 1);
        assert_eq!(config.initial_balance, dec!(100));
        assert!(config.validate().is_ok());

        let bad: BacktestConfig = toml::from_str("min_horizon = 0").unwrap();
        assert!(bad.validate().is_err());
        let bad: BacktestConfig = toml::from_str("min_horizon = 5\nmax_horizon = 2").unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_database_config_defaults() {
        let config: DatabaseConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, "trades.db");
        assert_eq!(config.utc_offset_hours, -3);
    }

    #[test]
    fn test_app_config_from_partial_toml() {
        let toml_str = r#"
[stake]
type = "soros"
initial_stake = 2

[monitor]
window_size = 50
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.stake.kind, PolicyKind::Soros);
        assert_eq!(config.stake.initial_stake, dec!(2));
        assert_eq!(config.monitor.window_size, 50);
        // Unlisted sections fall back to defaults
        assert_eq!(config.backtest.max_horizon, 10);
        assert_eq!(config.database.path, "trades.db");
    }

    #[test]
    fn test_stake_validation_rejects_bad_values() {
        let config: StakeConfig = toml::from_str("initial_stake = 0").unwrap();
        assert!(config.validate().is_err());
        let config: StakeConfig = toml::from_str("profit_percent = -5").unwrap();
        assert!(config.validate().is_err());
        let config: StakeConfig =
            toml::from_str("initial_stake = 10\nmax_stake = 5").unwrap();
        assert!(config.validate().is_err());
        let config: StakeConfig = toml::from_str("soros_percent = 150").unwrap();
        assert!(config.validate().is_err());
        let config: StakeConfig = toml::from_str("target_profit = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
