//! Unit tests for the session context

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::{MonitorConfig, PolicyKind, StakeConfig};
    use crate::money::PolicyEvent;
    use crate::monitor::MonitorEvent;
    use rust_decimal_macros::dec;

    fn make_session() -> SessionContext {
        let stake = StakeConfig {
            kind: PolicyKind::Fixed,
            initial_stake: dec!(1),
            profit_percent: dec!(100),
            initial_balance: dec!(100),
            ..StakeConfig::default()
        };
        let monitor = MonitorConfig {
            window_size: 3,
            probation_threshold: 80.0,
        };
        SessionContext::new(stake, monitor).unwrap()
    }

    #[test]
    fn test_flip_tracker_fires_on_changes_only() {
        let mut flips = ResultFlipTracker::default();
        assert_eq!(flips.record(true), Some(Flip::ToWin));
        assert_eq!(flips.record(true), None);
        assert_eq!(flips.record(false), Some(Flip::ToLoss));
        assert_eq!(flips.record(false), None);
        assert_eq!(flips.record(true), Some(Flip::ToWin));
    }

    #[test]
    fn test_record_outcome_updates_all_parts() {
        let mut session = make_session();

        let update = session.record_outcome(true, dec!(1));
        assert_eq!(update.result.profit, dec!(1));
        assert_eq!(update.result.balance_after, dec!(101));
        assert_eq!(update.flip, Some(Flip::ToWin));
        assert!(update.monitor_events.is_empty());
        assert_eq!(session.monitor().current().unwrap().trades_count, 1);

        let update = session.record_outcome(true, dec!(1));
        assert_eq!(update.flip, None);
        assert_eq!(session.policy().balance(), dec!(102));
    }

    #[test]
    fn test_monitor_events_surface_through_session() {
        let mut session = make_session();
        session.record_outcome(false, dec!(1));
        session.record_outcome(false, dec!(1));
        let update = session.record_outcome(false, dec!(1));

        // Third trade completes the 3-trade window at 0%, under threshold
        assert!(update.monitor_events.iter().any(|e| matches!(
            e,
            MonitorEvent::ProbationOpened { .. }
        )));
    }

    #[test]
    fn test_target_event_surfaces_through_session() {
        let stake = StakeConfig {
            kind: PolicyKind::Fixed,
            initial_stake: dec!(1),
            profit_percent: dec!(100),
            initial_balance: dec!(100),
            target_profit: Some(dec!(2)),
            ..StakeConfig::default()
        };
        let mut session = SessionContext::from_parts(
            crate::money::StakePolicy::new(stake).unwrap(),
            crate::monitor::SequenceMonitor::new(MonitorConfig::default()),
        );

        session.record_outcome(true, dec!(1));
        let update = session.record_outcome(true, dec!(1));
        assert_eq!(
            update.policy_event,
            Some(PolicyEvent::TargetReached {
                profit: dec!(2),
                balance: dec!(102),
            })
        );
        // Session reset by the policy itself
        assert_eq!(session.policy().balance(), dec!(100));
    }

    #[test]
    fn test_reset_restarts_policy_and_flips() {
        let mut session = make_session();
        session.record_outcome(false, dec!(1));
        session.reset();

        assert_eq!(session.policy().balance(), dec!(100));
        // The flip tracker forgot the last outcome: next trade flips again
        let update = session.record_outcome(false, dec!(1));
        assert_eq!(update.flip, Some(Flip::ToLoss));
        // Window history survives the reset
        assert_eq!(session.monitor().current().unwrap().trades_count, 2);
    }
}
