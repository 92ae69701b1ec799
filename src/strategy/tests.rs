//! Unit tests for entry rules

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::backtest::EntryRule;

    #[test]
    fn test_digit_over_requires_entry_digit() {
        let rule = DigitOverRule::new(3, 1);
        let observations = [5.0, 3.0, 9.0];
        assert_eq!(rule.evaluate(&observations, 0, 1), None);
        assert_eq!(rule.evaluate(&observations, 1, 1), Some(true));
    }

    #[test]
    fn test_digit_over_floors_observations() {
        let rule = DigitOverRule::new(3, 1);
        // 3.9 floors to the entry digit; 1.2 floors to 1, not strictly greater
        let observations = [3.9, 1.2];
        assert_eq!(rule.evaluate(&observations, 0, 1), Some(false));
        // 2.0 floors to 2 > 1
        let observations = [3.0, 2.0];
        assert_eq!(rule.evaluate(&observations, 0, 1), Some(true));
    }

    #[test]
    fn test_digit_over_out_of_range_is_no_entry() {
        let rule = DigitOverRule::new(3, 1);
        let observations = [5.0, 3.0];
        assert_eq!(rule.evaluate(&observations, 1, 1), None);
    }

    #[test]
    fn test_rise_and_fall_compare_entry_value() {
        let observations = [100.0, 101.0, 99.0];
        assert_eq!(RiseRule.evaluate(&observations, 0, 1), Some(true));
        assert_eq!(RiseRule.evaluate(&observations, 1, 1), Some(false));
        assert_eq!(FallRule.evaluate(&observations, 1, 1), Some(true));
        // Equal values win neither direction
        let flat = [7.0, 7.0];
        assert_eq!(RiseRule.evaluate(&flat, 0, 1), Some(false));
        assert_eq!(FallRule.evaluate(&flat, 0, 1), Some(false));
    }
}
