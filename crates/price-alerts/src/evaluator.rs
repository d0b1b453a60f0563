use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::thresholds::{ThresholdBook, ThresholdRule};
use crate::{Alert, AlertKind};

/// Number of alerts kept in the recent history
pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first alert list bounded at [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct AlertHistory {
    alerts: VecDeque<Alert>,
}

impl AlertHistory {
    pub fn push(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(HISTORY_CAPACITY);
    }

    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.front()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }
}

/// Checks ticks against threshold rules.
///
/// Every qualifying tick alerts; there is no de-duplication or re-arm state.
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    rules: ThresholdBook,
    history: AlertHistory,
    last_id: i64,
}

impl AlertEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rule(&mut self, symbol: &str, rule: ThresholdRule) -> Option<ThresholdRule> {
        self.rules.set(symbol, rule)
    }

    pub fn remove_rule(&mut self, symbol: &str) -> Option<ThresholdRule> {
        self.rules.remove(symbol)
    }

    pub fn rules(&self) -> &ThresholdBook {
        &self.rules
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    /// Evaluate one tick. On a crossing the alert is recorded in the history
    /// and returned so the caller can notify.
    pub fn on_tick(&mut self, symbol: &str, price: f64, now: DateTime<Utc>) -> Option<Alert> {
        let rule = *self.rules.get(symbol)?;

        // Lower bound is checked first
        let (kind, threshold) = if price <= rule.lower {
            (AlertKind::Lower, rule.lower)
        } else if price >= rule.upper {
            (AlertKind::Upper, rule.upper)
        } else {
            return None;
        };

        let alert = Alert {
            id: self.next_id(now),
            symbol: symbol.to_string(),
            price,
            kind,
            threshold,
            timestamp: now,
        };

        tracing::info!(
            symbol = %alert.symbol,
            price = alert.price,
            kind = alert.kind.as_str(),
            threshold = alert.threshold,
            "Price alert triggered"
        );

        self.history.push(alert.clone());
        Some(alert)
    }

    /// Millisecond timestamp, bumped when needed so ids strictly increase
    fn next_id(&mut self, now: DateTime<Utc>) -> i64 {
        let id = now.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator_with_x() -> AlertEvaluator {
        let mut evaluator = AlertEvaluator::new();
        evaluator.set_rule("X", ThresholdRule::new(100.0, 110.0).unwrap());
        evaluator
    }

    #[test]
    fn test_lower_crossing() {
        let mut evaluator = evaluator_with_x();
        let alert = evaluator.on_tick("X", 99.0, Utc::now()).unwrap();

        assert_eq!(alert.kind, AlertKind::Lower);
        assert_eq!(alert.threshold, 100.0);
        assert_eq!(alert.price, 99.0);
        assert_eq!(alert.symbol, "X");
    }

    #[test]
    fn test_upper_crossing() {
        let mut evaluator = evaluator_with_x();
        let alert = evaluator.on_tick("X", 111.0, Utc::now()).unwrap();

        assert_eq!(alert.kind, AlertKind::Upper);
        assert_eq!(alert.threshold, 110.0);
    }

    #[test]
    fn test_inside_band_is_quiet() {
        let mut evaluator = evaluator_with_x();
        assert!(evaluator.on_tick("X", 105.0, Utc::now()).is_none());
        assert!(evaluator.history().is_empty());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut evaluator = evaluator_with_x();
        assert_eq!(evaluator.on_tick("X", 100.0, Utc::now()).unwrap().kind, AlertKind::Lower);
        assert_eq!(evaluator.on_tick("X", 110.0, Utc::now()).unwrap().kind, AlertKind::Upper);
    }

    #[test]
    fn test_equal_bounds_favor_lower() {
        let mut evaluator = AlertEvaluator::new();
        evaluator.set_rule("EQ", ThresholdRule::new(50.0, 50.0).unwrap());
        assert_eq!(evaluator.on_tick("EQ", 50.0, Utc::now()).unwrap().kind, AlertKind::Lower);
    }

    #[test]
    fn test_unknown_symbol_never_alerts() {
        let mut evaluator = evaluator_with_x();
        for price in [0.0, 1.0, 1e9, -5.0] {
            assert!(evaluator.on_tick("Y", price, Utc::now()).is_none());
        }
        assert!(evaluator.history().is_empty());
    }

    #[test]
    fn test_every_qualifying_tick_alerts() {
        let mut evaluator = evaluator_with_x();
        let now = Utc::now();
        for price in [99.0, 98.0, 105.0, 99.5] {
            evaluator.on_tick("X", price, now);
        }
        assert_eq!(evaluator.history().len(), 3);
    }

    #[test]
    fn test_history_bounded_newest_first() {
        let mut evaluator = evaluator_with_x();
        let now = Utc::now();
        for i in 0..25 {
            evaluator.on_tick("X", 50.0 + i as f64, now);
            assert!(evaluator.history().len() <= HISTORY_CAPACITY);
        }

        let history = evaluator.history().to_vec();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].price, 74.0);
        assert_eq!(evaluator.history().latest().unwrap().price, 74.0);
        assert_eq!(history[HISTORY_CAPACITY - 1].price, 65.0);
    }

    #[test]
    fn test_ids_strictly_increase_within_same_millisecond() {
        let mut evaluator = evaluator_with_x();
        let now = Utc::now();
        let a = evaluator.on_tick("X", 1.0, now).unwrap();
        let b = evaluator.on_tick("X", 2.0, now).unwrap();
        let c = evaluator.on_tick("X", 3.0, now).unwrap();

        assert_eq!(a.id, now.timestamp_millis());
        assert!(b.id > a.id);
        assert!(c.id > b.id);
    }

    #[test]
    fn test_overwritten_rule_applies_immediately() {
        let mut evaluator = evaluator_with_x();
        evaluator.set_rule("X", ThresholdRule::new(10.0, 20.0).unwrap());

        assert!(evaluator.on_tick("X", 99.0, Utc::now()).unwrap().kind == AlertKind::Upper);
        assert!(evaluator.remove_rule("X").is_some());
        assert!(evaluator.on_tick("X", 99.0, Utc::now()).is_none());
    }
}
