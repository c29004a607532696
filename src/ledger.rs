//! Per-scope call counting with scope-exit validation.

use crate::error::CountViolation;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

#[derive(Debug, Default)]
struct CallCount {
    actual: u64,
    expected: Option<u64>,
}

/// Tracks actual vs. expected invocation counts per `address:METHOD` key.
///
/// A ledger is created fresh at scope entry and discarded at scope exit.
/// Expected counts are registered lazily, on the first dispatch of a route
/// carrying a `times` annotation, never at table-construction time.
///
/// All mutation happens under one mutex so concurrent dispatches to the same
/// key never lose an increment.
#[derive(Debug, Default)]
pub(crate) struct CallLedger {
    entries: Mutex<HashMap<String, CallCount>>,
}

impl CallLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increment the actual call count for a key.
    pub(crate) fn record(&self, key: &str) {
        let mut entries = self.lock();
        entries.entry(key.to_owned()).or_default().actual += 1;
    }

    /// Register (or overwrite) the expected call count for a key.
    pub(crate) fn expect(&self, key: &str, count: u64) {
        let mut entries = self.lock();
        entries.entry(key.to_owned()).or_default().expected = Some(count);
    }

    /// Compare every key holding an expected count against its actual count.
    ///
    /// All violations are aggregated into one result, ordered by key for
    /// deterministic reporting.
    pub(crate) fn validate(&self) -> Result<(), Vec<CountViolation>> {
        let entries = self.lock();

        let mut violations: Vec<CountViolation> = entries
            .iter()
            .filter_map(|(key, count)| {
                count.expected.and_then(|expected| {
                    (count.actual != expected).then(|| CountViolation {
                        key: key.clone(),
                        expected,
                        actual: count.actual,
                    })
                })
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            violations.sort_by(|a, b| a.key.cmp(&b.key));
            Err(violations)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CallCount>> {
        // A poisoned ledger still holds coherent counts.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn unannotated_keys_never_violate() {
        let ledger = CallLedger::new();
        ledger.record("http://x.com/a/:GET");
        ledger.record("http://x.com/a/:GET");

        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn mismatch_is_reported_with_both_counts() {
        let ledger = CallLedger::new();
        ledger.expect("http://x.com/a/:GET", 2);
        ledger.record("http://x.com/a/:GET");

        let violations = ledger.validate().unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key, "http://x.com/a/:GET");
        assert_eq!(violations[0].expected, 2);
        assert_eq!(violations[0].actual, 1);
    }

    #[test]
    fn expected_zero_calls_with_none_made_passes() {
        let ledger = CallLedger::new();
        ledger.expect("http://x.com/a/:GET", 0);

        // An expectation with no dispatches cannot arise through the lazy
        // registration path, but the ledger itself treats 0 == 0 as satisfied.
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn all_violations_are_aggregated_in_key_order() {
        let ledger = CallLedger::new();
        ledger.expect("b:POST", 1);
        ledger.expect("a:GET", 3);
        ledger.record("a:GET");

        let violations = ledger.validate().unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].key, "a:GET");
        assert_eq!(violations[1].key, "b:POST");
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let ledger = Arc::new(CallLedger::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        ledger.record("key:GET");
                    }
                })
            })
            .collect();

        for handle in threads {
            handle.join().unwrap();
        }

        ledger.expect("key:GET", 800);
        assert!(ledger.validate().is_ok());
    }
}
