//! Request/outcome counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe set of named counters, fixed at construction.
///
/// Bumping an unregistered name is a silent no-op: counters are
/// best-effort telemetry, never a correctness dependency.
pub struct StatsCounter {
    counters: HashMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        let counters = names.iter().map(|&n| (n, AtomicU64::new(0))).collect();
        Self { counters }
    }

    pub fn bump(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// One `name=value` line for shutdown summaries, sorted by name.
    pub fn summary(&self) -> String {
        let mut entries: Vec<(&str, u64)> = self
            .counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_read() {
        let stats = StatsCounter::new(&["issued", "verified"]);
        stats.bump("issued");
        stats.bump("issued");
        stats.bump("unknown"); // ignored
        assert_eq!(stats.get("issued"), 2);
        assert_eq!(stats.get("verified"), 0);
        assert_eq!(stats.get("unknown"), 0);
    }

    #[test]
    fn summary_is_sorted_and_stable() {
        let stats = StatsCounter::new(&["b", "a"]);
        stats.bump("b");
        assert_eq!(stats.summary(), "a=0 b=1");
    }
}
