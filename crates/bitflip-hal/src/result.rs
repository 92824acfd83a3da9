//! Execution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Histogram of measured bitstrings.
///
/// Keys read the classical register with bit 0 first, so character `i`
/// of a key is the value of classical bit `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring` (zero when never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of recorded shots.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no outcome was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over outcomes in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    /// Outcomes sorted by descending count, ties broken lexicographically.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// The most frequent outcome.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.sorted().into_iter().next()
    }

    /// Empirical probability of `bitstring`.
    #[allow(clippy::cast_precision_loss)]
    pub fn probability(&self, bitstring: &str) -> f64 {
        let total = self.total_shots();
        if total == 0 {
            0.0
        } else {
            self.get(bitstring) as f64 / total as f64
        }
    }

    /// Project every key onto the given bit positions.
    ///
    /// Positions beyond a key's length are skipped.
    pub fn marginal(&self, positions: &[usize]) -> Counts {
        let mut out = Counts::new();
        for (key, &count) in &self.0 {
            let bits: Vec<char> = key.chars().collect();
            let projected: String = positions.iter().filter_map(|&p| bits.get(p)).collect();
            out.insert(projected, count);
        }
        out
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.0
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (key, count) in iter {
            counts.insert(key, count);
        }
        counts
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement histogram.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Wall-clock execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Create a result from a histogram.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    /// Attach the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Counts {
        [("000".to_string(), 480), ("111".to_string(), 500), ("010".to_string(), 20)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_counts_basics() {
        let counts = sample();
        assert_eq!(counts.total_shots(), 1000);
        assert_eq!(counts.get("111"), 500);
        assert_eq!(counts.get("101"), 0);
        assert_eq!(counts.len(), 3);
        assert_eq!(counts.most_frequent(), Some((&"111".to_string(), &500)));
    }

    #[test]
    fn test_sorted_descending() {
        let counts = sample();
        let keys: Vec<_> = counts.sorted().into_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["111", "000", "010"]);
    }

    #[test]
    fn test_insert_accumulates() {
        let mut counts = Counts::new();
        counts.insert("01", 3);
        counts.insert("01", 2);
        assert_eq!(counts.get("01"), 5);
        assert!((counts.probability("01") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marginal() {
        let counts: Counts = [("010111".to_string(), 7), ("000111".to_string(), 3)]
            .into_iter()
            .collect();
        let out = counts.marginal(&[3, 4, 5]);
        assert_eq!(out.get("111"), 10);
        assert_eq!(out.len(), 1);

        let syndrome = counts.marginal(&[0, 1, 2]);
        assert_eq!(syndrome.get("010"), 7);
        assert_eq!(syndrome.get("000"), 3);
    }

    #[test]
    fn test_counts_serialize_as_map() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["000"], 480);
    }
}
