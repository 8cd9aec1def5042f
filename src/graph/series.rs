//! # Sample Series
//!
//! A time-ordered sample series tagged with the retention policy that
//! bounds it. Two policies exist:
//!
//! - [`RetentionPolicy::TimeWindow`]: keep samples no older than the window,
//!   measured back from the newest inserted sample's timestamp.
//! - [`RetentionPolicy::Rolling`]: keep the most recent N samples.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One chart point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphSample {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub value: f64,
}

impl GraphSample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// How a series bounds its memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RetentionPolicy {
    /// Time-bounded: samples with `newest - timestamp > seconds * 1000` are evicted
    TimeWindow { seconds: u32 },
    /// Count-bounded: only the most recent `capacity` samples are kept
    Rolling { capacity: usize },
}

/// A sample series and its retention tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    policy: RetentionPolicy,
    samples: VecDeque<GraphSample>,
}

impl Series {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            samples: VecDeque::new(),
        }
    }

    pub fn time_window(seconds: u32) -> Self {
        Self::new(RetentionPolicy::TimeWindow { seconds })
    }

    pub fn rolling(capacity: usize) -> Self {
        Self::new(RetentionPolicy::Rolling { capacity: capacity.max(1) })
    }

    /// Append a sample, then evict according to the policy.
    ///
    /// For a time window the cutoff is anchored on this sample's timestamp,
    /// never on wall-clock time. Every retained sample satisfies
    /// `sample.timestamp - s.timestamp <= seconds * 1000`, even if samples
    /// arrived out of order.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of samples evicted
    pub fn push(&mut self, sample: GraphSample) -> usize {
        self.samples.push_back(sample);
        let before = self.samples.len();
        match self.policy {
            RetentionPolicy::TimeWindow { seconds } => {
                let cutoff = sample.timestamp.saturating_sub(i64::from(seconds) * 1000);
                self.samples.retain(|s| s.timestamp >= cutoff);
            }
            RetentionPolicy::Rolling { capacity } => {
                while self.samples.len() > capacity {
                    self.samples.pop_front();
                }
            }
        }
        before - self.samples.len()
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Samples in insertion order
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &GraphSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&GraphSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Copy of the samples
    pub fn to_vec(&self) -> Vec<GraphSample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timestamps(series: &Series) -> Vec<i64> {
        series.samples().map(|s| s.timestamp).collect()
    }

    #[test]
    fn test_window_scenario() {
        let mut series = Series::time_window(5);
        for t in [0, 1, 2, 6] {
            series.push(GraphSample::new(t * 1000, t as f64));
        }
        // cutoff is 6000 - 5000; the sample at exactly the cutoff stays
        assert_eq!(timestamps(&series), vec![1000, 2000, 6000]);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut series = Series::time_window(5);
        series.push(GraphSample::new(1000, 0.0));
        let evicted = series.push(GraphSample::new(6000, 0.0));
        assert_eq!(evicted, 0, "a sample exactly one window old is kept");
        series.push(GraphSample::new(6001, 0.0));
        assert_eq!(timestamps(&series), vec![6000, 6001]);
    }

    #[test]
    fn test_window_anchored_on_inserted_sample() {
        let mut series = Series::time_window(1);
        series.push(GraphSample::new(10_000, 1.0));
        // An older sample arriving late anchors the cutoff earlier; nothing newer is lost
        series.push(GraphSample::new(9_500, 2.0));
        assert_eq!(timestamps(&series), vec![10_000, 9_500]);
    }

    #[test]
    fn test_window_with_extreme_timestamp() {
        let mut series = Series::time_window(5);
        series.push(GraphSample::new(i64::MIN, 1.0));
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest(), Some(&GraphSample::new(i64::MIN, 1.0)));

        series.push(GraphSample::new(i64::MIN + 1, 2.0));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_rolling_evicts_by_count() {
        let mut series = Series::rolling(3);
        for t in 0..5 {
            series.push(GraphSample::new(t, t as f64));
        }
        assert_eq!(timestamps(&series), vec![2, 3, 4]);
        assert_eq!(series.latest().unwrap().value, 4.0);
        assert_eq!(series.policy(), RetentionPolicy::Rolling { capacity: 3 });
    }

    #[test]
    fn test_rolling_ignores_time() {
        let mut series = Series::rolling(10);
        series.push(GraphSample::new(0, 0.0));
        series.push(GraphSample::new(3_600_000, 1.0));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_policy_tag_serializes() {
        let json = serde_json::to_value(RetentionPolicy::TimeWindow { seconds: 30 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "timeWindow", "seconds": 30}));
    }

    proptest! {
        #[test]
        fn prop_every_sample_within_window(
            window in 1u32..20,
            stamps in proptest::collection::vec(0i64..100_000, 1..80)
        ) {
            let mut series = Series::time_window(window);
            for ts in stamps {
                series.push(GraphSample::new(ts, 0.0));
                for s in series.samples() {
                    prop_assert!(ts - s.timestamp <= i64::from(window) * 1000);
                }
                prop_assert_eq!(series.latest().map(|s| s.timestamp), Some(ts));
            }
        }

        #[test]
        fn prop_rolling_never_exceeds_capacity(cap in 1usize..50, n in 0usize..200) {
            let mut series = Series::rolling(cap);
            for i in 0..n {
                series.push(GraphSample::new(i as i64, 0.0));
            }
            prop_assert_eq!(series.len(), n.min(cap));
        }
    }
}
