//! Rolling utilization history of a host.

use std::collections::VecDeque;

use crate::host::MonitoredHost;

/// Drops all entries equal to zero keeping the order of the remaining ones.
///
/// Zero readings mark slots where the host was not observed yet, so they are excluded from regression.
pub fn remove_zeros(samples: &[f64]) -> Vec<f64> {
    samples.iter().copied().filter(|&value| value != 0.).collect()
}

/// Stores the latest `length` utilization samples of CPU, memory and bandwidth.
///
/// Series are returned most-recent-first and padded with zeros to `length`.
#[derive(Clone, Debug)]
pub struct UtilizationHistory {
    length: usize,
    cpu: VecDeque<f64>,
    memory: VecDeque<f64>,
    bandwidth: VecDeque<f64>,
    last_time: Option<f64>,
}

impl UtilizationHistory {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            cpu: VecDeque::with_capacity(length),
            memory: VecDeque::with_capacity(length),
            bandwidth: VecDeque::with_capacity(length),
            last_time: None,
        }
    }

    /// Appends utilization sample observed at `time`, the oldest sample is dropped when the history is full.
    pub fn push(&mut self, time: f64, cpu: f64, memory: f64, bandwidth: f64) {
        for (series, value) in [
            (&mut self.cpu, cpu),
            (&mut self.memory, memory),
            (&mut self.bandwidth, bandwidth),
        ] {
            series.push_front(value);
            series.truncate(self.length);
        }
        self.last_time = Some(time);
    }

    pub fn cpu(&self) -> Vec<f64> {
        self.padded(&self.cpu)
    }

    pub fn memory(&self) -> Vec<f64> {
        self.padded(&self.memory)
    }

    pub fn bandwidth(&self) -> Vec<f64> {
        self.padded(&self.bandwidth)
    }

    /// Returns the latest (CPU, memory, bandwidth) sample.
    pub fn latest(&self) -> Option<(f64, f64, f64)> {
        Some((*self.cpu.front()?, *self.memory.front()?, *self.bandwidth.front()?))
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Number of stored samples (at most `capacity`).
    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.length
    }

    fn padded(&self, series: &VecDeque<f64>) -> Vec<f64> {
        let mut result: Vec<f64> = series.iter().copied().collect();
        result.resize(self.length, 0.);
        result
    }
}

/// Compacted history of the three resources in chronological order (the last element is the most recent).
///
/// Every series is compacted on its own, so the series may have different lengths. Predictors combining the
/// resources use [`CompactedHistory::aligned`], which keeps only the common most recent samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactedHistory {
    cpu: Vec<f64>,
    memory: Vec<f64>,
    bandwidth: Vec<f64>,
}

impl CompactedHistory {
    /// Builds compacted history from most-recent-first series as returned by the host.
    pub fn from_recent_first(cpu: &[f64], memory: &[f64], bandwidth: &[f64]) -> Self {
        let chronological = |series: &[f64]| remove_zeros(series).into_iter().rev().collect::<Vec<f64>>();
        Self {
            cpu: chronological(cpu),
            memory: chronological(memory),
            bandwidth: chronological(bandwidth),
        }
    }

    /// Builds compacted history from chronological series.
    pub fn from_chronological(cpu: &[f64], memory: &[f64], bandwidth: &[f64]) -> Self {
        let reversed = |series: &[f64]| series.iter().rev().copied().collect::<Vec<f64>>();
        Self::from_recent_first(&reversed(cpu), &reversed(memory), &reversed(bandwidth))
    }

    pub fn from_host(host: &dyn MonitoredHost) -> Self {
        Self::from_recent_first(
            &host.cpu_utilization_history(),
            &host.memory_utilization_history(),
            &host.bandwidth_utilization_history(),
        )
    }

    pub fn cpu(&self) -> &[f64] {
        &self.cpu
    }

    pub fn memory(&self) -> &[f64] {
        &self.memory
    }

    pub fn bandwidth(&self) -> &[f64] {
        &self.bandwidth
    }

    /// Length of the shortest series.
    pub fn aligned_len(&self) -> usize {
        self.cpu.len().min(self.memory.len()).min(self.bandwidth.len())
    }

    /// Returns history with the oldest samples dropped so that all series have [`Self::aligned_len`] samples.
    pub fn aligned(&self) -> Self {
        let len = self.aligned_len();
        let tail = |series: &[f64]| series[series.len() - len..].to_vec();
        Self {
            cpu: tail(&self.cpu),
            memory: tail(&self.memory),
            bandwidth: tail(&self.bandwidth),
        }
    }
}

/// Predicted utilization recorded by an overload detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictionEntry {
    pub time: f64,
    pub predicted_utilization: f64,
}

/// Log of predictions made for a host, kept for inspection and plotting.
#[derive(Clone, Debug, Default)]
pub struct PredictionLog {
    entries: Vec<PredictionEntry>,
}

impl PredictionLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add(&mut self, time: f64, predicted_utilization: f64) {
        self.entries.push(PredictionEntry {
            time,
            predicted_utilization,
        });
    }

    pub fn entries(&self) -> &[PredictionEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&PredictionEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_zeros() {
        assert_eq!(remove_zeros(&[0., 1., 0., 2., 3.]), vec![1., 2., 3.]);
        assert_eq!(remove_zeros(&[0., 0.]), Vec::<f64>::new());
        let once = remove_zeros(&[0.5, 0., 0.25, 0., 0.75, 0.]);
        assert_eq!(remove_zeros(&once), once);
        assert_eq!(once, vec![0.5, 0.25, 0.75]);
    }

    #[test]
    fn test_history_is_padded_and_bounded() {
        let mut history = UtilizationHistory::new(4);
        assert!(history.is_empty());
        assert_eq!(history.cpu(), vec![0.; 4]);

        history.push(300., 0.1, 0.2, 0.3);
        history.push(600., 0.4, 0.5, 0.6);
        assert_eq!(history.cpu(), vec![0.4, 0.1, 0., 0.]);
        assert_eq!(history.memory(), vec![0.5, 0.2, 0., 0.]);
        assert_eq!(history.bandwidth(), vec![0.6, 0.3, 0., 0.]);
        assert_eq!(history.latest(), Some((0.4, 0.5, 0.6)));

        for i in 0..5 {
            history.push(900. + 300. * i as f64, 0.7, 0.7, 0.7);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.cpu(), vec![0.7; 4]);
        assert_eq!(history.last_time(), Some(2100.));
    }

    #[test]
    fn test_compacted_history_is_chronological() {
        let compacted =
            CompactedHistory::from_recent_first(&[0.3, 0.2, 0.1, 0.], &[0.6, 0.5, 0.4, 0.], &[0.9, 0.8, 0.7, 0.]);
        assert_eq!(compacted.aligned_len(), 3);
        assert_eq!(compacted.cpu(), &[0.1, 0.2, 0.3]);
        assert_eq!(compacted.memory(), &[0.4, 0.5, 0.6]);
        assert_eq!(compacted.bandwidth(), &[0.7, 0.8, 0.9]);
        assert_eq!(compacted.aligned(), compacted);
    }

    #[test]
    fn test_compacted_series_are_independent() {
        // memory was not observed at the oldest tick, bandwidth was never observed
        let compacted = CompactedHistory::from_recent_first(&[0.3, 0.2, 0.1], &[0.6, 0.5, 0.], &[0., 0., 0.]);
        assert_eq!(compacted.cpu(), &[0.1, 0.2, 0.3]);
        assert_eq!(compacted.memory(), &[0.5, 0.6]);
        assert!(compacted.bandwidth().is_empty());
        assert_eq!(compacted.aligned_len(), 0);
        assert!(compacted.aligned().cpu().is_empty());
    }

    #[test]
    fn test_aligned_history_keeps_most_recent_common_samples() {
        let compacted = CompactedHistory::from_recent_first(&[0.3, 0.2, 0.1], &[0.6, 0.5, 0.], &[0.9, 0.8, 0.7]);
        let aligned = compacted.aligned();
        assert_eq!(aligned.aligned_len(), 2);
        assert_eq!(aligned.cpu(), &[0.2, 0.3]);
        assert_eq!(aligned.memory(), &[0.5, 0.6]);
        assert_eq!(aligned.bandwidth(), &[0.8, 0.9]);

        let same = CompactedHistory::from_chronological(&[0.1, 0.2, 0.3], &[0., 0.5, 0.6], &[0.7, 0.8, 0.9]);
        assert_eq!(same, compacted);
    }
}
