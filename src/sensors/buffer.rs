// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Bounded per-sensor sample history

use std::collections::VecDeque;
use std::sync::Arc;

use super::Sample;

/// Ring buffer of samples in arrival order.
///
/// Appends are deduplicated by `start` timestamp; full replacement is not.
/// When `max_len` is set the oldest sample is evicted on overflow.
#[derive(Debug, Clone, Default)]
pub struct SensorBuffer {
    samples: VecDeque<Sample>,
    max_len: Option<usize>,
}

impl SensorBuffer {
    pub fn new(max_len: Option<usize>) -> Self {
        let capacity = max_len.unwrap_or(0).min(4096);
        Self {
            samples: VecDeque::with_capacity(capacity),
            max_len,
        }
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample unless one with the same start time is retained.
    /// Returns whether the sample was stored.
    pub fn append(&mut self, sample: Sample) -> bool {
        if self.samples.iter().any(|s| s.start == sample.start) {
            return false;
        }
        self.push(sample);
        true
    }

    /// Append each sample in order, returning how many were stored
    pub fn append_batch<I>(&mut self, samples: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        samples
            .into_iter()
            .fold(0, |stored, s| stored + self.append(s) as usize)
    }

    /// Replace the whole history with an authoritative window
    pub fn replace_all<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Sample>,
    {
        self.samples.clear();
        for sample in samples {
            self.push(sample);
        }
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Point-in-time copy for reading without holding the registry lock
    pub fn snapshot(&self) -> Arc<[Sample]> {
        self.samples.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    fn push(&mut self, sample: Sample) {
        if let Some(max) = self.max_len {
            if max == 0 {
                return;
            }
            while self.samples.len() >= max {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorType;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(n * 10)
    }

    fn sample(n: i64) -> Sample {
        Sample::scalar(t(n), SensorType::HeartRate, 60.0 + n as f64)
    }

    fn starts(buffer: &SensorBuffer) -> Vec<DateTime<Utc>> {
        buffer.iter().map(|s| s.start).collect()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut buffer = SensorBuffer::new(Some(3));
        for n in 1..=4 {
            buffer.append(sample(n));
        }
        assert_eq!(starts(&buffer), vec![t(2), t(3), t(4)]);
    }

    #[test]
    fn test_duplicate_append_is_ignored() {
        let mut buffer = SensorBuffer::new(Some(10));
        assert!(buffer.append(sample(1)));

        let mut dup = sample(1);
        dup.payload = crate::sensors::Payload::Scalar { value: 999.0 };
        assert!(!buffer.append(dup));

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last().unwrap().payload.value(), Some(61.0));
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut buffer = SensorBuffer::new(None);
        let stored = buffer.append_batch(vec![sample(3), sample(1), sample(3), sample(2)]);
        assert_eq!(stored, 3);
        assert_eq!(starts(&buffer), vec![t(3), t(1), t(2)]);
        assert_eq!(buffer.last().unwrap().start, t(2));
    }

    #[test]
    fn test_overflow_keeps_most_recent_distinct() {
        let mut buffer = SensorBuffer::new(Some(5));
        for n in 0..50 {
            buffer.append(sample(n));
            // re-delivery of the previous sample
            buffer.append(sample((n - 1).max(0)));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(starts(&buffer), vec![t(45), t(46), t(47), t(48), t(49)]);
    }

    #[test]
    fn test_replace_all_bypasses_dedup() {
        let mut buffer = SensorBuffer::new(Some(10));
        buffer.append_batch((0..5).map(sample));

        let window = vec![sample(7), sample(7), sample(8)];
        buffer.replace_all(window.clone());
        assert_eq!(buffer.snapshot().to_vec(), window);
    }

    #[test]
    fn test_replace_all_respects_bound() {
        let mut buffer = SensorBuffer::new(Some(2));
        buffer.replace_all((0..5).map(sample));
        assert_eq!(starts(&buffer), vec![t(3), t(4)]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut buffer = SensorBuffer::new(None);
        buffer.append(sample(1));
        let snap = buffer.snapshot();
        buffer.append(sample(2));
        assert_eq!(snap.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = SensorBuffer::new(Some(3));
        assert!(buffer.is_empty());
        assert!(buffer.last().is_none());
        assert!(buffer.snapshot().is_empty());
    }
}
