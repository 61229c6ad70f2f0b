// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Derived per-sensor state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Sample, SensorBuffer, SensorType};
use crate::status::{Status, StatusTable};

/// Metadata recomputed from a [`SensorBuffer`] after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorMeta {
    pub sensor: SensorType,
    pub sample_count: usize,
    pub last_sample: Option<Sample>,
    pub last_timestamp: Option<DateTime<Utc>>,
    #[serde(with = "age_serde")]
    pub age: Option<Duration>,
    pub status: Status,
}

impl SensorMeta {
    pub fn new(sensor: SensorType) -> Self {
        Self {
            sensor,
            sample_count: 0,
            last_sample: None,
            last_timestamp: None,
            age: None,
            status: Status::NotAvailable,
        }
    }

    /// Derive the metadata of `buffer` as seen at `now`
    pub fn compute(
        sensor: SensorType,
        buffer: &SensorBuffer,
        now: DateTime<Utc>,
        table: &StatusTable,
    ) -> Self {
        let last_sample = buffer.last().cloned();
        let last_timestamp = last_sample.as_ref().map(|s| s.start);
        let age = last_timestamp.map(|ts| (now - ts).max(Duration::zero()));
        let battery_level = last_sample.as_ref().and_then(|s| s.payload.value());
        let status = table.classify(sensor, age, battery_level);

        Self {
            sensor,
            sample_count: buffer.len(),
            last_sample,
            last_timestamp,
            age,
            status,
        }
    }

    /// Charge level of the last battery sample
    pub fn battery_level(&self) -> Option<f64> {
        if self.sensor != SensorType::Battery {
            return None;
        }
        self.last_sample.as_ref().and_then(|s| s.payload.value())
    }
}

mod age_serde {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(age: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match age {
            Some(d) => s.serialize_some(&d.num_milliseconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.map(Duration::milliseconds))
    }
}
