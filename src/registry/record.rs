// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Device identity and per-device sensor state

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensors::{Sample, SensorBuffer, SensorMeta, SensorType};
use crate::status::{Status, StatusTable};

/// A (subject, source) pair: one wearable worn by one participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub subject_id: String,
    pub source_id: String,
}

impl DeviceIdentity {
    pub fn new(subject_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            source_id: source_id.into(),
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject_id, self.source_id)
    }
}

/// How a fetched batch is applied to a sensor buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Incremental update, deduplicated by timestamp
    Append,
    /// Authoritative full window
    Replace,
}

#[derive(Debug, Clone)]
struct SensorChannel {
    buffer: SensorBuffer,
    meta: SensorMeta,
}

/// Everything the monitor knows about one device
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    identity: DeviceIdentity,
    raw_source_id: String,
    channels: Vec<SensorChannel>,
}

impl DeviceRecord {
    /// Empty record with one buffer per recognized sensor.
    /// `raw_source_id` is the id the upstream API knows the device by.
    pub fn new(identity: DeviceIdentity, raw_source_id: impl Into<String>, max_len: Option<usize>) -> Self {
        let channels = SensorType::ALL
            .iter()
            .map(|sensor| SensorChannel {
                buffer: SensorBuffer::new(max_len),
                meta: SensorMeta::new(*sensor),
            })
            .collect();

        Self {
            identity,
            raw_source_id: raw_source_id.into(),
            channels,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn raw_source_id(&self) -> &str {
        &self.raw_source_id
    }

    /// Identity as the upstream API knows it
    pub fn upstream_identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.identity.subject_id.clone(), self.raw_source_id.clone())
    }

    pub fn buffer(&self, sensor: SensorType) -> &SensorBuffer {
        &self.channels[sensor.index()].buffer
    }

    pub fn meta(&self, sensor: SensorType) -> &SensorMeta {
        &self.channels[sensor.index()].meta
    }

    pub fn metas(&self) -> impl Iterator<Item = &SensorMeta> {
        self.channels.iter().map(|c| &c.meta)
    }

    pub fn status(&self, sensor: SensorType) -> Status {
        self.meta(sensor).status
    }

    /// Apply a batch to one sensor and recompute its metadata.
    /// Returns the number of samples stored.
    pub fn ingest(
        &mut self,
        sensor: SensorType,
        samples: Vec<Sample>,
        mode: IngestMode,
        now: DateTime<Utc>,
        table: &StatusTable,
    ) -> usize {
        let channel = &mut self.channels[sensor.index()];
        let stored = match mode {
            IngestMode::Append => channel.buffer.append_batch(samples),
            IngestMode::Replace => {
                channel.buffer.replace_all(samples);
                channel.buffer.len()
            }
        };
        channel.meta = SensorMeta::compute(sensor, &channel.buffer, now, table);
        stored
    }

    /// Recompute every sensor's metadata against `now`
    pub fn refresh(&mut self, now: DateTime<Utc>, table: &StatusTable) {
        for (sensor, channel) in SensorType::ALL.iter().zip(self.channels.iter_mut()) {
            channel.meta = SensorMeta::compute(*sensor, &channel.buffer, now, table);
        }
    }

    pub fn battery_level(&self) -> Option<f64> {
        self.meta(SensorType::Battery).battery_level()
    }

    /// Most recent sample timestamp across all sensors
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.metas().filter_map(|m| m.last_timestamp).max()
    }

    pub fn buffer_lengths(&self) -> Vec<usize> {
        self.channels.iter().map(|c| c.buffer.len()).collect()
    }
}

impl PartialEq for DeviceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for DeviceRecord {}

impl PartialEq<DeviceIdentity> for DeviceRecord {
    fn eq(&self, other: &DeviceIdentity) -> bool {
        &self.identity == other
    }
}
