// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Per-device status roll-up and read views for the renderer

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{DeviceIdentity, DeviceRecord};
use crate::sensors::{SensorMeta, SensorType};
use crate::status::{Status, StatusTable};

/// Point-in-time copy of one device for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub identity: DeviceIdentity,
    pub raw_source_id: String,
    pub priority_status: Status,
    pub battery_level: Option<f64>,
    pub latest_timestamp: Option<DateTime<Utc>>,
    pub sensors: Vec<SensorMeta>,
}

impl DeviceSnapshot {
    pub fn meta(&self, sensor: SensorType) -> Option<&SensorMeta> {
        self.sensors.iter().find(|m| m.sensor == sensor)
    }

    /// Age of the freshest sample across all sensors
    pub fn latest_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.latest_timestamp
            .map(|ts| (now - ts).max(Duration::zero()))
    }
}

/// Rolls sensor statuses up into one priority status per device
#[derive(Debug, Clone)]
pub struct Aggregator {
    sensors: Vec<SensorType>,
    table: StatusTable,
}

impl Aggregator {
    /// `sensors` is the subset considered for the roll-up
    pub fn new(sensors: Vec<SensorType>, table: StatusTable) -> Self {
        Self { sensors, table }
    }

    /// Worst status across the selected sensors.
    ///
    /// DISCONNECTED wins outright even though its priority value is the
    /// lowest of the real statuses. No selected sensors yields N/A.
    pub fn priority_status(&self, record: &DeviceRecord) -> Status {
        let statuses: Vec<Status> = self.sensors.iter().map(|s| record.status(*s)).collect();

        if statuses.contains(&Status::Disconnected) {
            return Status::Disconnected;
        }

        statuses
            .into_iter()
            .max_by_key(|s| self.table.priority(*s))
            .unwrap_or(Status::NotAvailable)
    }

    /// Whether a device should appear in the default (filtered) view
    pub fn is_active(&self, record: &DeviceRecord) -> bool {
        self.table.priority(self.priority_status(record)) > self.table.active_floor()
    }

    /// All records, or only active ones when `show_all` is false
    pub fn filtered_view<'a>(&self, records: &'a [DeviceRecord], show_all: bool) -> Vec<&'a DeviceRecord> {
        records
            .iter()
            .filter(|r| show_all || self.is_active(r))
            .collect()
    }

    pub fn snapshot(&self, record: &DeviceRecord) -> DeviceSnapshot {
        DeviceSnapshot {
            identity: record.identity().clone(),
            raw_source_id: record.raw_source_id().to_string(),
            priority_status: self.priority_status(record),
            battery_level: record.battery_level(),
            latest_timestamp: record.latest_timestamp(),
            sensors: record.metas().cloned().collect(),
        }
    }
}
