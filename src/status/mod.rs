// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Status classification
//!
//! A sensor's health is derived from how long ago it last reported, or for
//! the battery channel from its charge level. Thresholds, priorities and
//! colors all live in a [`StatusTable`] so deployments can swap them without
//! touching [`StatusTable::classify`].

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::SensorType;

/// Discrete health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "DISCONNECTED")]
    Disconnected,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Good,
        Status::Ok,
        Status::Warning,
        Status::Critical,
        Status::Disconnected,
        Status::NotAvailable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Status::Good => "GOOD",
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Disconnected => "DISCONNECTED",
            Status::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration row for one status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDescriptor {
    pub status: Status,

    /// Higher is worse, except for DISCONNECTED and N/A which sit below GOOD
    pub priority: i32,

    /// Minimum age in minutes for a non-battery sensor to fall in this bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_minutes: Option<f64>,

    /// Charge level the battery must exceed to land in this bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,

    /// Display color, opaque to the core
    pub color: String,
}

impl StatusDescriptor {
    fn new(
        status: Status,
        priority: i32,
        age_minutes: Option<f64>,
        battery_level: Option<f64>,
        color: &str,
    ) -> Self {
        Self {
            status,
            priority,
            age_minutes,
            battery_level,
            color: color.to_string(),
        }
    }
}

/// Thresholds, priorities and colors for every [`Status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTable {
    pub levels: Vec<StatusDescriptor>,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::with_disconnect_after(10.0)
    }
}

impl StatusTable {
    /// Default table with a custom DISCONNECTED age threshold in minutes
    pub fn with_disconnect_after(minutes: f64) -> Self {
        Self {
            levels: vec![
                StatusDescriptor::new(Status::Good, 1, Some(0.0), Some(0.25), "lightgreen"),
                StatusDescriptor::new(Status::Ok, 2, Some(2.0), Some(0.10), "moccasin"),
                StatusDescriptor::new(Status::Warning, 3, Some(3.0), Some(0.05), "orange"),
                StatusDescriptor::new(Status::Critical, 4, Some(5.0), Some(0.0), "red"),
                StatusDescriptor::new(Status::Disconnected, 0, Some(minutes), None, "transparent"),
                StatusDescriptor::new(Status::NotAvailable, -1, None, None, "lightgrey"),
            ],
        }
    }

    /// Check the table is usable and unambiguous.
    ///
    /// Only N/A is mandatory. A status without a row is never produced and
    /// falls back to the neutral priority and color.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for level in &self.levels {
            if !seen.insert(level.status) {
                return Err(ConfigError::StatusTable(format!(
                    "{} is listed more than once",
                    level.status
                )));
            }
            for (name, value) in [("age_minutes", level.age_minutes), ("battery_level", level.battery_level)] {
                if let Some(v) = value {
                    if !v.is_finite() || v < 0.0 {
                        return Err(ConfigError::StatusTable(format!(
                            "{} of {} must be a non-negative number, got {}",
                            name, level.status, v
                        )));
                    }
                }
            }
        }

        if !seen.contains(&Status::NotAvailable) {
            return Err(ConfigError::StatusTable("N/A is missing".into()));
        }
        if self.levels.iter().all(|l| l.age_minutes.is_none()) {
            return Err(ConfigError::StatusTable("no age thresholds defined".into()));
        }
        if self.levels.iter().all(|l| l.battery_level.is_none()) {
            return Err(ConfigError::StatusTable("no battery thresholds defined".into()));
        }
        if self.descriptor(Status::NotAvailable).age_minutes.is_some()
            || self.descriptor(Status::NotAvailable).battery_level.is_some()
        {
            return Err(ConfigError::StatusTable("N/A cannot carry thresholds".into()));
        }

        Self::check_distinct(self.levels.iter().filter_map(|l| l.age_minutes), "age_minutes")?;
        Self::check_distinct(self.levels.iter().filter_map(|l| l.battery_level), "battery_level")?;
        Ok(())
    }

    fn check_distinct(values: impl Iterator<Item = f64>, name: &str) -> Result<(), ConfigError> {
        let mut values: Vec<f64> = values.collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        if values.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::StatusTable(format!("duplicate {} threshold", name)));
        }
        Ok(())
    }

    /// Descriptor for a status. Falls back to a neutral row for statuses the
    /// table omits.
    pub fn descriptor(&self, status: Status) -> StatusDescriptor {
        self.levels
            .iter()
            .find(|l| l.status == status)
            .cloned()
            .unwrap_or_else(|| StatusDescriptor::new(status, -1, None, None, "lightgrey"))
    }

    pub fn priority(&self, status: Status) -> i32 {
        self.levels
            .iter()
            .find(|l| l.status == status)
            .map(|l| l.priority)
            .unwrap_or(-1)
    }

    pub fn color(&self, status: Status) -> &str {
        self.levels
            .iter()
            .find(|l| l.status == status)
            .map(|l| l.color.as_str())
            .unwrap_or("lightgrey")
    }

    /// Status to color mapping, in table order
    pub fn colors(&self) -> Vec<(Status, String)> {
        self.levels.iter().map(|l| (l.status, l.color.clone())).collect()
    }

    /// Priority a status must exceed to count as active on the board
    pub fn active_floor(&self) -> i32 {
        self.priority(Status::Disconnected).max(self.priority(Status::NotAvailable))
    }

    /// Classify one sensor.
    ///
    /// `age` is `None` when the sensor never reported. Negative ages are
    /// treated as zero. For the battery channel only `battery_level` matters.
    pub fn classify(
        &self,
        sensor: SensorType,
        age: Option<Duration>,
        battery_level: Option<f64>,
    ) -> Status {
        let Some(age) = age else {
            return Status::NotAvailable;
        };

        if sensor == SensorType::Battery {
            return match battery_level {
                Some(level) if level.is_finite() => self.classify_battery(level),
                _ => Status::NotAvailable,
            };
        }

        let age = age.max(Duration::zero());
        self.classify_age(age)
    }

    fn classify_age(&self, age: Duration) -> Status {
        let minutes = age.num_milliseconds() as f64 / 60_000.0;
        let mut thresholds: Vec<(f64, Status)> = self
            .levels
            .iter()
            .filter_map(|l| l.age_minutes.map(|t| (t, l.status)))
            .collect();
        thresholds.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        // highest satisfied threshold wins
        thresholds
            .iter()
            .filter(|(t, _)| minutes >= *t)
            .last()
            .map(|(_, s)| *s)
            .unwrap_or(Status::NotAvailable)
    }

    fn classify_battery(&self, level: f64) -> Status {
        let mut thresholds: Vec<(f64, Status)> = self
            .levels
            .iter()
            .filter_map(|l| l.battery_level.map(|t| (t, l.status)))
            .collect();
        thresholds.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let satisfied = thresholds.iter().filter(|(t, _)| level > *t).last();
        match satisfied {
            Some((_, status)) => *status,
            // empty or at zero: the lowest bucket
            None => thresholds
                .first()
                .map(|(_, s)| *s)
                .unwrap_or(Status::NotAvailable),
        }
    }
}
