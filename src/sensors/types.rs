// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor, source and sample types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Data channels a wearable can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Accelerometer,
    Battery,
    BloodVolumePulse,
    ElectrodermalActivity,
    InterBeatInterval,
    HeartRate,
    Thermometer,
}

impl SensorType {
    /// Every recognized sensor, in display order
    pub const ALL: [SensorType; 7] = [
        SensorType::Accelerometer,
        SensorType::Battery,
        SensorType::BloodVolumePulse,
        SensorType::ElectrodermalActivity,
        SensorType::InterBeatInterval,
        SensorType::HeartRate,
        SensorType::Thermometer,
    ];

    /// Position in [`SensorType::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Upstream wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Accelerometer => "ACCELEROMETER",
            SensorType::Battery => "BATTERY",
            SensorType::BloodVolumePulse => "BLOOD_VOLUME_PULSE",
            SensorType::ElectrodermalActivity => "ELECTRODERMAL_ACTIVITY",
            SensorType::InterBeatInterval => "INTER_BEAT_INTERVAL",
            SensorType::HeartRate => "HEART_RATE",
            SensorType::Thermometer => "THERMOMETER",
        }
    }

    /// Short column label for the status board
    pub fn abbrev(&self) -> &'static str {
        match self {
            SensorType::Accelerometer => "ACC",
            SensorType::Battery => "BAT",
            SensorType::BloodVolumePulse => "BVP",
            SensorType::ElectrodermalActivity => "EDA",
            SensorType::InterBeatInterval => "IBI",
            SensorType::HeartRate => "HR",
            SensorType::Thermometer => "TEMP",
        }
    }

    /// Whether samples of this sensor carry a 3-axis vector
    pub fn is_vector(&self) -> bool {
        matches!(self, SensorType::Accelerometer)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IngestError::UnknownSensor(s.to_string()))
    }
}

/// Kind of device behind a source id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Android,
    Empatica,
    Pebble,
    Biovotion,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Android => "ANDROID",
            SourceType::Empatica => "EMPATICA",
            SourceType::Pebble => "PEBBLE",
            SourceType::Biovotion => "BIOVOTION",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation statistic requested from the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stat {
    Average,
    Count,
    Maximum,
    Median,
    Minimum,
    Sum,
    InterquartileRange,
    LowerQuartile,
    UpperQuartile,
    Quartiles,
    ReceivedMessages,
}

impl Stat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Average => "AVERAGE",
            Stat::Count => "COUNT",
            Stat::Maximum => "MAXIMUM",
            Stat::Median => "MEDIAN",
            Stat::Minimum => "MINIMUM",
            Stat::Sum => "SUM",
            Stat::InterquartileRange => "INTERQUARTILE_RANGE",
            Stat::LowerQuartile => "LOWER_QUARTILE",
            Stat::UpperQuartile => "UPPER_QUARTILE",
            Stat::Quartiles => "QUARTILES",
            Stat::ReceivedMessages => "RECEIVED_MESSAGES",
        }
    }
}

/// Aggregation window requested from the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interval {
    TenSecond,
    ThirtySecond,
    OneMin,
    TenMin,
    OneHour,
    OneDay,
    OneWeek,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::TenSecond => "TEN_SECOND",
            Interval::ThirtySecond => "THIRTY_SECOND",
            Interval::OneMin => "ONE_MIN",
            Interval::TenMin => "TEN_MIN",
            Interval::OneHour => "ONE_HOUR",
            Interval::OneDay => "ONE_DAY",
            Interval::OneWeek => "ONE_WEEK",
        }
    }

    /// Window length in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Interval::TenSecond => 10,
            Interval::ThirtySecond => 30,
            Interval::OneMin => 60,
            Interval::TenMin => 600,
            Interval::OneHour => 3_600,
            Interval::OneDay => 86_400,
            Interval::OneWeek => 604_800,
        }
    }
}

/// Sample value: a scalar for most sensors, a vector for the accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Vector { x: f64, y: f64, z: f64 },
    Scalar { value: f64 },
}

impl Payload {
    /// Scalar value, if this payload carries one
    pub fn value(&self) -> Option<f64> {
        match self {
            Payload::Scalar { value } => Some(*value),
            Payload::Vector { .. } => None,
        }
    }
}

/// One timestamped sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub sensor: SensorType,
    pub payload: Payload,
}

impl Sample {
    pub fn new(start: DateTime<Utc>, sensor: SensorType, payload: Payload) -> Self {
        Self {
            start,
            end: None,
            sensor,
            payload,
        }
    }

    pub fn scalar(start: DateTime<Utc>, sensor: SensorType, value: f64) -> Self {
        Self::new(start, sensor, Payload::Scalar { value })
    }
}
