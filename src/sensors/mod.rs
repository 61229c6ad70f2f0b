// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor module - sample types, history buffers and derived metadata

mod buffer;
mod meta;
mod types;

pub use buffer::SensorBuffer;
pub use meta::SensorMeta;
pub use types::{Interval, Payload, Sample, SensorType, SourceType, Stat};
