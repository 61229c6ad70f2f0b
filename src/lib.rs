// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! radar-monitor - device status board for wearable sensor telemetry
//!
//! Polls a RADAR-CNS style aggregation API for the latest samples of every
//! wearable in a study, keeps a bounded history per device and sensor, and
//! classifies how healthy each device is from the age of its data and its
//! battery level.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Monitor                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌─────────────┐   ┌──────────────────┐  │
//! │  │ ApiClient │ → │ Coordinator │ → │ Registry (Mutex) │  │
//! │  └───────────┘   └─────────────┘   └──────────────────┘  │
//! │                                             ↓            │
//! │                  ┌─────────────┐   ┌──────────────────┐  │
//! │                  │ StatusBoard │ ← │    Aggregator    │  │
//! │                  └─────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod registry;
pub mod sensors;
pub mod status;
pub mod ui;

// Re-exports for convenience
pub use aggregate::{Aggregator, DeviceSnapshot};
pub use api::{ApiClient, RestClient, SimulatedClient};
pub use config::Config;
pub use core::{Monitor, PollLoop, PollState, StopSignal};
pub use registry::{DeviceIdentity, Registry};
pub use sensors::{Sample, SensorType};
pub use status::{Status, StatusTable};

/// radar-monitor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
