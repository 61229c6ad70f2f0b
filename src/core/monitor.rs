// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Monitor - owns the registry and everything that touches it

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::{Coordinator, PollLoop, PollState, StopSignal};
use crate::aggregate::{Aggregator, DeviceSnapshot};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{ConfigError, FetchError, IngestError};
use crate::registry::{BufferStats, DeviceIdentity, Registry};
use crate::sensors::{Sample, SensorType};
use crate::status::Status;

/// Main monitor context
pub struct Monitor {
    config: Arc<Config>,
    registry: Arc<Mutex<Registry>>,
    aggregator: Aggregator,
    coordinator: Coordinator,
    stop: StopSignal,
    directory_state: Arc<watch::Sender<PollState>>,
    samples_state: Arc<watch::Sender<PollState>>,
}

impl Monitor {
    /// Validate the configuration, load the alias table and build an idle
    /// monitor. Nothing is polled until [`start`](Self::start).
    pub fn new(config: Config, client: Arc<dyn ApiClient>) -> Result<Self, ConfigError> {
        config.validate()?;
        let aliases = config.load_aliases()?;

        let config = Arc::new(config);
        let registry = Arc::new(Mutex::new(Registry::new(
            config.status.clone(),
            aliases,
            config.monitor.max_samples(),
        )));
        let aggregator = Aggregator::new(config.monitor.aggregate_sensors.clone(), config.status.clone());
        let stop = StopSignal::new();
        let coordinator = Coordinator::new(registry.clone(), client, &config, stop.clone());

        Ok(Self {
            config,
            registry,
            aggregator,
            coordinator,
            stop,
            directory_state: Arc::new(watch::channel(PollState::Idle).0),
            samples_state: Arc::new(watch::channel(PollState::Idle).0),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Spawn the directory and samples loops
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        info!("Starting monitor for study {}...", self.config.api.study_id);
        vec![
            tokio::spawn(
                self.coordinator
                    .clone()
                    .run(PollLoop::Directory, self.directory_state.clone()),
            ),
            tokio::spawn(
                self.coordinator
                    .clone()
                    .run(PollLoop::Samples, self.samples_state.clone()),
            ),
        ]
    }

    /// Ask every loop to wind down. In-flight requests finish first.
    pub fn stop(&self) {
        info!("Stopping monitor...");
        self.stop.stop();
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn poll_state(&self, kind: PollLoop) -> PollState {
        *self.state_sender(kind).borrow()
    }

    /// Follow a loop's state transitions
    pub fn subscribe(&self, kind: PollLoop) -> watch::Receiver<PollState> {
        self.state_sender(kind).subscribe()
    }

    fn state_sender(&self, kind: PollLoop) -> &watch::Sender<PollState> {
        match kind {
            PollLoop::Directory => &self.directory_state,
            PollLoop::Samples => &self.samples_state,
        }
    }

    /// Snapshot of the board, statuses aged to the current time
    pub fn devices(&self, show_all: bool) -> Vec<DeviceSnapshot> {
        self.devices_at(Utc::now(), show_all)
    }

    pub fn devices_at(&self, now: DateTime<Utc>, show_all: bool) -> Vec<DeviceSnapshot> {
        let mut registry = self.registry.lock();
        registry.refresh(now);
        self.aggregator
            .filtered_view(registry.records(), show_all)
            .into_iter()
            .map(|r| self.aggregator.snapshot(r))
            .collect()
    }

    /// Buffered samples of one sensor, oldest first. Empty for unknown devices.
    pub fn sensor_history(&self, identity: &DeviceIdentity, sensor: SensorType) -> Vec<Sample> {
        self.registry
            .lock()
            .find(identity)
            .map(|r| r.buffer(sensor).snapshot().to_vec())
            .unwrap_or_default()
    }

    pub fn priority_status(&self, identity: &DeviceIdentity) -> Status {
        let mut registry = self.registry.lock();
        registry.refresh(Utc::now());
        registry
            .find(identity)
            .map(|r| self.aggregator.priority_status(r))
            .unwrap_or(Status::NotAvailable)
    }

    pub fn status_colors(&self) -> Vec<(Status, String)> {
        self.config.status.colors()
    }

    pub fn buffer_stats(&self) -> Option<BufferStats> {
        self.registry.lock().buffer_stats()
    }

    pub fn device_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Replace one sensor's buffer with the full upstream window
    pub async fn backfill(&self, identity: &DeviceIdentity, sensor: SensorType) -> Result<usize, FetchError> {
        let upstream = self
            .registry
            .lock()
            .find(identity)
            .map(|r| r.upstream_identity())
            .ok_or_else(|| IngestError::UnknownIdentity {
                subject_id: identity.subject_id.clone(),
                source_id: identity.source_id.clone(),
            })?;

        let stored = self.coordinator.backfill(&upstream, sensor).await?;
        info!("Backfilled {} {} samples for {}", stored, sensor, identity);
        Ok(stored)
    }
}
