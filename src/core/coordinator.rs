// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Polling coordinator - discovery and sample fetching loops

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::StopSignal;
use crate::api::{ApiClient, Dataset, SampleQuery};
use crate::config::{ApiConfig, Config, MonitorConfig};
use crate::error::{ApiError, FetchError, IngestError};
use crate::registry::{DeviceIdentity, IngestMode, Registry};
use crate::sensors::SensorType;

/// Phase a polling loop is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Discovering,
    Fetching,
    Stopped,
}

/// The two concurrent polling loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollLoop {
    /// Refreshes the subject and source directory only
    Directory,
    /// Refreshes the directory, then fetches the latest samples
    Samples,
}

impl fmt::Display for PollLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollLoop::Directory => write!(f, "directory"),
            PollLoop::Samples => write!(f, "samples"),
        }
    }
}

/// Drives the upstream API and feeds the registry.
///
/// Network calls are made without holding the registry lock; the lock is
/// only taken to discover devices or apply a batch.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<Mutex<Registry>>,
    client: Arc<dyn ApiClient>,
    api: ApiConfig,
    monitor: MonitorConfig,
    stop: StopSignal,
}

impl Coordinator {
    pub fn new(
        registry: Arc<Mutex<Registry>>,
        client: Arc<dyn ApiClient>,
        config: &Config,
        stop: StopSignal,
    ) -> Self {
        Self {
            registry,
            client,
            api: config.api.clone(),
            monitor: config.monitor.clone(),
            stop,
        }
    }

    /// Refresh the device directory. Returns how many devices are new.
    pub async fn discover_once(&self) -> Result<usize, ApiError> {
        let subjects = self.client.list_subjects(&self.api.study_id).await?;
        let wanted = self.api.source_type.as_str();

        let mut found = Vec::new();
        for subject in subjects {
            if self.stop.is_stopped() {
                break;
            }
            match self.client.list_sources(&subject).await {
                Ok(sources) => found.extend(
                    sources
                        .into_iter()
                        .filter(|s| s.source_type.eq_ignore_ascii_case(wanted))
                        .map(|s| DeviceIdentity::new(subject.clone(), s.id)),
                ),
                Err(e) => warn!("Listing sources of {} failed: {}", subject, e),
            }
        }

        let added = self.registry.lock().discover(found);
        Ok(added)
    }

    /// One latest-sample request per (device, polled sensor), spaced by
    /// `api_interval`. Returns how many batches were applied.
    pub async fn fetch_once(&self) -> usize {
        let targets = self.registry.lock().upstream_identities();
        let mut applied = 0;
        let mut first = true;

        for identity in &targets {
            for &sensor in &self.monitor.poll_sensors {
                if !first && !self.stop.sleep(self.monitor.api_interval()).await {
                    return applied;
                }
                first = false;
                if self.stop.is_stopped() {
                    return applied;
                }

                let query = SampleQuery::new(sensor, self.api.stat, self.api.interval, identity);
                match self.client.fetch_last_sample(&query).await {
                    Ok(Some(dataset)) => {
                        if self.apply(dataset, IngestMode::Append).is_ok() {
                            applied += 1;
                        }
                    }
                    Ok(None) => debug!("No {} data for {}", sensor, identity),
                    Err(e) => warn!("Fetching {} for {} failed: {}", sensor, identity, e),
                }
            }
        }
        applied
    }

    /// Fetch the full window for one device and sensor and make it the
    /// buffer's content. `identity` is the upstream (un-aliased) identity.
    pub async fn backfill(&self, identity: &DeviceIdentity, sensor: SensorType) -> Result<usize, FetchError> {
        let query = SampleQuery::new(sensor, self.api.stat, self.api.interval, identity);
        match self.client.fetch_samples(&query).await? {
            Some(dataset) => Ok(self.apply(dataset, IngestMode::Replace)?),
            None => {
                info!("No {} history available for {}", sensor, identity);
                Ok(0)
            }
        }
    }

    fn apply(&self, dataset: Dataset, mode: IngestMode) -> Result<usize, IngestError> {
        let batch = dataset.into_batch().map_err(|e| {
            warn!("Ignoring response: {}", e);
            e
        })?;
        self.registry
            .lock()
            .ingest(&batch.identity, batch.sensor, batch.samples, mode, Utc::now())
    }

    /// Run one polling loop until the stop signal fires
    pub async fn run(self, kind: PollLoop, state: Arc<watch::Sender<PollState>>) {
        info!("Starting {} loop...", kind);

        while !self.stop.is_stopped() {
            let started = Instant::now();

            state.send_replace(PollState::Discovering);
            match self.discover_once().await {
                Ok(0) => {}
                Ok(added) => info!("{} new devices", added),
                Err(e) => warn!("Directory refresh failed: {}", e),
            }

            if kind == PollLoop::Samples && !self.stop.is_stopped() {
                let stats = self.registry.lock().buffer_stats();
                if let Some(stats) = stats {
                    info!(
                        "Buffer lengths: min {} / avg {:.1} / max {}",
                        stats.min, stats.avg, stats.max
                    );
                }

                state.send_replace(PollState::Fetching);
                let applied = self.fetch_once().await;
                debug!("Applied {} batches in {:?}", applied, started.elapsed());
            }

            state.send_replace(PollState::Idle);
            if !self.stop.sleep(self.monitor.api_refresh()).await {
                break;
            }
        }

        state.send_replace(PollState::Stopped);
        info!("{} loop stopped", kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SourceInfo;
    use crate::registry::AliasTable;
    use crate::sensors::Sample;
    use crate::status::{Status, StatusTable};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted upstream: two subjects, one Empatica each plus a phone
    #[derive(Default)]
    struct MockClient {
        fail_subjects: bool,
        fail_samples: bool,
        malformed: bool,
        sample_calls: AtomicUsize,
    }

    #[async_trait]
    impl ApiClient for MockClient {
        async fn list_subjects(&self, _study_id: &str) -> Result<Vec<String>, ApiError> {
            if self.fail_subjects {
                return Err(ApiError::Unavailable("subjects down".into()));
            }
            Ok(vec!["s1".into(), "s2".into()])
        }

        async fn list_sources(&self, subject_id: &str) -> Result<Vec<SourceInfo>, ApiError> {
            Ok(vec![
                SourceInfo {
                    id: format!("{}-e4", subject_id),
                    source_type: "EMPATICA".into(),
                },
                SourceInfo {
                    id: format!("{}-phone", subject_id),
                    source_type: "ANDROID".into(),
                },
            ])
        }

        async fn fetch_last_sample(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
            self.sample_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_samples {
                return Err(ApiError::Unavailable("samples down".into()));
            }
            if self.malformed {
                return Ok(Some(Dataset::default()));
            }
            let identity = DeviceIdentity::new(query.subject_id.clone(), query.source_id.clone());
            let sample = Sample::scalar(Utc::now(), query.sensor, 0.8);
            Ok(Some(Dataset::from_samples(&identity, query.sensor, &[sample])))
        }

        async fn fetch_samples(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
            let identity = DeviceIdentity::new(query.subject_id.clone(), query.source_id.clone());
            let now = Utc::now();
            let samples: Vec<Sample> = (0..5)
                .map(|i| Sample::scalar(now - chrono::Duration::seconds(10 * (5 - i)), query.sensor, 0.5))
                .collect();
            Ok(Some(Dataset::from_samples(&identity, query.sensor, &samples)))
        }
    }

    fn setup(client: MockClient) -> (Coordinator, Arc<Mutex<Registry>>, Arc<MockClient>) {
        let mut config = Config::default();
        config.monitor.api_refresh_ms = 20;
        config.monitor.api_interval_ms = 1;
        config.monitor.poll_sensors = vec![SensorType::Battery, SensorType::HeartRate];

        let registry = Arc::new(Mutex::new(Registry::new(
            StatusTable::default(),
            AliasTable::new(),
            Some(100),
        )));
        let client = Arc::new(client);
        let coordinator = Coordinator::new(registry.clone(), client.clone(), &config, StopSignal::new());
        (coordinator, registry, client)
    }

    #[tokio::test]
    async fn test_discovery_keeps_configured_source_type() {
        let (coordinator, registry, _) = setup(MockClient::default());
        assert_eq!(coordinator.discover_once().await.unwrap(), 2);
        assert_eq!(coordinator.discover_once().await.unwrap(), 0);

        let registry = registry.lock();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&DeviceIdentity::new("s1", "s1-e4")));
        assert!(!registry.contains(&DeviceIdentity::new("s1", "s1-phone")));
    }

    #[tokio::test]
    async fn test_fetch_once_ingests_every_polled_sensor() {
        let (coordinator, registry, client) = setup(MockClient::default());
        coordinator.discover_once().await.unwrap();

        assert_eq!(coordinator.fetch_once().await, 4);
        assert_eq!(client.sample_calls.load(Ordering::SeqCst), 4);

        let registry = registry.lock();
        let record = registry.find(&DeviceIdentity::new("s2", "s2-e4")).unwrap();
        assert_eq!(record.status(SensorType::Battery), Status::Good);
        assert_eq!(record.status(SensorType::HeartRate), Status::Good);
        assert_eq!(record.status(SensorType::Accelerometer), Status::NotAvailable);
    }

    #[tokio::test]
    async fn test_malformed_responses_are_ignored() {
        let (coordinator, registry, client) = setup(MockClient {
            malformed: true,
            ..Default::default()
        });
        coordinator.discover_once().await.unwrap();

        assert_eq!(coordinator.fetch_once().await, 0);
        assert_eq!(client.sample_calls.load(Ordering::SeqCst), 4);
        let registry = registry.lock();
        assert!(registry
            .records()
            .iter()
            .all(|r| r.status(SensorType::Battery) == Status::NotAvailable));
    }

    #[tokio::test]
    async fn test_backfill_replaces_buffer() {
        let (coordinator, registry, _) = setup(MockClient::default());
        coordinator.discover_once().await.unwrap();
        coordinator.fetch_once().await;

        let id = DeviceIdentity::new("s1", "s1-e4");
        assert_eq!(coordinator.backfill(&id, SensorType::Battery).await.unwrap(), 5);
        assert_eq!(
            registry.lock().find(&id).unwrap().buffer(SensorType::Battery).len(),
            5
        );

        let ghost = DeviceIdentity::new("s9", "nope");
        assert!(matches!(
            coordinator.backfill(&ghost, SensorType::Battery).await,
            Err(FetchError::Ingest(IngestError::UnknownIdentity { .. }))
        ));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let (coordinator, _, client) = setup(MockClient {
            fail_samples: true,
            ..Default::default()
        });
        let stop = coordinator.stop.clone();
        let (tx, mut rx) = watch::channel(PollState::Idle);
        let handle = tokio::spawn(coordinator.run(PollLoop::Samples, Arc::new(tx)));

        // keeps polling across several failing cycles
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(client.sample_calls.load(Ordering::SeqCst) >= 8);
        assert!(!handle.is_finished());

        stop.stop();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), PollState::Stopped);
    }

    #[tokio::test]
    async fn test_directory_failure_keeps_running() {
        let (coordinator, registry, _) = setup(MockClient {
            fail_subjects: true,
            ..Default::default()
        });
        let stop = coordinator.stop.clone();
        let (tx, _rx) = watch::channel(PollState::Idle);
        let handle = tokio::spawn(coordinator.run(PollLoop::Directory, Arc::new(tx)));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());
        assert!(registry.lock().is_empty());

        stop.stop();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_prompt_during_long_sleep() {
        let (mut coordinator, _, _) = setup(MockClient::default());
        coordinator.monitor.api_refresh_ms = 60_000;
        let stop = coordinator.stop.clone();
        let (tx, _rx) = watch::channel(PollState::Idle);
        let handle = tokio::spawn(coordinator.run(PollLoop::Samples, Arc::new(tx)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        stop.stop();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
