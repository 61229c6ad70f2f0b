// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated upstream for demo mode and tests

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use parking_lot::Mutex;
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{ApiClient, Dataset, SampleQuery, SourceInfo};
use crate::error::ApiError;
use crate::registry::DeviceIdentity;
use crate::sensors::{Payload, Sample, SensorType, SourceType};

/// How a simulated device behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceProfile {
    /// Reports fresh data
    Healthy,
    /// Data arrives this many minutes late
    Lagging(i64),
    /// Never reports anything
    Silent,
    /// Requests fail with this probability
    Flaky(f64),
}

struct DeviceState {
    profile: DeviceProfile,
    battery: f64,
}

struct SimState {
    rng: StdRng,
    devices: HashMap<DeviceIdentity, DeviceState>,
}

/// In-process stand-in for the aggregation API
pub struct SimulatedClient {
    study_id: String,
    subjects: Vec<(String, Vec<SourceInfo>)>,
    state: Mutex<SimState>,
}

impl SimulatedClient {
    /// `subjects` participants with one Empatica each, cycling through profiles
    pub fn new(study_id: &str, subjects: usize) -> Self {
        Self::with_rng(study_id, subjects, StdRng::from_entropy())
    }

    pub fn with_seed(study_id: &str, subjects: usize, seed: u64) -> Self {
        Self::with_rng(study_id, subjects, StdRng::seed_from_u64(seed))
    }

    fn with_rng(study_id: &str, subjects: usize, mut rng: StdRng) -> Self {
        let profiles = [
            DeviceProfile::Healthy,
            DeviceProfile::Healthy,
            DeviceProfile::Lagging(4),
            DeviceProfile::Flaky(0.3),
            DeviceProfile::Lagging(7),
            DeviceProfile::Silent,
            DeviceProfile::Lagging(25),
        ];

        let mut devices = HashMap::new();
        let mut listing = Vec::new();
        for n in 0..subjects {
            let subject = format!("SUB{:03}", n + 1);
            let mac = format!("00:07:80:1F:{:02X}:{:02X}", (n >> 8) & 0xff, n & 0xff);
            let phone = format!("{}-phone", subject);

            devices.insert(
                DeviceIdentity::new(subject.clone(), mac.clone()),
                DeviceState {
                    profile: profiles[n % profiles.len()],
                    battery: rng.gen_range(0.02..1.0),
                },
            );
            listing.push((
                subject,
                vec![
                    SourceInfo {
                        id: mac,
                        source_type: SourceType::Empatica.as_str().to_string(),
                    },
                    SourceInfo {
                        id: phone,
                        source_type: SourceType::Android.as_str().to_string(),
                    },
                ],
            ));
        }

        Self {
            study_id: study_id.to_string(),
            subjects: listing,
            state: Mutex::new(SimState { rng, devices }),
        }
    }

    /// Override the behaviour of one device
    pub fn set_profile(&self, identity: &DeviceIdentity, profile: DeviceProfile) {
        if let Some(device) = self.state.lock().devices.get_mut(identity) {
            device.profile = profile;
        }
    }

    fn sample_at(rng: &mut StdRng, sensor: SensorType, start: DateTime<Utc>, battery: f64) -> Sample {
        let mut noise = || rng.sample::<f64, _>(StandardNormal) * 0.02;
        let payload = match sensor {
            SensorType::Accelerometer => Payload::Vector {
                x: noise(),
                y: noise(),
                z: 1.0 + noise(),
            },
            SensorType::Battery => Payload::Scalar { value: battery },
            SensorType::BloodVolumePulse => Payload::Scalar {
                value: 40.0 * (1.0 + noise()),
            },
            SensorType::ElectrodermalActivity => Payload::Scalar {
                value: (0.4 + noise()).max(0.0),
            },
            SensorType::InterBeatInterval => Payload::Scalar {
                value: 0.8 + noise(),
            },
            SensorType::HeartRate => Payload::Scalar {
                value: 72.0 + 100.0 * noise(),
            },
            SensorType::Thermometer => Payload::Scalar {
                value: 32.5 + 10.0 * noise(),
            },
        };

        Sample {
            start,
            end: Some(start + Duration::seconds(10)),
            sensor,
            payload,
        }
    }

    /// Generate `count` samples ending at the device's latest timestamp
    fn generate(&self, query: &SampleQuery, count: usize) -> Result<Option<Dataset>, ApiError> {
        let identity = DeviceIdentity::new(query.subject_id.clone(), query.source_id.clone());
        let mut state = self.state.lock();
        let SimState { rng, devices } = &mut *state;

        let Some(device) = devices.get_mut(&identity) else {
            return Ok(None);
        };

        let lag = match device.profile {
            DeviceProfile::Silent => return Ok(None),
            DeviceProfile::Flaky(p) if rng.gen::<f64>() < p => {
                return Err(ApiError::Unavailable(format!(
                    "simulated outage for {}",
                    identity
                )))
            }
            DeviceProfile::Lagging(minutes) => minutes,
            _ => 0,
        };

        device.battery = (device.battery - rng.gen_range(0.0..0.002)).max(0.0);

        let step = Duration::seconds(query.interval.seconds());
        let now = Utc::now() - Duration::minutes(lag);
        let latest = now.duration_trunc(step).unwrap_or(now);
        let samples: Vec<Sample> = (0..count)
            .rev()
            .map(|i| Self::sample_at(rng, query.sensor, latest - step * i as i32, device.battery))
            .collect();

        Ok(Some(Dataset::from_samples(&identity, query.sensor, &samples)))
    }
}

#[async_trait]
impl ApiClient for SimulatedClient {
    async fn list_subjects(&self, study_id: &str) -> Result<Vec<String>, ApiError> {
        if study_id != self.study_id {
            return Ok(Vec::new());
        }
        Ok(self.subjects.iter().map(|(s, _)| s.clone()).collect())
    }

    async fn list_sources(&self, subject_id: &str) -> Result<Vec<SourceInfo>, ApiError> {
        Ok(self
            .subjects
            .iter()
            .find(|(s, _)| s == subject_id)
            .map(|(_, sources)| sources.clone())
            .unwrap_or_default())
    }

    async fn fetch_last_sample(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
        self.generate(query, 1)
    }

    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
        self.generate(query, 60)
    }
}
