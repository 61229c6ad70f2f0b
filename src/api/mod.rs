// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Upstream API - collaborator contract, wire types and clients

mod rest;
mod simulator;

pub use rest::RestClient;
pub use simulator::{DeviceProfile, SimulatedClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, IngestError};
use crate::registry::DeviceIdentity;
use crate::sensors::{Interval, Payload, Sample, SensorType, Stat};

/// A source attached to a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
}

/// Parameters of one sample request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    pub sensor: SensorType,
    pub stat: Stat,
    pub interval: Interval,
    pub subject_id: String,
    pub source_id: String,
}

impl SampleQuery {
    pub fn new(sensor: SensorType, stat: Stat, interval: Interval, identity: &DeviceIdentity) -> Self {
        Self {
            sensor,
            stat,
            interval,
            subject_id: identity.subject_id.clone(),
            source_id: identity.source_id.clone(),
        }
    }
}

/// Header of a dataset response. Every field is optional on the wire;
/// [`Dataset::into_batch`] decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetHeader {
    pub subject_id: Option<String>,
    pub source_id: Option<String>,
    pub sensor: Option<String>,
    pub unit: Option<String>,
    pub time_frame: Option<String>,
}

/// Sample as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSample {
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    pub sample: Option<Payload>,
}

/// Dataset response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub header: Option<DatasetHeader>,
    pub dataset: Option<Vec<WireSample>>,
}

/// A validated dataset, ready for ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Identity as reported by upstream, before aliasing
    pub identity: DeviceIdentity,
    pub sensor: SensorType,
    pub samples: Vec<Sample>,
}

impl Dataset {
    /// Validate the response. Missing header fields, unknown sensors and
    /// empty datasets are malformed; individual incomplete samples are skipped.
    pub fn into_batch(self) -> Result<Batch, IngestError> {
        let header = self
            .header
            .ok_or_else(|| IngestError::MalformedResponse("missing header".into()))?;
        let subject_id = header
            .subject_id
            .ok_or_else(|| IngestError::MalformedResponse("header without subjectId".into()))?;
        let source_id = header
            .source_id
            .ok_or_else(|| IngestError::MalformedResponse("header without sourceId".into()))?;
        let sensor: SensorType = header
            .sensor
            .ok_or_else(|| IngestError::MalformedResponse("header without sensor".into()))?
            .parse()?;

        let wire = self
            .dataset
            .ok_or_else(|| IngestError::MalformedResponse("missing dataset".into()))?;
        let total = wire.len();
        let samples: Vec<Sample> = wire
            .into_iter()
            .filter_map(|w| match (w.start_date_time, w.sample) {
                (Some(start), Some(payload)) => Some(Sample {
                    start,
                    end: w.end_date_time,
                    sensor,
                    payload,
                }),
                _ => None,
            })
            .collect();

        if samples.len() < total {
            debug!("Skipped {} incomplete {} samples", total - samples.len(), sensor);
        }
        if samples.is_empty() {
            return Err(IngestError::MalformedResponse(format!(
                "no usable {} samples for {}/{}",
                sensor, subject_id, source_id
            )));
        }

        Ok(Batch {
            identity: DeviceIdentity::new(subject_id, source_id),
            sensor,
            samples,
        })
    }

    /// Build a well-formed dataset from samples
    pub fn from_samples(identity: &DeviceIdentity, sensor: SensorType, samples: &[Sample]) -> Self {
        Self {
            header: Some(DatasetHeader {
                subject_id: Some(identity.subject_id.clone()),
                source_id: Some(identity.source_id.clone()),
                sensor: Some(sensor.as_str().to_string()),
                ..Default::default()
            }),
            dataset: Some(
                samples
                    .iter()
                    .map(|s| WireSample {
                        start_date_time: Some(s.start),
                        end_date_time: s.end,
                        sample: Some(s.payload),
                    })
                    .collect(),
            ),
        }
    }
}

/// Calls the monitor makes against the aggregation API.
///
/// Implementations own their timeouts and retries; the monitor only sees
/// success or failure of each call.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Subject ids enrolled in a study
    async fn list_subjects(&self, study_id: &str) -> Result<Vec<String>, ApiError>;

    /// Sources attached to a subject
    async fn list_sources(&self, subject_id: &str) -> Result<Vec<SourceInfo>, ApiError>;

    /// Most recent aggregated sample, `None` when upstream has nothing
    async fn fetch_last_sample(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError>;

    /// Every aggregated sample available for the window
    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "header": {
            "subjectId": "UKLFR",
            "sourceId": "00:07:80:1F:52:F3",
            "sensor": "ACCELEROMETER",
            "unit": "G",
            "timeFrame": "TEN_SECOND"
        },
        "dataset": [
            {"startDateTime": "2017-06-01T12:00:00Z", "endDateTime": "2017-06-01T12:00:10Z",
             "sample": {"x": 0.01, "y": -0.02, "z": 0.98}},
            {"startDateTime": "2017-06-01T12:00:10Z", "sample": null},
            {"startDateTime": "2017-06-01T12:00:20Z", "endDateTime": "2017-06-01T12:00:30Z",
             "sample": {"x": 0.02, "y": -0.01, "z": 0.99}}
        ]
    }"#;

    #[test]
    fn test_dataset_into_batch() {
        let dataset: Dataset = serde_json::from_str(BODY).unwrap();
        let batch = dataset.into_batch().unwrap();

        assert_eq!(batch.identity, DeviceIdentity::new("UKLFR", "00:07:80:1F:52:F3"));
        assert_eq!(batch.sensor, SensorType::Accelerometer);
        assert_eq!(batch.samples.len(), 2);
        assert!(matches!(batch.samples[0].payload, Payload::Vector { .. }));
        assert_eq!(
            batch.samples[1].start.to_rfc3339(),
            "2017-06-01T12:00:20+00:00"
        );
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let empty: Dataset = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.into_batch(), Err(IngestError::MalformedResponse(_))));

        let no_samples: Dataset = serde_json::from_str(
            r#"{"header": {"subjectId": "a", "sourceId": "b", "sensor": "BATTERY"}, "dataset": []}"#,
        )
        .unwrap();
        assert!(matches!(no_samples.into_batch(), Err(IngestError::MalformedResponse(_))));
    }

    #[test]
    fn test_unknown_sensor_rejected() {
        let body = r#"{"header": {"subjectId": "a", "sourceId": "b", "sensor": "GYRO"},
                       "dataset": [{"startDateTime": "2017-06-01T12:00:00Z", "sample": {"value": 1.0}}]}"#;
        let dataset: Dataset = serde_json::from_str(body).unwrap();
        assert_eq!(
            dataset.into_batch(),
            Err(IngestError::UnknownSensor("GYRO".into()))
        );
    }

    #[test]
    fn test_from_samples_round_trips_through_batch() {
        let id = DeviceIdentity::new("s", "d");
        let start = "2017-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let samples = vec![Sample::scalar(start, SensorType::Battery, 0.5)];
        let batch = Dataset::from_samples(&id, SensorType::Battery, &samples)
            .into_batch()
            .unwrap();
        assert_eq!(batch.samples, samples);
    }
}
