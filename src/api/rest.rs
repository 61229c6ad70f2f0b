// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! HTTP client for the RADAR-CNS REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ApiClient, Dataset, SampleQuery, SourceInfo};
use crate::config::ApiConfig;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectList {
    #[serde(default)]
    subjects: Vec<SubjectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectEntry {
    subject_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceList {
    #[serde(default)]
    sources: Vec<SourceInfo>,
}

/// [`ApiClient`] over HTTP
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(concat!("radar-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.clone(),
                source,
            })?;

        info!("REST API client @ {}", base_url);
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sample_path(&self, method: &str, q: &SampleQuery) -> String {
        format!(
            "{}/data/{}/{}/{}/{}/{}/{}",
            self.base_url,
            method,
            q.sensor.as_str(),
            q.stat.as_str(),
            q.interval.as_str(),
            q.subject_id,
            q.source_id
        )
    }

    /// GET and decode a JSON body. 204, 404 and empty bodies mean "nothing".
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>, ApiError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| ApiError::Decode { url, source })
    }
}

#[async_trait]
impl ApiClient for RestClient {
    async fn list_subjects(&self, study_id: &str) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/subject/getAllSubjects/{}", self.base_url, study_id);
        let list: Option<SubjectList> = self.get_json(url).await?;
        Ok(list
            .map(|l| l.subjects.into_iter().map(|s| s.subject_id).collect())
            .unwrap_or_default())
    }

    async fn list_sources(&self, subject_id: &str) -> Result<Vec<SourceInfo>, ApiError> {
        let url = format!("{}/source/getAllSources/{}", self.base_url, subject_id);
        let list: Option<SourceList> = self.get_json(url).await?;
        Ok(list.map(|l| l.sources).unwrap_or_default())
    }

    async fn fetch_last_sample(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
        self.get_json(self.sample_path("getLastReceivedSample", query))
            .await
    }

    async fn fetch_samples(&self, query: &SampleQuery) -> Result<Option<Dataset>, ApiError> {
        self.get_json(self.sample_path("getSamples", query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceIdentity;
    use crate::sensors::{Interval, SensorType, Stat};

    fn client() -> RestClient {
        let config = ApiConfig {
            base_url: "https://radar-cns.example.org/api/".to_string(),
            ..ApiConfig::default()
        };
        RestClient::new(&config).unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(client().base_url(), "https://radar-cns.example.org/api");
    }

    #[test]
    fn test_sample_path() {
        let query = SampleQuery::new(
            SensorType::Battery,
            Stat::Average,
            Interval::TenSecond,
            &DeviceIdentity::new("UKLFR", "00:07:80:1F:52:F3"),
        );
        assert_eq!(
            client().sample_path("getLastReceivedSample", &query),
            "https://radar-cns.example.org/api/data/getLastReceivedSample/BATTERY/AVERAGE/TEN_SECOND/UKLFR/00:07:80:1F:52:F3"
        );
    }

    #[test]
    fn test_subject_list_decoding() {
        let body = r#"{"subjects": [
            {"subjectId": "UKLFR", "active": true, "sources": [{"id": "00:07:80:1F:52:F3", "type": "EMPATICA"}]},
            {"subjectId": "UKLFR2"}
        ]}"#;
        let list: SubjectList = serde_json::from_str(body).unwrap();
        let ids: Vec<String> = list.subjects.into_iter().map(|s| s.subject_id).collect();
        assert_eq!(ids, vec!["UKLFR", "UKLFR2"]);

        let sources: SourceList = serde_json::from_str(
            r#"{"subjectId": "UKLFR", "sources": [{"id": "x", "type": "ANDROID"}, {"id": "y"}]}"#,
        )
        .unwrap();
        assert_eq!(sources.sources[0].source_type, "ANDROID");
        assert_eq!(sources.sources[1].source_type, "");
    }
}
