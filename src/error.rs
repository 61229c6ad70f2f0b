// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Error types shared across the monitor

use thiserror::Error;

/// Failure of a call to the upstream aggregation API.
///
/// Always recoverable: the current request is abandoned and the polling loop
/// carries on with its schedule.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Failure to apply a fetched batch to the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unknown device {subject_id}/{source_id}")]
    UnknownIdentity {
        subject_id: String,
        source_id: String,
    },

    #[error("unknown sensor type '{0}'")]
    UnknownSensor(String),
}

/// Failure of a one-shot fetch-and-ingest, such as a backfill.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Invalid configuration. The only error class that is fatal, and only at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("status table: {0}")]
    StatusTable(String),

    #[error("device table {path}: {reason}")]
    DeviceTable { path: String, reason: String },

    #[error("alias '{alias}' is used for both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
