// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Resource query failed: {0}")]
    QueryError(String),

    #[error("{kind} \"{name}\" not found")]
    ResourceNotFound { kind: String, name: String },

    #[error(
        "timed out after {elapsed:?} waiting for {condition} to contain {expected:?} (last observed: {last})"
    )]
    Timeout {
        condition: String,
        expected: String,
        last: String,
        elapsed: Duration,
    },

    #[error(
        "{condition} did not stay at {expected:?}: sample {sample} observed {observed:?}"
    )]
    Regression {
        condition: String,
        expected: String,
        observed: String,
        sample: u32,
    },

    #[error("Invalid JSON on catalog line {line}: {source}")]
    DecodeError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("can not get {0}")]
    NotFound(String),

    #[error("unsupported schema: {0}")]
    UnsupportedSchema(String),

    #[error("Invalid machine count {field}={value:?} on pool {pool}")]
    InvalidCount {
        pool: String,
        field: String,
        value: String,
    },

    #[error("{0} is not healthy")]
    Unhealthy(String),

    #[error("Content fetch failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
