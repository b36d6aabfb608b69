// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::catalog::SchemaFilter;
use crate::constants::poll;
use crate::watch::poll::WaitOptions;

/// Proxy variables consulted for content fetches, in order of precedence
pub const PROXY_VARS: [&str; 4] = ["http_proxy", "https_proxy", "HTTP_PROXY", "HTTPS_PROXY"];

/// Proxy settings derived from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: Option<String>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve the proxy from an arbitrary variable lookup.
    /// The first non-empty variable in [`PROXY_VARS`] wins.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = PROXY_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty());
        Self { url }
    }
}

/// Harness configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    /// ClusterCatalog whose content the binary fetches and summarizes
    pub catalog: Option<String>,
    pub schema: SchemaFilter,
    pub proxy: ProxyConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let poll_interval = secs_from_env("HARNESS_POLL_INTERVAL_SECS", poll::INTERVAL_SECS)?;
        let poll_timeout = secs_from_env("HARNESS_POLL_TIMEOUT_SECS", poll::TIMEOUT_SECS)?;
        let catalog = env::var("HARNESS_CATALOG").ok().filter(|c| !c.is_empty());
        let schema = env::var("HARNESS_SCHEMA")
            .unwrap_or_else(|_| "all".to_string())
            .parse()
            .context("HARNESS_SCHEMA is not a supported catalog schema")?;

        Ok(Config {
            poll_interval,
            poll_timeout,
            catalog,
            schema,
            proxy: ProxyConfig::from_env(),
        })
    }

    /// Poll timing for condition waits
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(self.poll_interval, self.poll_timeout)
    }
}

fn secs_from_env(key: &str, default: u64) -> Result<Duration> {
    match env::var(key) {
        Ok(value) => {
            let secs: u64 = value
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", key))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_proxy_prefers_lowercase_http() {
        let proxy = ProxyConfig::from_lookup(lookup(&[
            ("HTTPS_PROXY", "http://upper-https:3128"),
            ("http_proxy", "http://lower-http:3128"),
            ("https_proxy", "http://lower-https:3128"),
        ]));
        assert_eq!(proxy.url.as_deref(), Some("http://lower-http:3128"));
    }

    #[test]
    fn test_proxy_falls_through_in_order() {
        let proxy = ProxyConfig::from_lookup(lookup(&[
            ("HTTPS_PROXY", "http://upper-https:3128"),
            ("HTTP_PROXY", "http://upper-http:3128"),
        ]));
        assert_eq!(proxy.url.as_deref(), Some("http://upper-http:3128"));
    }

    #[test]
    fn test_proxy_skips_empty_values() {
        let proxy = ProxyConfig::from_lookup(lookup(&[
            ("http_proxy", ""),
            ("https_proxy", "http://lower-https:3128"),
        ]));
        assert_eq!(proxy.url.as_deref(), Some("http://lower-https:3128"));
    }

    #[test]
    fn test_no_proxy() {
        assert_eq!(ProxyConfig::from_lookup(lookup(&[])), ProxyConfig::default());
    }
}
