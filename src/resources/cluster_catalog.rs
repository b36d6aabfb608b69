// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::catalog::{self, ContentSnapshot, SchemaFilter};
use crate::config::ProxyConfig;
use crate::constants::catalogd::{
    ALL_CONTENT_PATH, NAMESPACE, ROUTE_INTERVAL_SECS, ROUTE_TIMEOUT_SECS, SERVICE, SERVICE_HOST,
};
use crate::error::{HarnessError, Result};
use crate::kubernetes::resource::{CLUSTER_CATALOG, ROUTE};
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef, TemplateParams};
use crate::resources::{cleanup, read_non_empty};
use crate::watch::condition::{wait_and_hold, wait_for_field, ConditionQuery, Consistency};
use crate::watch::poll::WaitOptions;
use bytes::Bytes;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// A ClusterCatalog created from a manifest template
#[derive(Debug, Clone, Default)]
pub struct ClusterCatalog {
    pub name: String,
    pub pull_secret: String,
    pub type_name: String,
    pub image_ref: String,
    pub poll_interval_minutes: String,
    /// Template default is `olmv1-test`
    pub label_key: String,
    pub label_value: String,
    pub template: PathBuf,
    /// Externally reachable content URL, filled in by [`ClusterCatalog::resolve_content_url`]
    pub content_url: Option<String>,
    pub wait: WaitOptions,
}

impl ClusterCatalog {
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> ResourceRef {
        CLUSTER_CATALOG.named(&self.name)
    }

    pub fn params(&self) -> TemplateParams {
        TemplateParams::new()
            .set_if_present("NAME", &self.name)
            .set_if_present("SECRET", &self.pull_secret)
            .set_if_present("TYPE", &self.type_name)
            .set_if_present("IMAGE", &self.image_ref)
            .set_if_present("POLLINTERVALMINUTES", &self.poll_interval_minutes)
            .set_if_present("LABELKEY", &self.label_key)
            .set_if_present("LABELVALUE", &self.label_value)
    }

    /// Create the catalog, wait until it is serving, and resolve its content URL
    #[instrument(skip(self, query), fields(name = %self.name))]
    pub async fn create(&mut self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Create clustercatalog {}", self.name);
        self.create_without_check(query).await?;
        self.wait_status(query, "true", "Serving", &Consistency::none())
            .await?;
        self.resolve_content_url(query).await?;
        Ok(())
    }

    pub async fn create_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        query.apply(&self.template, &self.params()).await
    }

    /// Wait for the `status` of condition `condition_type` to contain `status`
    pub async fn wait_status(
        &self,
        query: &dyn ResourceQuery,
        status: &str,
        condition_type: &str,
        hold: &Consistency,
    ) -> Result<String> {
        info!(
            "check clustercatalog {} {} status is {}",
            self.name, condition_type, status
        );
        let condition =
            ConditionQuery::new(self.target(), FieldPath::condition_status(condition_type));
        wait_and_hold(query, &condition, status, &self.wait, hold).await
    }

    /// Resolve the content URL through the catalogd route and remember it
    pub async fn resolve_content_url(&mut self, query: &dyn ResourceQuery) -> Result<String> {
        let route = ConditionQuery::new(
            ROUTE.named(SERVICE).in_namespace(NAMESPACE),
            FieldPath::field("spec.host"),
        );
        let route_options = WaitOptions::new(
            Duration::from_secs(ROUTE_INTERVAL_SECS),
            Duration::from_secs(ROUTE_TIMEOUT_SECS),
        )
        .immediately();
        let host = wait_for_field(query, &route, &route_options).await?;

        let base = read_non_empty(query, &self.target(), &FieldPath::field("status.urls.base"))
            .await?;
        let url = content_url(&base, &host)?;
        info!("clustercatalog {} contentURL is {}", self.name, url);
        self.content_url = Some(url.clone());
        Ok(url)
    }

    pub async fn patch(&self, query: &dyn ResourceQuery, merge_patch: &Value) -> Result<()> {
        query.patch(&self.target(), merge_patch).await
    }

    /// Delete the catalog and wait until it is gone
    pub async fn delete(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Delete clustercatalog {}", self.name);
        cleanup(query, &self.target()).await
    }

    /// Download the catalog's content, resolving the content URL first if needed
    pub async fn fetch_content(
        &mut self,
        query: &dyn ResourceQuery,
        proxy: &ProxyConfig,
    ) -> Result<Bytes> {
        let url = match &self.content_url {
            Some(url) => url.clone(),
            None => self.resolve_content_url(query).await?,
        };
        catalog::fetch_content(&url, proxy).await
    }

    /// Download and decode the catalog's content
    pub async fn decode_content(
        &mut self,
        query: &dyn ResourceQuery,
        proxy: &ProxyConfig,
        filter: SchemaFilter,
    ) -> Result<ContentSnapshot> {
        let raw = self.fetch_content(query, proxy).await?;
        catalog::decode(&raw, filter)
    }
}

/// Build the externally reachable "all content" URL from the catalog's
/// in-cluster base URL and the catalogd route host
pub fn content_url(base: &str, route_host: &str) -> Result<String> {
    if route_host.is_empty() {
        return Err(HarnessError::NotFound(format!("route {}", SERVICE)));
    }
    let url = format!("{}/{}", base.trim_end_matches('/'), ALL_CONTENT_PATH)
        .replacen(SERVICE_HOST, route_host, 1);
    Url::parse(&url)?;
    Ok(url)
}
