// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pre-GA rukpak BundleDeployment objects

use crate::constants::poll::{BUNDLE_DEPLOYMENT_HOLD_INTERVAL_SECS, BUNDLE_DEPLOYMENT_HOLD_SECS};
use crate::error::{HarnessError, Result};
use crate::kubernetes::resource::BUNDLE_DEPLOYMENT;
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef, TemplateParams};
use crate::resources::cleanup;
use crate::watch::condition::{wait_and_hold, ConditionQuery, Consistency};
use crate::watch::poll::WaitOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct BundleDeployment {
    pub name: String,
    pub address: String,
    pub template: PathBuf,
    pub wait: WaitOptions,
}

impl BundleDeployment {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        template: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> ResourceRef {
        BUNDLE_DEPLOYMENT.named(&self.name)
    }

    pub fn params(&self) -> TemplateParams {
        TemplateParams::new()
            .set("NAME", &self.name)
            .set("ADDRESS", &self.address)
    }

    /// Create the deployment and wait until it is installed and healthy
    pub async fn create(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Create bd {}", self.name);
        self.create_without_check(query).await?;
        self.assert_installed(query, "true").await?;
        self.assert_healthy(query, "true").await
    }

    pub async fn create_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        query.apply(&self.template, &self.params()).await
    }

    pub async fn assert_installed(&self, query: &dyn ResourceQuery, expected: &str) -> Result<()> {
        self.assert_condition(query, "Installed", "status", expected, false)
            .await
    }

    pub async fn assert_healthy(&self, query: &dyn ResourceQuery, expected: &str) -> Result<()> {
        self.assert_condition(query, "Healthy", "status", expected, false)
            .await
    }

    /// Like [`BundleDeployment::assert_healthy`], then keep checking for 10s
    pub async fn assert_healthy_consistently(
        &self,
        query: &dyn ResourceQuery,
        expected: &str,
    ) -> Result<()> {
        self.assert_condition(query, "Healthy", "status", expected, true)
            .await
    }

    /// Wait for `field` of condition `condition_type` to contain `expected`
    pub async fn assert_condition(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        field: &str,
        expected: &str,
        consistently: bool,
    ) -> Result<()> {
        let hold = if consistently {
            Consistency::for_secs(BUNDLE_DEPLOYMENT_HOLD_SECS)
                .with_interval(Duration::from_secs(BUNDLE_DEPLOYMENT_HOLD_INTERVAL_SECS))
        } else {
            Consistency::none()
        };
        let condition =
            ConditionQuery::new(self.target(), FieldPath::condition(condition_type, field));
        let value = wait_and_hold(query, &condition, expected, &self.wait, &hold).await?;
        info!(
            "the field {} of bd {} with type={} is expected as {}, which is {}",
            field, self.name, condition_type, expected, value
        );
        Ok(())
    }

    /// Single read of a condition field
    pub async fn condition(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        field: &str,
        allow_empty: bool,
    ) -> Result<String> {
        let path = FieldPath::condition(condition_type, field);
        let value = query.read(&self.target(), &path).await?;
        if value.is_empty() && !allow_empty {
            return Err(HarnessError::NotFound(format!("{} of {}", path, self.target())));
        }
        Ok(value)
    }

    pub async fn delete(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Delete bd {}", self.name);
        cleanup(query, &self.target()).await
    }
}
