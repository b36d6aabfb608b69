// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pre-GA `operators.operatorframework.io` Operator objects

use crate::error::Result;
use crate::kubernetes::resource::OPERATOR;
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef, TemplateParams};
use crate::resources::{cleanup, read_non_empty};
use crate::watch::condition::{wait_and_hold, ConditionQuery, Consistency};
use crate::watch::poll::WaitOptions;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct Operator {
    pub name: String,
    pub package: String,
    pub channel: String,
    pub version: String,
    pub upgrade_constraint_policy: String,
    pub template: PathBuf,
    pub installed_bundle_resource: Option<String>,
    pub resolved_bundle_resource: Option<String>,
    pub wait: WaitOptions,
}

impl Operator {
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> ResourceRef {
        OPERATOR.named(&self.name)
    }

    pub fn params(&self) -> TemplateParams {
        TemplateParams::new()
            .set_if_present("NAME", &self.name)
            .set_if_present("PACKAGE", &self.package)
            .set_if_present("CHANNEL", &self.channel)
            .set_if_present("VERSION", &self.version)
            .set_if_present("POLICY", &self.upgrade_constraint_policy)
    }

    /// Create the operator, wait until it is resolved and installed, and record its bundle resources
    #[instrument(skip(self, query), fields(name = %self.name))]
    pub async fn create(&mut self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Create operator {}", self.name);
        self.create_without_check(query).await?;
        self.wait_condition(query, "Resolved", "True", &Consistency::none())
            .await?;
        self.wait_condition(query, "Installed", "True", &Consistency::none())
            .await?;
        self.bundle_resources(query).await
    }

    pub async fn create_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        query.apply(&self.template, &self.params()).await
    }

    pub async fn wait_condition(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        status: &str,
        hold: &Consistency,
    ) -> Result<String> {
        info!(
            "check operator {} {} status is {}",
            self.name, condition_type, status
        );
        let condition =
            ConditionQuery::new(self.target(), FieldPath::condition_status(condition_type));
        wait_and_hold(query, &condition, status, &self.wait, hold).await
    }

    /// Read `status.installedBundleResource` and `status.resolvedBundleResource`
    pub async fn bundle_resources(&mut self, query: &dyn ResourceQuery) -> Result<()> {
        let target = self.target();
        let installed =
            read_non_empty(query, &target, &FieldPath::field("status.installedBundleResource"))
                .await?;
        let resolved =
            read_non_empty(query, &target, &FieldPath::field("status.resolvedBundleResource"))
                .await?;
        self.installed_bundle_resource = Some(installed);
        self.resolved_bundle_resource = Some(resolved);
        Ok(())
    }

    pub async fn patch(&self, query: &dyn ResourceQuery, merge_patch: &Value) -> Result<()> {
        query.patch(&self.target(), merge_patch).await
    }

    pub async fn delete(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Delete operator {}", self.name);
        cleanup(query, &self.target()).await
    }
}
