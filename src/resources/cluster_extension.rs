// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::constants::poll::{PROGRESSING_MESSAGE_TIMEOUT_SECS, VERSION_TIMEOUT_SECS};
use crate::error::Result;
use crate::kubernetes::resource::CLUSTER_EXTENSION;
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef, TemplateParams};
use crate::resources::{cleanup, read_non_empty};
use crate::watch::condition::{
    wait_and_hold, wait_for_field, wait_for_substring, ConditionQuery, Consistency,
};
use crate::watch::poll::WaitOptions;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

const INSTALLED_BUNDLE: &str = "status.install.bundle.name";

/// A ClusterExtension created from a manifest template
#[derive(Debug, Clone, Default)]
pub struct ClusterExtension {
    pub name: String,
    pub package: String,
    pub channel: String,
    pub version: String,
    pub install_namespace: String,
    pub service_account: String,
    pub upgrade_constraint_policy: String,
    /// Template default is `olmv1-test`
    pub label_key: String,
    pub label_value: String,
    pub expressions_key: String,
    pub expressions_operator: String,
    pub expressions_values: [String; 3],
    pub source_type: String,
    pub template: PathBuf,
    /// Set once the extension reports an installed bundle
    pub installed_bundle: Option<String>,
    pub wait: WaitOptions,
}

impl ClusterExtension {
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> ResourceRef {
        CLUSTER_EXTENSION.named(&self.name)
    }

    pub fn params(&self) -> TemplateParams {
        let [value1, value2, value3] = &self.expressions_values;
        TemplateParams::new()
            .set_if_present("NAME", &self.name)
            .set_if_present("PACKAGE", &self.package)
            .set_if_present("CHANNEL", &self.channel)
            .set_if_present("VERSION", &self.version)
            .set_if_present("INSTALLNAMESPACE", &self.install_namespace)
            .set_if_present("SANAME", &self.service_account)
            .set_if_present("POLICY", &self.upgrade_constraint_policy)
            .set_if_present("LABELKEY", &self.label_key)
            .set_if_present("LABELVALUE", &self.label_value)
            .set_if_present("EXPRESSIONSKEY", &self.expressions_key)
            .set_if_present("EXPRESSIONSOPERATOR", &self.expressions_operator)
            .set_if_present("EXPRESSIONSVALUE1", value1)
            .set_if_present("EXPRESSIONSVALUE2", value2)
            .set_if_present("EXPRESSIONSVALUE3", value3)
            .set_if_present("SOURCETYPE", &self.source_type)
    }

    fn condition(&self, condition_type: &str, field: &str) -> ConditionQuery {
        ConditionQuery::new(self.target(), FieldPath::condition(condition_type, field))
    }

    /// Create the extension and wait until it has installed a bundle
    #[instrument(skip(self, query), fields(name = %self.name))]
    pub async fn create(&mut self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Create clusterextension {}", self.name);
        self.create_without_check(query).await?;
        self.check_condition(
            query,
            "Progressing",
            "reason",
            "Succeeded",
            &self.wait,
            &Consistency::none(),
        )
        .await?;
        self.wait_condition(query, "Installed", "True", &Consistency::none())
            .await?;
        let bundle = self.installed_bundle(query).await?;
        self.installed_bundle = Some(bundle);
        Ok(())
    }

    /// Apply the template, creating the install namespace first when one is set
    pub async fn create_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        if !self.install_namespace.is_empty() {
            query.ensure_namespace(&self.install_namespace).await?;
        }
        query.apply(&self.template, &self.params()).await
    }

    /// Wait for the `status` of condition `condition_type` to contain `status`
    pub async fn wait_condition(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        status: &str,
        hold: &Consistency,
    ) -> Result<String> {
        info!(
            "wait clusterextension {} {} status is {}",
            self.name, condition_type, status
        );
        let condition = self.condition(condition_type, "status");
        wait_and_hold(query, &condition, status, &self.wait, hold).await
    }

    /// Wait for any field of condition `condition_type` to contain `expected`
    pub async fn check_condition(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        field: &str,
        expected: &str,
        options: &WaitOptions,
        hold: &Consistency,
    ) -> Result<String> {
        info!(
            "check clusterextension {} {} {} expect is {}",
            self.name, condition_type, field, expected
        );
        let condition = self.condition(condition_type, field);
        wait_and_hold(query, &condition, expected, options, hold).await
    }

    /// Message of condition `condition_type`, which may be empty
    pub async fn condition_message(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
    ) -> Result<String> {
        self.condition_field(query, condition_type, "message").await
    }

    /// Any field of condition `condition_type`, which may be empty
    pub async fn condition_field(
        &self,
        query: &dyn ResourceQuery,
        condition_type: &str,
        field: &str,
    ) -> Result<String> {
        let condition = self.condition(condition_type, field);
        wait_for_field(query, &condition, &self.wait.allow_empty()).await
    }

    /// Wait for the Progressing message to include `expected`, case-sensitively
    pub async fn wait_progressing_message(
        &self,
        query: &dyn ResourceQuery,
        expected: &str,
    ) -> Result<String> {
        info!(
            "wait clusterextension {} Progressing message includes {}",
            self.name, expected
        );
        let options = WaitOptions {
            timeout: Duration::from_secs(PROGRESSING_MESSAGE_TIMEOUT_SECS),
            ..self.wait
        };
        wait_for_substring(query, &self.condition("Progressing", "message"), expected, &options)
            .await
    }

    /// Name of the currently installed bundle
    pub async fn installed_bundle(&self, query: &dyn ResourceQuery) -> Result<String> {
        read_non_empty(query, &self.target(), &FieldPath::field(INSTALLED_BUNDLE)).await
    }

    /// Wait until the installed bundle name includes `version`
    pub async fn wait_version(&self, query: &dyn ResourceQuery, version: &str) -> Result<String> {
        info!("wait clusterextension {} version is {}", self.name, version);
        let options = WaitOptions {
            timeout: Duration::from_secs(VERSION_TIMEOUT_SECS),
            ..self.wait
        };
        let condition = ConditionQuery::new(self.target(), FieldPath::field(INSTALLED_BUNDLE));
        wait_for_substring(query, &condition, version, &options).await
    }

    pub async fn patch(&self, query: &dyn ResourceQuery, merge_patch: &Value) -> Result<()> {
        query.patch(&self.target(), merge_patch).await
    }

    /// Delete the extension and wait until it is gone
    pub async fn delete(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Delete clusterextension {}", self.name);
        cleanup(query, &self.target()).await
    }
}
