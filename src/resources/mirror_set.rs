// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Image mirror sets. Creating or deleting one rolls every MachineConfigPool,
//! so both operations wait for the rollout and the fleet to settle.

use crate::constants::fleet::{
    EXPECTED_POOLS, HEALTH_INTERVAL_SECS, HEALTH_TIMEOUT_SECS, MASTER_REVERT_HOLD_SECS,
    MASTER_REVERT_INTERVAL_SECS, ROLLOUT_HOLD_SECS, ROLLOUT_INTERVAL_SECS,
    ROLLOUT_START_HOLD_SECS, ROLLOUT_START_INTERVAL_SECS, ROLLOUT_START_TIMEOUT_SECS,
    ROLLOUT_TIMEOUT_SECS,
};
use crate::error::{HarnessError, Result};
use crate::kubernetes::resource::{IMAGE_DIGEST_MIRROR_SET, IMAGE_TAG_MIRROR_SET};
use crate::kubernetes::{ResourceKind, ResourceQuery, ResourceRef, TemplateParams};
use crate::watch::condition::Consistency;
use crate::watch::fleet::{assert_pool_condition, fleet_healthy, wait_for_fleet_healthy};
use crate::watch::poll::WaitOptions;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorSetKind {
    #[default]
    Digest,
    Tag,
}

impl MirrorSetKind {
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            MirrorSetKind::Digest => IMAGE_DIGEST_MIRROR_SET,
            MirrorSetKind::Tag => IMAGE_TAG_MIRROR_SET,
        }
    }
}

/// An ImageDigestMirrorSet or ImageTagMirrorSet created from a template
#[derive(Debug, Clone, Default)]
pub struct MirrorSet {
    pub kind: MirrorSetKind,
    pub name: String,
    pub mirror_site: String,
    pub source_site: String,
    pub mirror_namespace: String,
    pub source_namespace: String,
    pub template: PathBuf,
}

fn secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

impl MirrorSet {
    pub fn new(kind: MirrorSetKind, name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> ResourceRef {
        self.kind.resource_kind().named(&self.name)
    }

    pub fn params(&self) -> TemplateParams {
        TemplateParams::new()
            .set_if_present("NAME", &self.name)
            .set_if_present("MIRRORSITE", &self.mirror_site)
            .set_if_present("SOURCESITE", &self.source_site)
            .set_if_present("MIRRORNAMESPACE", &self.mirror_namespace)
            .set_if_present("SOURCENAMESPACE", &self.source_namespace)
    }

    /// Create the mirror set and wait for both pools to roll it out
    #[instrument(skip(self, query), fields(name = %self.name))]
    pub async fn create(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Create {} {}", self.kind.resource_kind().kind, self.name);
        self.create_without_check(query).await?;

        let start = WaitOptions::new(secs(ROLLOUT_START_INTERVAL_SECS), secs(ROLLOUT_START_TIMEOUT_SECS));
        let start_hold = Consistency::for_secs(ROLLOUT_START_HOLD_SECS);
        for pool in EXPECTED_POOLS {
            assert_pool_condition(query, pool, "Updating", "status", "True", &start, &start_hold)
                .await?;
        }

        let finish = WaitOptions::new(secs(ROLLOUT_INTERVAL_SECS), secs(ROLLOUT_TIMEOUT_SECS));
        let finish_hold = Consistency::for_secs(ROLLOUT_HOLD_SECS);
        for pool in EXPECTED_POOLS {
            assert_pool_condition(query, pool, "Updating", "status", "False", &finish, &finish_hold)
                .await?;
        }

        if !fleet_healthy(query).await {
            return Err(HarnessError::Unhealthy("machine config pool fleet".to_string()));
        }
        Ok(())
    }

    pub async fn create_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        query.apply(&self.template, &self.params()).await
    }

    /// Delete the mirror set and wait for the pools to revert and recover
    #[instrument(skip(self, query), fields(name = %self.name))]
    pub async fn delete(&self, query: &dyn ResourceQuery) -> Result<()> {
        info!("Delete {} {}", self.kind.resource_kind().kind, self.name);
        self.delete_without_check(query).await?;

        let master = WaitOptions::new(secs(MASTER_REVERT_INTERVAL_SECS), secs(ROLLOUT_TIMEOUT_SECS));
        assert_pool_condition(
            query,
            "master",
            "Updating",
            "status",
            "False",
            &master,
            &Consistency::for_secs(MASTER_REVERT_HOLD_SECS),
        )
        .await?;
        let worker = WaitOptions::new(secs(ROLLOUT_INTERVAL_SECS), secs(ROLLOUT_TIMEOUT_SECS));
        assert_pool_condition(
            query,
            "worker",
            "Updating",
            "status",
            "False",
            &worker,
            &Consistency::for_secs(ROLLOUT_HOLD_SECS),
        )
        .await?;

        let health = WaitOptions::new(secs(HEALTH_INTERVAL_SECS), secs(HEALTH_TIMEOUT_SECS));
        wait_for_fleet_healthy(query, &health).await
    }

    /// Delete every object the template renders to
    pub async fn delete_without_check(&self, query: &dyn ResourceQuery) -> Result<()> {
        query.delete_manifest(&self.template, &self.params()).await
    }
}
