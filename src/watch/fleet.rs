// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! MachineConfigPool fleet health, used around disruptive changes such as
//! mirror set rollouts.

use crate::constants::fleet::EXPECTED_POOLS;
use crate::error::{HarnessError, Result};
use crate::kubernetes::resource::MACHINE_CONFIG_POOL;
use crate::kubernetes::{FieldPath, ResourceQuery};
use crate::watch::condition::{wait_and_hold, ConditionQuery, Consistency};
use crate::watch::poll::{poll_until, Attempt, PollOutcome, WaitOptions};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// Rollout state of one pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub name: String,
    pub updating: String,
    pub updated: String,
    pub machine_count: u32,
    pub ready_machine_count: u32,
    pub unavailable_machine_count: u32,
    pub degraded_machine_count: u32,
}

impl PoolStatus {
    /// Not rolling out, every machine ready, and nothing degraded
    pub fn is_healthy(&self) -> bool {
        self.updating.contains("False")
            && self.machine_count == self.ready_machine_count
            && self.unavailable_machine_count == self.degraded_machine_count
            && self.degraded_machine_count == 0
    }
}

/// Read the status of the pool `name`
pub async fn pool_status(query: &dyn ResourceQuery, name: &str) -> Result<PoolStatus> {
    let pool = MACHINE_CONFIG_POOL.named(name);
    let updating = query.read(&pool, &FieldPath::condition_status("Updating")).await?;
    let updated = query.read(&pool, &FieldPath::condition_status("Updated")).await?;

    let mut counts = [0u32; 4];
    let fields = [
        "machineCount",
        "readyMachineCount",
        "unavailableMachineCount",
        "degradedMachineCount",
    ];
    for (count, field) in counts.iter_mut().zip(fields) {
        let value = query
            .read(&pool, &FieldPath::field(format!("status.{}", field)))
            .await?;
        *count = value.trim().parse().map_err(|_| HarnessError::InvalidCount {
            pool: name.to_string(),
            field: field.to_string(),
            value: value.clone(),
        })?;
    }
    let [machine_count, ready_machine_count, unavailable_machine_count, degraded_machine_count] =
        counts;

    Ok(PoolStatus {
        name: name.to_string(),
        updating,
        updated,
        machine_count,
        ready_machine_count,
        unavailable_machine_count,
        degraded_machine_count,
    })
}

/// True when the fleet is exactly the master and worker pools and both are
/// healthy. Any read failure, unexpected pool or unparsable count is unhealthy.
#[instrument(skip(query))]
pub async fn fleet_healthy(query: &dyn ResourceQuery) -> bool {
    let names = match query.list_names(&MACHINE_CONFIG_POOL, None).await {
        Ok(names) => names,
        Err(e) => {
            warn!("could not list machine config pools: {}", e);
            return false;
        }
    };

    let found: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let expected: BTreeSet<&str> = EXPECTED_POOLS.into_iter().collect();
    if found != expected || names.len() != EXPECTED_POOLS.len() {
        warn!("unexpected machine config pools: {:?}", names);
        return false;
    }

    for name in EXPECTED_POOLS {
        match pool_status(query, name).await {
            Ok(status) if status.is_healthy() => {}
            Ok(status) => {
                info!("pool {} is not healthy: {:?}", name, status);
                return false;
            }
            Err(e) => {
                warn!("could not read pool {}: {}", name, e);
                return false;
            }
        }
    }
    true
}

/// Poll [`fleet_healthy`] until it reports true
pub async fn wait_for_fleet_healthy(query: &dyn ResourceQuery, options: &WaitOptions) -> Result<()> {
    let outcome = poll_until(options, || async move {
        if fleet_healthy(query).await {
            Attempt::Done(())
        } else {
            Attempt::Pending("fleet is not healthy".to_string())
        }
    })
    .await;

    match outcome {
        PollOutcome::Observed(()) => Ok(()),
        PollOutcome::TimedOut { last, elapsed } => Err(HarnessError::Timeout {
            condition: "machine config pool fleet".to_string(),
            expected: "healthy".to_string(),
            last: last.unwrap_or_default(),
            elapsed,
        }),
    }
}

/// Wait for a condition field of pool `pool` to contain `expected`, then hold it
#[instrument(skip(query, options, hold))]
pub async fn assert_pool_condition(
    query: &dyn ResourceQuery,
    pool: &str,
    condition_type: &str,
    field: &str,
    expected: &str,
    options: &WaitOptions,
    hold: &Consistency,
) -> Result<()> {
    info!(
        "assert mcp {} {} {} expect is {}",
        pool, condition_type, field, expected
    );
    let condition = ConditionQuery::new(
        MACHINE_CONFIG_POOL.named(pool),
        FieldPath::condition(condition_type, field),
    );
    wait_and_hold(query, &condition, expected, options, hold).await?;
    Ok(())
}
