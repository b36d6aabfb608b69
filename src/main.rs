// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use olmv1_harness::catalog::query::{bundle_names, package_names};
use olmv1_harness::config::Config;
use olmv1_harness::kubernetes::KubeQuery;
use olmv1_harness::resources::ClusterCatalog;
use olmv1_harness::watch::{fleet_healthy, Consistency};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting olmv1-harness");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: poll_interval={:?}, poll_timeout={:?}, schema={}",
        config.poll_interval, config.poll_timeout, config.schema
    );

    let query = KubeQuery::try_default().await?;
    info!("Connected to Kubernetes cluster");

    if fleet_healthy(&query).await {
        info!("MachineConfigPool fleet is healthy");
    } else {
        warn!("MachineConfigPool fleet is not healthy");
    }

    let Some(name) = config.catalog.clone() else {
        info!("HARNESS_CATALOG not set, skipping catalog content");
        return Ok(());
    };

    let mut catalog = ClusterCatalog {
        name,
        wait: config.wait_options().immediately(),
        ..Default::default()
    };
    catalog
        .wait_status(&query, "true", "Serving", &Consistency::none())
        .await
        .with_context(|| format!("clustercatalog {} is not serving", catalog.name))?;

    let snapshot = catalog
        .decode_content(&query, &config.proxy, config.schema)
        .await
        .with_context(|| format!("failed to decode content of {}", catalog.name))?;

    info!(
        "clustercatalog {}: {} packages, {} channels, {} bundles, {} deprecations",
        catalog.name,
        snapshot.packages.len(),
        snapshot.channels.len(),
        snapshot.bundles.len(),
        snapshot.deprecations.len()
    );
    debug!("packages: {:?}", package_names(&snapshot.packages));
    debug!("bundles: {:?}", bundle_names(&snapshot.bundles));
    Ok(())
}
