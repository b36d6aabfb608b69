// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create, wait for, patch and delete the custom resources under test.

pub mod bundle_deployment;
pub mod cluster_catalog;
pub mod cluster_extension;
pub mod mirror_set;
pub mod operator;

pub use bundle_deployment::BundleDeployment;
pub use cluster_catalog::ClusterCatalog;
pub use cluster_extension::ClusterExtension;
pub use mirror_set::{MirrorSet, MirrorSetKind};
pub use operator::Operator;

use crate::constants::poll::{CLEANUP_INTERVAL_SECS, CLEANUP_TIMEOUT_SECS};
use crate::error::{HarnessError, Result};
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef};
use crate::watch::condition::dump_status;
use crate::watch::poll::{poll_until, Attempt, PollOutcome, WaitOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Delete `target` and wait until reads report it gone
#[instrument(skip(query, target), fields(target = %target))]
pub async fn cleanup(query: &dyn ResourceQuery, target: &ResourceRef) -> Result<()> {
    query.delete(target).await?;

    let options = WaitOptions::new(
        Duration::from_secs(CLEANUP_INTERVAL_SECS),
        Duration::from_secs(CLEANUP_TIMEOUT_SECS),
    );
    let outcome = poll_until(&options, || async move {
        match query.read(target, &FieldPath::field("metadata.name")).await {
            Err(HarnessError::ResourceNotFound { .. }) => Attempt::Done(()),
            Err(e) => Attempt::Pending(format!("error is {}", e)),
            Ok(_) => Attempt::Pending(format!("{} still exists", target)),
        }
    })
    .await;

    match outcome {
        PollOutcome::Observed(()) => {
            info!("{} is gone", target);
            Ok(())
        }
        PollOutcome::TimedOut { last, elapsed } => {
            dump_status(query, target).await;
            Err(HarnessError::Timeout {
                condition: format!("deletion of {}", target),
                expected: "not found".to_string(),
                last: last.unwrap_or_default(),
                elapsed,
            })
        }
    }
}

/// Single read that treats an empty value as missing
pub(crate) async fn read_non_empty(
    query: &dyn ResourceQuery,
    target: &ResourceRef,
    path: &FieldPath,
) -> Result<String> {
    let value = query.read(target, path).await?;
    if value.is_empty() {
        dump_status(query, target).await;
        return Err(HarnessError::NotFound(format!("{} of {}", path, target)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::resource::CLUSTER_CATALOG;
    use crate::test_utils::ScriptedQuery;

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_waits_until_gone() {
        let target = CLUSTER_CATALOG.named("catalog-1");
        let name = FieldPath::field("metadata.name");
        let query = ScriptedQuery::new()
            .on_read("catalog-1", name.clone(), &["catalog-1", "catalog-1"])
            .on_read_error("catalog-1", name.clone(), "connection reset")
            .on_read_missing("catalog-1", name.clone());

        cleanup(&query, &target).await.unwrap();
        assert_eq!(query.calls()[0], "delete clustercatalogs/catalog-1");
        assert_eq!(query.read_count(&target, &name), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_times_out_while_object_remains() {
        let query = ScriptedQuery::new().on_read(
            "catalog-1",
            FieldPath::field("metadata.name"),
            &["catalog-1"],
        );

        let err = cleanup(&query, &CLUSTER_CATALOG.named("catalog-1"))
            .await
            .unwrap_err();
        match err {
            HarnessError::Timeout { elapsed, .. } => {
                assert!(elapsed >= Duration::from_secs(CLEANUP_TIMEOUT_SECS))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_of_missing_object() {
        let query = ScriptedQuery::new();
        cleanup(&query, &CLUSTER_CATALOG.named("gone")).await.unwrap();
        assert_eq!(
            query.calls(),
            vec![
                "delete clustercatalogs/gone",
                "read clustercatalogs/gone {.metadata.name}"
            ]
        );
    }

    #[tokio::test]
    async fn test_read_non_empty() {
        let path = FieldPath::field("status.urls.base");
        let query = ScriptedQuery::new()
            .on_read("full", path.clone(), &["https://host"])
            .on_read("empty", path.clone(), &[""]);

        assert_eq!(
            read_non_empty(&query, &CLUSTER_CATALOG.named("full"), &path).await.unwrap(),
            "https://host"
        );
        assert!(matches!(
            read_non_empty(&query, &CLUSTER_CATALOG.named("empty"), &path).await,
            Err(HarnessError::NotFound(_))
        ));
    }
}
