// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Condition watcher: wait for a status field to reach a value, then
//! optionally make sure it stays there.

use crate::constants::poll::CONSISTENCY_INTERVAL_SECS;
use crate::error::{HarnessError, Result};
use crate::kubernetes::{FieldPath, ResourceQuery, ResourceRef};
use crate::watch::poll::{poll_until, Attempt, EmptyPolicy, PollOutcome, WaitOptions};
use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

/// A status field on one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionQuery {
    pub target: ResourceRef,
    pub path: FieldPath,
}

impl ConditionQuery {
    pub fn new(target: ResourceRef, path: FieldPath) -> Self {
        Self { target, path }
    }
}

impl fmt::Display for ConditionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.path)
    }
}

/// Post-success window during which the value must keep matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    pub duration: Duration,
    pub interval: Duration,
}

impl Consistency {
    /// Skip the consistency phase
    pub fn none() -> Self {
        Self::for_duration(Duration::ZERO)
    }

    /// Hold for `duration`, sampling at the default interval
    pub fn for_duration(duration: Duration) -> Self {
        Self {
            duration,
            interval: Duration::from_secs(CONSISTENCY_INTERVAL_SECS),
        }
    }

    pub fn for_secs(secs: u64) -> Self {
        Self::for_duration(Duration::from_secs(secs))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_none(&self) -> bool {
        self.duration.is_zero()
    }
}

/// Condition matching rule: case-insensitive substring containment.
///
/// This is intentionally not equality. `matches("falsely", "False")` is true,
/// and an empty `expected` matches everything.
pub fn matches(observed: &str, expected: &str) -> bool {
    observed.to_lowercase().contains(&expected.to_lowercase())
}

/// Read the full `.status` of `target` and log it. Used right before a
/// timeout is surfaced so the failure report shows what the object looked like.
pub async fn dump_status(query: &dyn ResourceQuery, target: &ResourceRef) {
    match query.read(target, &FieldPath::field("status")).await {
        Ok(status) => warn!("{} status: {}", target, status),
        Err(e) => warn!("could not read status of {}: {}", target, e),
    }
}

/// Shared wait loop: read `condition` until `accept` says the value is good.
async fn wait_until<A>(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    expected: &str,
    options: &WaitOptions,
    accept: A,
) -> Result<String>
where
    A: Fn(&str) -> bool,
{
    let accept = &accept;
    let outcome = poll_until(options, || async move {
        match query.read(&condition.target, &condition.path).await {
            Err(e) => Attempt::Pending(format!("error is {}", e)),
            Ok(value) if value.is_empty() && options.empty == EmptyPolicy::Retry => {
                Attempt::Pending("output is empty".to_string())
            }
            Ok(value) if accept(&value) => Attempt::Done(value),
            Ok(value) => Attempt::Pending(format!("got {:?}, not {:?}", value, expected)),
        }
    })
    .await;

    match outcome {
        PollOutcome::Observed(value) => Ok(value),
        PollOutcome::TimedOut { last, elapsed } => {
            dump_status(query, &condition.target).await;
            Err(HarnessError::Timeout {
                condition: condition.to_string(),
                expected: expected.to_string(),
                last: last.unwrap_or_else(|| "nothing".to_string()),
                elapsed,
            })
        }
    }
}

/// Poll `condition` until it case-insensitively contains `expected`.
///
/// Read failures are transient and retried. Returns the matching value.
#[instrument(skip(query, condition, options), fields(condition = %condition))]
pub async fn wait_for_condition(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    expected: &str,
    options: &WaitOptions,
) -> Result<String> {
    let value = wait_until(query, condition, expected, options, |value| {
        matches(value, expected)
    })
    .await?;
    debug!("{} is {:?}", condition, value);
    Ok(value)
}

/// Like [`wait_for_condition`], but the substring match is case-sensitive
#[instrument(skip(query, condition, options), fields(condition = %condition))]
pub async fn wait_for_substring(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    expected: &str,
    options: &WaitOptions,
) -> Result<String> {
    wait_until(query, condition, expected, options, |value| value.contains(expected)).await
}

/// Poll until `condition` can be read at all and return whatever it holds
#[instrument(skip(query, condition, options), fields(condition = %condition))]
pub async fn wait_for_field(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    options: &WaitOptions,
) -> Result<String> {
    wait_until(query, condition, "a value", options, |_| true).await
}

/// Sample `condition` for `consistency.duration` and fail on the first sample
/// that does not contain `expected`.
///
/// A read error counts as a failed sample. No sample is taken once the window
/// has closed. A zero duration does nothing.
#[instrument(skip(query, condition, consistency), fields(condition = %condition))]
pub async fn assert_consistent(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    expected: &str,
    consistency: &Consistency,
) -> Result<()> {
    if consistency.is_none() {
        return Ok(());
    }
    info!(
        "make sure {} is {} consistently for {:?}",
        condition, expected, consistency.duration
    );

    let started = Instant::now();
    let mut sample = 0;
    loop {
        sample += 1;
        let observed = match query.read(&condition.target, &condition.path).await {
            Ok(value) if matches(&value, expected) => None,
            Ok(value) => Some(value),
            Err(e) => Some(format!("read failed: {}", e)),
        };
        if let Some(observed) = observed {
            return Err(HarnessError::Regression {
                condition: condition.to_string(),
                expected: expected.to_string(),
                observed,
                sample,
            });
        }

        let remaining = consistency.duration.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(());
        }
        sleep(consistency.interval.min(remaining)).await;
        if started.elapsed() >= consistency.duration {
            return Ok(());
        }
    }
}

/// Wait for `expected`, then hold it for `consistency`
pub async fn wait_and_hold(
    query: &dyn ResourceQuery,
    condition: &ConditionQuery,
    expected: &str,
    options: &WaitOptions,
    consistency: &Consistency,
) -> Result<String> {
    let value = wait_for_condition(query, condition, expected, options).await?;
    assert_consistent(query, condition, expected, consistency).await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::resource::CLUSTER_EXTENSION;
    use crate::test_utils::ScriptedQuery;

    fn installed() -> ConditionQuery {
        ConditionQuery::new(
            CLUSTER_EXTENSION.named("ext"),
            FieldPath::condition_status("Installed"),
        )
    }

    fn fast() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(10), Duration::from_millis(100))
    }

    #[test]
    fn test_matches_is_case_insensitive_substring() {
        assert!(matches("True", "true"));
        assert!(matches("TRUE", "True"));
        assert!(matches("falsely", "False"));
        assert!(matches("Succeeded", "succeed"));
        assert!(matches("anything", ""));
        assert!(!matches("False", "True"));
        assert!(!matches("", "True"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_reads_once() {
        let query = ScriptedQuery::new().on_read("ext", installed().path, &["True"]);
        let started = Instant::now();

        let value = wait_for_condition(&query, &installed(), "true", &fast().immediately())
            .await
            .unwrap();

        assert_eq!(value, "True");
        assert_eq!(query.read_count(&installed().target, &installed().path), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_immediately_waits_one_interval() {
        let query = ScriptedQuery::new().on_read("ext", installed().path, &["True"]);
        let started = Instant::now();

        wait_for_condition(&query, &installed(), "True", &fast())
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_errors_are_retried() {
        let query = ScriptedQuery::new()
            .on_read_error("ext", installed().path, "connection refused")
            .on_read("ext", installed().path, &["", "False", "True"]);

        let value = wait_for_condition(&query, &installed(), "True", &fast().immediately())
            .await
            .unwrap();

        assert_eq!(value, "True");
        assert_eq!(query.read_count(&installed().target, &installed().path), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_instead_of_hanging() {
        let query = ScriptedQuery::new().on_read("ext", installed().path, &["False"]);

        let err = wait_for_condition(&query, &installed(), "True", &fast())
            .await
            .unwrap_err();

        match err {
            HarnessError::Timeout {
                condition,
                expected,
                last,
                elapsed,
            } => {
                assert!(condition.contains("Installed"));
                assert_eq!(expected, "True");
                assert!(last.contains("False"));
                assert!(elapsed >= Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // status dumped for diagnostics before failing
        assert!(query
            .calls()
            .last()
            .is_some_and(|c| c.ends_with("{.status}")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_read_is_retried_by_default() {
        let query = ScriptedQuery::new().on_read(
            "ext",
            FieldPath::condition("Installed", "message"),
            &[""],
        );
        let condition = ConditionQuery::new(
            CLUSTER_EXTENSION.named("ext"),
            FieldPath::condition("Installed", "message"),
        );

        let result = wait_for_field(&query, &condition, &fast()).await;
        match result {
            Err(HarnessError::Timeout { expected, last, .. }) => {
                assert_eq!(expected, "a value");
                assert_eq!(last, "output is empty");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_allow_empty_accepts_empty_read() {
        let path = FieldPath::condition("Installed", "message");
        let query = ScriptedQuery::new().on_read("ext", path.clone(), &[""]);
        let condition = ConditionQuery::new(CLUSTER_EXTENSION.named("ext"), path);

        let value = wait_for_field(&query, &condition, &fast().allow_empty())
            .await
            .unwrap();
        assert_eq!(value, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_substring_wait_is_case_sensitive() {
        let path = FieldPath::condition("Progressing", "message");
        let query = ScriptedQuery::new().on_read(
            "ext",
            path.clone(),
            &["Error: NO BUNDLES found", "error: no bundles found for package"],
        );
        let condition = ConditionQuery::new(CLUSTER_EXTENSION.named("ext"), path.clone());

        let value = wait_for_substring(&query, &condition, "no bundles found", &fast())
            .await
            .unwrap();
        assert_eq!(value, "error: no bundles found for package");
        assert_eq!(query.read_count(&condition.target, &path), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consistency_fails_on_first_regression() {
        let query =
            ScriptedQuery::new().on_read("ext", installed().path, &["True", "True", "False", "True"]);
        let hold = Consistency::for_duration(Duration::from_millis(100))
            .with_interval(Duration::from_millis(10));

        let err = assert_consistent(&query, &installed(), "True", &hold)
            .await
            .unwrap_err();

        match err {
            HarnessError::Regression {
                observed, sample, ..
            } => {
                assert_eq!(observed, "False");
                assert_eq!(sample, 3);
            }
            other => panic!("expected regression, got {:?}", other),
        }
        assert_eq!(query.read_count(&installed().target, &installed().path), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consistency_read_error_fails_fast() {
        let query = ScriptedQuery::new()
            .on_read("ext", installed().path, &["True"])
            .on_read_error("ext", installed().path, "timeout")
            .on_read("ext", installed().path, &["True"]);
        let hold = Consistency::for_duration(Duration::from_millis(100))
            .with_interval(Duration::from_millis(10));

        let err = assert_consistent(&query, &installed(), "True", &hold)
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Regression { sample: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consistency_holds_for_duration() {
        let query = ScriptedQuery::new().on_read("ext", installed().path, &["True"]);
        let hold = Consistency::for_duration(Duration::from_millis(100))
            .with_interval(Duration::from_millis(10));
        let started = Instant::now();

        assert_consistent(&query, &installed(), "true", &hold)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(query.read_count(&installed().target, &installed().path), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consistency_stops_at_window_end() {
        // samples at 0, 4 and 8ms; the window closes before a fourth
        let query = ScriptedQuery::new().on_read(
            "ext",
            installed().path,
            &["True", "True", "True", "False"],
        );
        let hold = Consistency::for_duration(Duration::from_millis(10))
            .with_interval(Duration::from_millis(4));
        let started = Instant::now();

        assert_consistent(&query, &installed(), "True", &hold)
            .await
            .unwrap();

        assert_eq!(query.read_count(&installed().target, &installed().path), 3);
        assert!(started.elapsed() < Duration::from_millis(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_skips_consistency() {
        let query = ScriptedQuery::new();
        assert_consistent(&query, &installed(), "True", &Consistency::none())
            .await
            .unwrap();
        assert!(query.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_hold() {
        let query = ScriptedQuery::new().on_read("ext", installed().path, &["False", "True"]);
        let hold = Consistency::for_duration(Duration::from_millis(30))
            .with_interval(Duration::from_millis(10));

        let value = wait_and_hold(&query, &installed(), "True", &fast(), &hold)
            .await
            .unwrap();
        assert_eq!(value, "True");
    }
}
