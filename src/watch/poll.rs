// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deadline-bounded polling loop shared by every wait in the harness

use crate::constants::poll::{INTERVAL_SECS, TIMEOUT_SECS};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// When the first read happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStart {
    /// Read right away, before the first interval elapses
    Immediately,
    /// Sleep one interval before the first read
    #[default]
    AfterInterval,
}

/// Whether an empty read can satisfy a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPolicy {
    /// An empty value means "not populated yet" and is retried
    #[default]
    Retry,
    /// An empty value is a real observation and is matched like any other
    Accept,
}

/// Timing and retry behaviour of a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
    pub start: PollStart,
    pub empty: EmptyPolicy,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(INTERVAL_SECS),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            start: PollStart::default(),
            empty: EmptyPolicy::default(),
        }
    }
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            ..Default::default()
        }
    }

    pub fn immediately(mut self) -> Self {
        self.start = PollStart::Immediately;
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.empty = EmptyPolicy::Accept;
        self
    }
}

/// Result of one poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    /// Not satisfied yet; carries a description of what was seen
    Pending(String),
}

/// Result of a whole poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Observed(T),
    TimedOut {
        /// What the last attempt saw, if any attempt ran
        last: Option<String>,
        elapsed: Duration,
    },
}

/// Run `check` on the configured interval until it reports `Done` or the
/// timeout elapses.
///
/// The check always runs at least once, even with a zero timeout. No check
/// starts once the timeout has elapsed, so the last sleep is cut short at the
/// deadline.
pub async fn poll_until<T, F, Fut>(options: &WaitOptions, mut check: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let started = Instant::now();
    let mut last = None;

    if options.start == PollStart::AfterInterval {
        sleep(options.interval.min(options.timeout)).await;
    }

    loop {
        match check().await {
            Attempt::Done(value) => return PollOutcome::Observed(value),
            Attempt::Pending(seen) => {
                debug!("{}, and try next", seen);
                last = Some(seen);
            }
        }

        let remaining = options.timeout.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            sleep(options.interval.min(remaining)).await;
        }
        let elapsed = started.elapsed();
        if elapsed >= options.timeout {
            return PollOutcome::TimedOut { last, elapsed };
        }
    }
}
