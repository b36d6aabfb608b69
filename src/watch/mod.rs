// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Eventually-consistent waits on resource status fields.

pub mod condition;
pub mod fleet;
pub mod poll;

pub use condition::{
    assert_consistent, matches, wait_and_hold, wait_for_condition, wait_for_field,
    wait_for_substring, ConditionQuery, Consistency,
};
pub use fleet::{assert_pool_condition, fleet_healthy, wait_for_fleet_healthy, PoolStatus};
pub use poll::{EmptyPolicy, PollOutcome, PollStart, WaitOptions};
