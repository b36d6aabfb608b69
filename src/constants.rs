// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager used for server-side apply of rendered templates
pub const FIELD_MANAGER: &str = "olmv1-harness";

/// Namespace used for namespaced template objects that do not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Condition polling defaults
pub mod poll {
    /// Interval between reads while waiting for a condition
    pub const INTERVAL_SECS: u64 = 3;
    /// Deadline for a condition wait
    pub const TIMEOUT_SECS: u64 = 150;
    /// Interval between samples inside a consistency window
    pub const CONSISTENCY_INTERVAL_SECS: u64 = 5;
    /// Interval between reads while waiting for a deleted resource to go away
    pub const CLEANUP_INTERVAL_SECS: u64 = 4;
    /// Deadline for a deleted resource to go away
    pub const CLEANUP_TIMEOUT_SECS: u64 = 160;
    /// Deadline for a ClusterExtension Progressing message to appear
    pub const PROGRESSING_MESSAGE_TIMEOUT_SECS: u64 = 60;
    /// Deadline for a ClusterExtension to report an installed version
    pub const VERSION_TIMEOUT_SECS: u64 = 120;
    /// BundleDeployment consistency window and sampling interval
    pub const BUNDLE_DEPLOYMENT_HOLD_SECS: u64 = 10;
    pub const BUNDLE_DEPLOYMENT_HOLD_INTERVAL_SECS: u64 = 4;
}

/// catalogd content serving
pub mod catalogd {
    pub const NAMESPACE: &str = "openshift-catalogd";
    pub const SERVICE: &str = "catalogd-service";
    /// In-cluster host that appears in `status.urls.base`
    pub const SERVICE_HOST: &str = "catalogd-service.openshift-catalogd.svc";
    /// Path appended to the base URL to get every schema at once
    pub const ALL_CONTENT_PATH: &str = "api/v1/all";
    /// Poll interval and deadline while reading the route host
    pub const ROUTE_INTERVAL_SECS: u64 = 2;
    pub const ROUTE_TIMEOUT_SECS: u64 = 10;
}

/// MachineConfigPool fleet
pub mod fleet {
    /// The only pools a healthy fleet may contain
    pub const EXPECTED_POOLS: [&str; 2] = ["master", "worker"];
    /// Poll interval, deadline and hold while pools start rolling out
    pub const ROLLOUT_START_INTERVAL_SECS: u64 = 3;
    pub const ROLLOUT_START_TIMEOUT_SECS: u64 = 120;
    pub const ROLLOUT_START_HOLD_SECS: u64 = 5;
    /// Poll interval while pools roll out a mirror set change
    pub const ROLLOUT_INTERVAL_SECS: u64 = 30;
    /// Deadline for pools to finish rolling out a mirror set change
    pub const ROLLOUT_TIMEOUT_SECS: u64 = 900;
    pub const ROLLOUT_HOLD_SECS: u64 = 10;
    /// Master pool poll interval and hold after a mirror set is removed
    pub const MASTER_REVERT_INTERVAL_SECS: u64 = 90;
    pub const MASTER_REVERT_HOLD_SECS: u64 = 30;
    /// Poll interval while waiting for the fleet to report healthy
    pub const HEALTH_INTERVAL_SECS: u64 = 30;
    /// Deadline for the fleet to report healthy after a rollout
    pub const HEALTH_TIMEOUT_SECS: u64 = 600;
}
