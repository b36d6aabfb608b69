// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource kinds the harness drives, and references to single objects

use kube::core::{ApiResource, GroupVersionKind};
use std::fmt;

/// Static description of a Kubernetes resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,
}

impl ResourceKind {
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(self.group, self.version, self.kind);
        ApiResource::from_gvk_with_plural(&gvk, self.plural)
    }

    /// Reference a named object of this kind
    pub fn named(&self, name: impl Into<String>) -> ResourceRef {
        ResourceRef {
            kind: *self,
            name: name.into(),
            namespace: None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.plural)
        } else {
            write!(f, "{}.{}", self.plural, self.group)
        }
    }
}

pub const CLUSTER_CATALOG: ResourceKind = ResourceKind {
    group: "olm.operatorframework.io",
    version: "v1",
    kind: "ClusterCatalog",
    plural: "clustercatalogs",
    namespaced: false,
};

pub const CLUSTER_EXTENSION: ResourceKind = ResourceKind {
    group: "olm.operatorframework.io",
    version: "v1",
    kind: "ClusterExtension",
    plural: "clusterextensions",
    namespaced: false,
};

pub const MACHINE_CONFIG_POOL: ResourceKind = ResourceKind {
    group: "machineconfiguration.openshift.io",
    version: "v1",
    kind: "MachineConfigPool",
    plural: "machineconfigpools",
    namespaced: false,
};

pub const IMAGE_DIGEST_MIRROR_SET: ResourceKind = ResourceKind {
    group: "config.openshift.io",
    version: "v1",
    kind: "ImageDigestMirrorSet",
    plural: "imagedigestmirrorsets",
    namespaced: false,
};

pub const IMAGE_TAG_MIRROR_SET: ResourceKind = ResourceKind {
    group: "config.openshift.io",
    version: "v1",
    kind: "ImageTagMirrorSet",
    plural: "imagetagmirrorsets",
    namespaced: false,
};

/// Pre-GA OLM v1 operator API
pub const OPERATOR: ResourceKind = ResourceKind {
    group: "operators.operatorframework.io",
    version: "v1alpha1",
    kind: "Operator",
    plural: "operators",
    namespaced: false,
};

/// Pre-GA rukpak bundle deployment API
pub const BUNDLE_DEPLOYMENT: ResourceKind = ResourceKind {
    group: "core.rukpak.io",
    version: "v1alpha1",
    kind: "BundleDeployment",
    plural: "bundledeployments",
    namespaced: false,
};

pub const ROUTE: ResourceKind = ResourceKind {
    group: "route.openshift.io",
    version: "v1",
    kind: "Route",
    plural: "routes",
    namespaced: true,
};

/// A single named object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
}

impl ResourceRef {
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{} -n {}", self.kind.plural, self.name, ns),
            None => write!(f, "{}/{}", self.kind.plural, self.name),
        }
    }
}
