// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster access: resource kinds, field reads, template rendering and the
//! kube-backed query gateway.

pub mod client;
pub mod query;
pub mod resource;
pub mod template;

pub use client::KubeQuery;
pub use query::{FieldPath, ResourceQuery};
pub use resource::{ResourceKind, ResourceRef};
pub use template::TemplateParams;
