// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Order-preserving projections over decoded catalog records

use crate::catalog::decode::RecordKind;
use crate::catalog::types::{BundleRecord, ChannelRecord, DeprecationRecord, PackageRecord};

pub fn bundle_names(bundles: &[BundleRecord]) -> Vec<String> {
    bundles.iter().map(|b| b.name.clone()).collect()
}

pub fn bundle_names_by_package(bundles: &[BundleRecord], package: &str) -> Vec<String> {
    bundles
        .iter()
        .filter(|b| b.package == package)
        .map(|b| b.name.clone())
        .collect()
}

pub fn bundle_images(bundles: &[BundleRecord]) -> Vec<String> {
    bundles.iter().map(|b| b.image.clone()).collect()
}

/// First bundle named `name` in `package`
pub fn find_bundle<'a>(
    bundles: &'a [BundleRecord],
    package: &str,
    name: &str,
) -> Option<&'a BundleRecord> {
    bundles
        .iter()
        .find(|b| b.package == package && b.name == name)
}

pub fn channels_by_package<'a>(channels: &'a [ChannelRecord], package: &str) -> Vec<&'a ChannelRecord> {
    channels.iter().filter(|c| c.package == package).collect()
}

pub fn channel_names_by_package(channels: &[ChannelRecord], package: &str) -> Vec<String> {
    channels
        .iter()
        .filter(|c| c.package == package)
        .map(|c| c.name.clone())
        .collect()
}

pub fn package_names(packages: &[PackageRecord]) -> Vec<String> {
    packages.iter().map(|p| p.name.clone()).collect()
}

fn deprecated_names(deprecations: &[DeprecationRecord], package: &str, kind: RecordKind) -> Vec<String> {
    deprecations
        .iter()
        .filter(|d| d.package == package)
        .flat_map(|d| &d.entries)
        .filter(|e| e.reference.schema == kind.schema())
        .map(|e| e.reference.name.clone())
        .collect()
}

/// Channels of `package` referenced by a deprecation entry
pub fn deprecated_channel_names(deprecations: &[DeprecationRecord], package: &str) -> Vec<String> {
    deprecated_names(deprecations, package, RecordKind::Channel)
}

/// Bundles of `package` referenced by a deprecation entry
pub fn deprecated_bundle_names(deprecations: &[DeprecationRecord], package: &str) -> Vec<String> {
    deprecated_names(deprecations, package, RecordKind::Bundle)
}
