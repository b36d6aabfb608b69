// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Newline-delimited catalog content decoding.
//!
//! Every line is one JSON object tagged with a `schema` field. Lines are
//! pre-filtered on the raw text `"schema":"olm.<kind>"` and then dispatched
//! on the object's own top-level `schema`, so a nested payload that happens
//! to contain the marker text is never decoded as the wrong record.

use crate::catalog::types::{
    BundleRecord, ChannelRecord, ContentSnapshot, DeprecationRecord, PackageRecord,
};
use crate::error::{HarnessError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The four record schemas of a file-based catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Package,
    Channel,
    Bundle,
    Deprecations,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Package,
        RecordKind::Channel,
        RecordKind::Bundle,
        RecordKind::Deprecations,
    ];

    pub fn schema(&self) -> &'static str {
        match self {
            RecordKind::Package => "olm.package",
            RecordKind::Channel => "olm.channel",
            RecordKind::Bundle => "olm.bundle",
            RecordKind::Deprecations => "olm.deprecations",
        }
    }

    pub fn from_schema(schema: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.schema() == schema)
    }

    /// Raw text that marks a line as possibly holding this kind
    fn marker(&self) -> String {
        format!("\"schema\":\"{}\"", self.schema())
    }

    /// Collection name used in "can not get ..." errors
    fn collection(&self) -> &'static str {
        match self {
            RecordKind::Package => "Packages",
            RecordKind::Channel => "Channels",
            RecordKind::Bundle => "Bundles",
            RecordKind::Deprecations => "Deprecations",
        }
    }
}

/// Which record kinds a decode keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaFilter {
    #[default]
    All,
    Only(RecordKind),
}

impl SchemaFilter {
    pub fn wants(&self, kind: RecordKind) -> bool {
        match self {
            SchemaFilter::All => true,
            SchemaFilter::Only(only) => *only == kind,
        }
    }

    fn kinds(&self) -> Vec<RecordKind> {
        RecordKind::ALL
            .into_iter()
            .filter(|kind| self.wants(*kind))
            .collect()
    }
}

impl FromStr for SchemaFilter {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SchemaFilter::All),
            "package" => Ok(SchemaFilter::Only(RecordKind::Package)),
            "channel" => Ok(SchemaFilter::Only(RecordKind::Channel)),
            "bundle" => Ok(SchemaFilter::Only(RecordKind::Bundle)),
            "deprecations" => Ok(SchemaFilter::Only(RecordKind::Deprecations)),
            other => Err(HarnessError::UnsupportedSchema(other.to_string())),
        }
    }
}

impl fmt::Display for SchemaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFilter::All => write!(f, "all"),
            SchemaFilter::Only(kind) => {
                write!(f, "{}", kind.schema().trim_start_matches("olm."))
            }
        }
    }
}

/// One decoded catalog line
#[derive(Debug, Clone)]
pub enum CatalogRecord {
    Package(PackageRecord),
    Channel(ChannelRecord),
    Bundle(BundleRecord),
    Deprecations(DeprecationRecord),
}

impl CatalogRecord {
    fn parse(kind: RecordKind, line: &str) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::Package => CatalogRecord::Package(serde_json::from_str(line)?),
            RecordKind::Channel => CatalogRecord::Channel(serde_json::from_str(line)?),
            RecordKind::Bundle => CatalogRecord::Bundle(serde_json::from_str(line)?),
            RecordKind::Deprecations => CatalogRecord::Deprecations(serde_json::from_str(line)?),
        })
    }
}

impl ContentSnapshot {
    fn push(&mut self, record: CatalogRecord) {
        match record {
            CatalogRecord::Package(r) => self.packages.push(r),
            CatalogRecord::Channel(r) => self.channels.push(r),
            CatalogRecord::Bundle(r) => self.bundles.push(r),
            CatalogRecord::Deprecations(r) => self.deprecations.push(r),
        }
    }

    fn len_of(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Package => self.packages.len(),
            RecordKind::Channel => self.channels.len(),
            RecordKind::Bundle => self.bundles.len(),
            RecordKind::Deprecations => self.deprecations.len(),
        }
    }
}

#[derive(Deserialize)]
struct SchemaProbe {
    #[serde(default)]
    schema: String,
}

/// Decode catalog content into a snapshot holding the kinds `filter` wants.
///
/// Invalid JSON on a candidate line aborts the decode. An empty result is an
/// error: for a single kind when that collection is empty, for
/// [`SchemaFilter::All`] only when all four are.
pub fn decode(raw: &[u8], filter: SchemaFilter) -> Result<ContentSnapshot> {
    let kinds = filter.kinds();
    let markers: Vec<String> = kinds.iter().map(RecordKind::marker).collect();
    let text = String::from_utf8_lossy(raw);
    let mut snapshot = ContentSnapshot::default();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if !markers.iter().any(|marker| line.contains(marker.as_str())) {
            continue;
        }

        let probe: SchemaProbe = serde_json::from_str(line)
            .map_err(|source| HarnessError::DecodeError { line: line_no, source })?;
        let Some(kind) = RecordKind::from_schema(&probe.schema).filter(|k| filter.wants(*k))
        else {
            debug!(
                "skip line {}: schema {:?} only matched inside a nested value",
                line_no, probe.schema
            );
            continue;
        };

        let record = CatalogRecord::parse(kind, line)
            .map_err(|source| HarnessError::DecodeError { line: line_no, source })?;
        snapshot.push(record);
    }

    match filter {
        SchemaFilter::Only(kind) if snapshot.len_of(kind) == 0 => {
            Err(HarnessError::NotFound(kind.collection().to_string()))
        }
        SchemaFilter::All if snapshot.is_empty() => Err(HarnessError::NotFound(
            "any bundle, channel, package or deprecation".to_string(),
        )),
        _ => Ok(snapshot),
    }
}
