// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! catalogd content: fetch, decode and query file-based catalog records.

pub mod decode;
pub mod fetch;
pub mod query;
pub mod types;

pub use decode::{decode, CatalogRecord, RecordKind, SchemaFilter};
pub use fetch::fetch_content;
pub use types::{
    BundleRecord, ChannelEntry, ChannelRecord, ContentSnapshot, DeprecationEntry,
    DeprecationRecord, DeprecationReference, PackageRecord, RelatedImage,
};
