// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Download of a catalog's served content over HTTPS

use crate::config::ProxyConfig;
use crate::error::Result;
use bytes::Bytes;
use tracing::{debug, info, instrument};
use url::Url;

/// GET the catalog content at `url`.
///
/// Certificate verification is off: catalogd routes are served with
/// cluster-internal certificates. With no proxy configured the request goes
/// direct, regardless of the process environment.
#[instrument(skip(proxy))]
pub async fn fetch_content(url: &str, proxy: &ProxyConfig) -> Result<Bytes> {
    let url = Url::parse(url)?;

    let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(true);
    builder = match &proxy.url {
        Some(proxy_url) => {
            info!("take proxy to access cluster");
            builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?)
        }
        None => builder.no_proxy(),
    };
    let client = builder.build()?;

    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    debug!("fetched {} bytes of catalog content", body.len());
    Ok(body)
}
