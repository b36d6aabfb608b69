// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `ResourceQuery` backed by a live Kubernetes API server

use crate::constants::{DEFAULT_NAMESPACE, FIELD_MANAGER};
use crate::error::{HarnessError, Result};
use crate::kubernetes::query::{FieldPath, ResourceQuery};
use crate::kubernetes::resource::{ResourceKind, ResourceRef};
use crate::kubernetes::template::{self, TemplateParams};
use async_trait::async_trait;
use http::StatusCode;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, DynamicObject, ListParams, ObjectMeta, Patch, PatchParams, PostParams},
    core::GroupVersionKind,
    discovery::{self, Scope},
    Api, Client, ResourceExt,
};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Dynamic-object gateway over a `kube::Client`
#[derive(Clone)]
pub struct KubeQuery {
    client: Client,
}

impl KubeQuery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the inferred kubeconfig or in-cluster config
    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(Client::try_default().await?))
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match (kind.namespaced, namespace) {
            (true, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &ar),
            (true, None) => Api::default_namespaced_with(self.client.clone(), &ar),
            (false, _) => Api::all_with(self.client.clone(), &ar),
        }
    }

    /// Parse a rendered object and find the API serving its apiVersion/kind
    async fn object_api(&self, object: Value) -> Result<(Api<DynamicObject>, DynamicObject)> {
        let object: DynamicObject = serde_json::from_value(object).map_err(|e| {
            HarnessError::TemplateError(format!("rendered object is not a Kubernetes object: {}", e))
        })?;
        let Some(types) = object.types.as_ref() else {
            return Err(HarnessError::TemplateError(format!(
                "object {} has no apiVersion/kind",
                object.name_any()
            )));
        };
        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", types.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &types.kind);
        let (ar, caps) = discovery::pinned_kind(&self.client, &gvk).await?;

        let api = match caps.scope {
            Scope::Namespaced => {
                let namespace = object
                    .namespace()
                    .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
                Api::namespaced_with(self.client.clone(), &namespace, &ar)
            }
            Scope::Cluster => Api::all_with(self.client.clone(), &ar),
        };
        Ok((api, object))
    }

    /// Server-side apply one rendered object
    async fn apply_object(&self, object: Value) -> Result<()> {
        let (api, object) = self.object_api(object).await?;
        let name = object.name_any();
        let pp = PatchParams::apply(FIELD_MANAGER).force();
        api.patch(&name, &pp, &Patch::Apply(&object)).await?;
        info!("Applied {}", describe(&object));
        Ok(())
    }

    /// Delete one rendered object, treating an already missing one as deleted
    async fn delete_object(&self, object: Value) -> Result<()> {
        let (api, object) = self.object_api(object).await?;
        match api.delete(&object.name_any(), &DeleteParams::default()).await {
            Ok(_) => {
                info!("Deleted {}", describe(&object));
                Ok(())
            }
            Err(e) if is_not_found(&e) => {
                debug!("{} already gone", describe(&object));
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn render_manifest(manifest: &Path, params: &TemplateParams) -> Result<Vec<Value>> {
    let text = tokio::fs::read_to_string(manifest).await.map_err(|e| {
        HarnessError::TemplateError(format!("failed to read {}: {}", manifest.display(), e))
    })?;
    template::render(&text, params)
}

fn describe(object: &DynamicObject) -> String {
    let kind = object.types.as_ref().map_or("object", |t| t.kind.as_str());
    format!("{} {}", kind, object.name_any())
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == StatusCode::NOT_FOUND.as_u16())
}

#[async_trait]
impl ResourceQuery for KubeQuery {
    #[instrument(skip(self, target, path), fields(target = %target, path = %path))]
    async fn read(&self, target: &ResourceRef, path: &FieldPath) -> Result<String> {
        let api = self.api(&target.kind, target.namespace.as_deref());
        match api.get(&target.name).await {
            Ok(object) => {
                let value = serde_json::to_value(&object)
                    .map_err(|e| HarnessError::QueryError(e.to_string()))?;
                Ok(path.resolve(&value))
            }
            Err(e) if is_not_found(&e) => Err(HarnessError::ResourceNotFound {
                kind: target.kind.to_string(),
                name: target.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_names(&self, kind: &ResourceKind, namespace: Option<&str>) -> Result<Vec<String>> {
        let list = self.api(kind, namespace).list(&ListParams::default()).await?;
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }

    #[instrument(skip(self, target, merge_patch), fields(target = %target))]
    async fn patch(&self, target: &ResourceRef, merge_patch: &Value) -> Result<()> {
        let api = self.api(&target.kind, target.namespace.as_deref());
        api.patch(&target.name, &PatchParams::default(), &Patch::Merge(merge_patch))
            .await?;
        debug!("Patched {}", target);
        Ok(())
    }

    #[instrument(skip(self, manifest, params), fields(template = %manifest.display()))]
    async fn apply(&self, manifest: &Path, params: &TemplateParams) -> Result<()> {
        for object in render_manifest(manifest, params).await? {
            self.apply_object(object).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, manifest, params), fields(template = %manifest.display()))]
    async fn delete_manifest(&self, manifest: &Path, params: &TemplateParams) -> Result<()> {
        for object in render_manifest(manifest, params).await? {
            self.delete_object(object).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        match namespaces.get(namespace).await {
            Ok(_) => {
                debug!("Namespace {} already exists", namespace);
                Ok(())
            }
            Err(e) if is_not_found(&e) => {
                info!("Creating namespace {}", namespace);
                let ns = Namespace {
                    metadata: ObjectMeta {
                        name: Some(namespace.to_string()),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                namespaces.create(&PostParams::default(), &ns).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, target), fields(target = %target))]
    async fn delete(&self, target: &ResourceRef) -> Result<()> {
        let api = self.api(&target.kind, target.namespace.as_deref());
        match api.delete(&target.name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("Deleted {}", target);
                Ok(())
            }
            Err(e) if is_not_found(&e) => {
                debug!("{} already gone", target);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
