// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The resource-query capability the watcher and lifecycle helpers run against

use crate::error::Result;
use crate::kubernetes::resource::{ResourceKind, ResourceRef};
use crate::kubernetes::template::TemplateParams;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Location of a single value inside an object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    /// `field` of the entry in `status.conditions` whose `type` is `condition_type`
    Condition {
        condition_type: String,
        field: String,
    },
    /// Dotted path from the object root, e.g. `status.install.bundle.name`
    Field(String),
}

impl FieldPath {
    pub fn condition(condition_type: impl Into<String>, field: impl Into<String>) -> Self {
        FieldPath::Condition {
            condition_type: condition_type.into(),
            field: field.into(),
        }
    }

    /// `status` of the named condition
    pub fn condition_status(condition_type: impl Into<String>) -> Self {
        Self::condition(condition_type, "status")
    }

    pub fn field(path: impl Into<String>) -> Self {
        FieldPath::Field(path.into())
    }

    /// Resolve this path against a JSON object.
    ///
    /// Absent values resolve to an empty string, the same way a kubectl
    /// jsonpath read prints nothing for a missing field.
    pub fn resolve(&self, object: &Value) -> String {
        let found = match self {
            FieldPath::Condition {
                condition_type,
                field,
            } => object
                .pointer("/status/conditions")
                .and_then(Value::as_array)
                .and_then(|conditions| {
                    conditions
                        .iter()
                        .find(|c| c.get("type").and_then(Value::as_str) == Some(condition_type.as_str()))
                })
                .and_then(|c| c.get(field)),
            FieldPath::Field(path) => path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .try_fold(object, |value, segment| value.get(segment)),
        };
        found.map(render).unwrap_or_default()
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Condition {
                condition_type,
                field,
            } => write!(
                f,
                "{{.status.conditions[?(@.type==\"{}\")].{}}}",
                condition_type, field
            ),
            FieldPath::Field(path) => write!(f, "{{.{}}}", path.trim_start_matches('.')),
        }
    }
}

/// Gateway to the cluster.
///
/// Reads return the resolved value as text. A read of an existing object
/// whose field is absent succeeds with an empty string; a read of a missing
/// object fails with [`HarnessError::ResourceNotFound`](crate::error::HarnessError::ResourceNotFound).
#[async_trait]
pub trait ResourceQuery: Send + Sync {
    async fn read(&self, target: &ResourceRef, path: &FieldPath) -> Result<String>;

    async fn list_names(&self, kind: &ResourceKind, namespace: Option<&str>) -> Result<Vec<String>>;

    async fn patch(&self, target: &ResourceRef, merge_patch: &Value) -> Result<()>;

    /// Render a manifest template with `params` and apply every object in it
    async fn apply(&self, template: &Path, params: &TemplateParams) -> Result<()>;

    /// Render a manifest template with `params` and delete every object in it
    async fn delete_manifest(&self, template: &Path, params: &TemplateParams) -> Result<()>;

    /// Create `namespace` unless it already exists
    async fn ensure_namespace(&self, namespace: &str) -> Result<()>;

    /// Delete an object. Deleting an object that is already gone succeeds.
    async fn delete(&self, target: &ResourceRef) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Value {
        json!({
            "metadata": {"name": "my-catalog"},
            "status": {
                "conditions": [
                    {"type": "Progressing", "status": "True", "reason": "Succeeded"},
                    {"type": "Serving", "status": "True", "reason": "Available", "message": ""}
                ],
                "urls": {"base": "https://catalogd-service.openshift-catalogd.svc/catalogs/my-catalog"},
                "machineCount": 3
            }
        })
    }

    #[test]
    fn test_resolve_condition_field() {
        let obj = catalog();
        assert_eq!(FieldPath::condition_status("Serving").resolve(&obj), "True");
        assert_eq!(FieldPath::condition("Progressing", "reason").resolve(&obj), "Succeeded");
    }

    #[test]
    fn test_resolve_missing_condition_is_empty() {
        let obj = catalog();
        assert_eq!(FieldPath::condition_status("Installed").resolve(&obj), "");
        assert_eq!(FieldPath::condition("Serving", "message").resolve(&obj), "");
    }

    #[test]
    fn test_resolve_dotted_field() {
        let obj = catalog();
        assert_eq!(
            FieldPath::field("status.urls.base").resolve(&obj),
            "https://catalogd-service.openshift-catalogd.svc/catalogs/my-catalog"
        );
        assert_eq!(FieldPath::field("status.machineCount").resolve(&obj), "3");
        assert_eq!(FieldPath::field("status.install.bundle.name").resolve(&obj), "");
    }

    #[test]
    fn test_resolve_object_renders_json() {
        let obj = json!({"status": {"urls": {"base": "x"}}});
        assert_eq!(FieldPath::field("status").resolve(&obj), r#"{"urls":{"base":"x"}}"#);
    }

    #[test]
    fn test_display_as_jsonpath() {
        assert_eq!(
            FieldPath::condition("Progressing", "reason").to_string(),
            r#"{.status.conditions[?(@.type=="Progressing")].reason}"#
        );
        assert_eq!(FieldPath::field("spec.host").to_string(), "{.spec.host}");
    }
}
