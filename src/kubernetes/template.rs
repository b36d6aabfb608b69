// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest template rendering.
//!
//! Templates are YAML files, possibly multi-document. `${KEY}` inside any
//! string is replaced by the parameter value, and a string that is exactly
//! `${{KEY}}` is replaced by the parameter parsed as a YAML scalar. A
//! document of kind `Template` contributes its `parameters` defaults and
//! expands to its `objects`. Unknown parameters are ignored.

use crate::error::{HarnessError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `KEY=value` parameters for a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
    values: BTreeMap<String, String>,
}

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Set `key` only when `value` is non-empty, leaving the template default in place otherwise
    pub fn set_if_present(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.set(key, value)
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Render `text` into the list of objects it describes
pub fn render(text: &str, params: &TemplateParams) -> Result<Vec<Value>> {
    let mut objects = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        if value.get("kind").and_then(Value::as_str) == Some("Template") {
            let merged = with_defaults(&value, params);
            let items = value
                .get("objects")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for item in items {
                objects.push(substitute(item, &merged)?);
            }
        } else {
            objects.push(substitute(value, params)?);
        }
    }

    if objects.is_empty() {
        return Err(HarnessError::TemplateError(
            "template does not contain any objects".to_string(),
        ));
    }
    Ok(objects)
}

fn with_defaults(template: &Value, params: &TemplateParams) -> TemplateParams {
    let defaults = template
        .get("parameters")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|p| {
            let name = p.get("name")?.as_str()?;
            let value = p.get("value")?.as_str()?;
            Some((name.to_string(), value.to_string()))
        });

    let mut merged = TemplateParams::new();
    for (name, value) in defaults {
        merged = merged.set(&name, value);
    }
    for (name, value) in params.iter() {
        merged = merged.set(name, value);
    }
    merged
}

fn substitute(value: Value, params: &TemplateParams) -> Result<Value> {
    match value {
        Value::String(s) => substitute_string(s, params),
        Value::Array(items) => items
            .into_iter()
            .map(|item| substitute(item, params))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| Ok((replace_placeholders(k, params), substitute(v, params)?)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

fn substitute_string(s: String, params: &TemplateParams) -> Result<Value> {
    if let Some(key) = s.strip_prefix("${{").and_then(|rest| rest.strip_suffix("}}")) {
        if let Some(raw) = params.get(key) {
            return Ok(serde_yaml::from_str(raw)?);
        }
    }

    Ok(Value::String(replace_placeholders(s, params)))
}

fn replace_placeholders(s: String, params: &TemplateParams) -> String {
    if !s.contains("${") {
        return s;
    }
    params
        .iter()
        .fold(s, |acc, (key, value)| acc.replace(&format!("${{{}}}", key), value))
}
