// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test doubles: a scripted `ResourceQuery` and a mock Kubernetes API service.

use crate::error::{HarnessError, Result};
use crate::kubernetes::{FieldPath, ResourceKind, ResourceQuery, ResourceRef, TemplateParams};
use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

#[derive(Clone)]
enum Scripted {
    Value(String),
    Error(String),
    Missing,
}

type Script = VecDeque<Scripted>;

/// A `ResourceQuery` that replays scripted read results.
///
/// Each (object name, field path) pair has its own queue. Reads pop from the
/// queue until one entry is left, which is then returned forever. Every call
/// is recorded so tests can assert on the operations issued.
#[derive(Default)]
pub struct ScriptedQuery {
    reads: Mutex<HashMap<(String, FieldPath), Script>>,
    lists: Mutex<HashMap<&'static str, Vec<String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script successive values for reads of `path` on the object `name`
    pub fn on_read(self, name: &str, path: FieldPath, values: &[&str]) -> Self {
        self.push(name, path, values.iter().map(|v| Scripted::Value(v.to_string())));
        self
    }

    /// Script a read failure, followed by any later scripted values
    pub fn on_read_error(self, name: &str, path: FieldPath, message: &str) -> Self {
        self.push(name, path, std::iter::once(Scripted::Error(message.to_string())));
        self
    }

    /// Script a read of an object that no longer exists
    pub fn on_read_missing(self, name: &str, path: FieldPath) -> Self {
        self.push(name, path, std::iter::once(Scripted::Missing));
        self
    }

    pub fn on_list(self, kind: &ResourceKind, names: &[&str]) -> Self {
        self.lists
            .lock()
            .unwrap()
            .insert(kind.plural, names.iter().map(|n| n.to_string()).collect());
        self
    }

    fn push<I>(&self, name: &str, path: FieldPath, entries: I)
    where
        I: IntoIterator<Item = Scripted>,
    {
        self.reads
            .lock()
            .unwrap()
            .entry((name.to_string(), path))
            .or_default()
            .extend(entries);
    }

    /// Operations issued so far, e.g. `read clustercatalogs/foo {.spec}`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of reads of `path` on `target`
    pub fn read_count(&self, target: &ResourceRef, path: &FieldPath) -> usize {
        let call = format!("read {} {}", target, path);
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceQuery for ScriptedQuery {
    async fn read(&self, target: &ResourceRef, path: &FieldPath) -> Result<String> {
        self.record(format!("read {} {}", target, path));

        let next = {
            let mut reads = self.reads.lock().unwrap();
            match reads.get_mut(&(target.name.clone(), path.clone())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => Some(Scripted::Missing),
            }
        };
        match next {
            Some(Scripted::Value(value)) => Ok(value),
            Some(Scripted::Error(message)) => Err(HarnessError::QueryError(message)),
            Some(Scripted::Missing) => Err(HarnessError::ResourceNotFound {
                kind: target.kind.to_string(),
                name: target.name.clone(),
            }),
            None => Err(HarnessError::QueryError("nothing scripted".to_string())),
        }
    }

    async fn list_names(&self, kind: &ResourceKind, _namespace: Option<&str>) -> Result<Vec<String>> {
        self.record(format!("list {}", kind.plural));
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(kind.plural)
            .cloned()
            .unwrap_or_default())
    }

    async fn patch(&self, target: &ResourceRef, merge_patch: &Value) -> Result<()> {
        self.record(format!("patch {} {}", target, merge_patch));
        Ok(())
    }

    async fn apply(&self, template: &Path, params: &TemplateParams) -> Result<()> {
        let params: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.record(format!("apply {} {}", template.display(), params.join(" ")));
        Ok(())
    }

    async fn delete_manifest(&self, template: &Path, params: &TemplateParams) -> Result<()> {
        let params: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.record(format!("delete -f {} {}", template.display(), params.join(" ")));
        Ok(())
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<()> {
        self.record(format!("ensure namespace {}", namespace));
        Ok(())
    }

    async fn delete(&self, target: &ResourceRef) -> Result<()> {
        self.record(format!("delete {}", target));
        Ok(())
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Fall back to the longest registered prefix
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
