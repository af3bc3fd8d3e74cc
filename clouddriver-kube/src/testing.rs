//! Fixtures and an in-memory cluster for unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::serde_json::{self, json, Value};
use kube::api::{ApiResource, DynamicObject};

use crate::annotations::{APPLICATION, MANAGED_BY_LABEL};
use crate::client::{Account, ClientProvider, ClusterClient, ListOptions};
use crate::error::{Error, Result};
use crate::resource::TaggedResource;

pub const NAMESPACE: &str = "default";
pub const APP: &str = "web";

pub fn object(value: Value) -> DynamicObject {
    serde_json::from_value(value).expect("fixture is a valid object")
}

pub fn with_owners(mut obj: DynamicObject, owners: &[(&str, &str, &str)]) -> DynamicObject {
    obj.metadata.owner_references = Some(
        owners
            .iter()
            .map(|(kind, name, uid)| OwnerReference {
                api_version: "apps/v1".into(),
                kind: kind.to_string(),
                name: name.to_string(),
                uid: uid.to_string(),
                ..OwnerReference::default()
            })
            .collect(),
    );
    obj
}

pub fn annotate(mut obj: DynamicObject, key: &str, value: &str) -> DynamicObject {
    obj.metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.to_string());
    obj
}

pub fn in_namespace(mut obj: DynamicObject, namespace: &str) -> DynamicObject {
    obj.metadata.namespace = Some(namespace.to_string());
    obj
}

fn metadata(name: &str, uid: &str) -> Value {
    json!({
        "name": name,
        "namespace": NAMESPACE,
        "uid": uid,
        "creationTimestamp": "2024-01-15T10:30:45Z",
        "labels": { MANAGED_BY_LABEL: "spinnaker" },
        "annotations": { APPLICATION: APP },
    })
}

pub fn deployment(name: &str, uid: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": metadata(name, uid),
        "spec": { "replicas": 2 },
    }))
}

/// A ReplicaSet with two desired replicas, one of them ready.
pub fn replica_set(name: &str, uid: &str, template_labels: Value) -> DynamicObject {
    object(json!({
        "apiVersion": "apps/v1",
        "kind": "ReplicaSet",
        "metadata": metadata(name, uid),
        "spec": {
            "replicas": 2,
            "template": {
                "metadata": { "labels": template_labels },
                "spec": { "containers": [{ "name": "web", "image": "nginx:1.27" }] },
            },
        },
        "status": { "replicas": 2, "readyReplicas": 1 },
    }))
}

pub fn stateful_set(name: &str, uid: &str, template_labels: Value) -> DynamicObject {
    object(json!({
        "apiVersion": "apps/v1",
        "kind": "StatefulSet",
        "metadata": metadata(name, uid),
        "spec": {
            "replicas": 3,
            "template": {
                "metadata": { "labels": template_labels },
                "spec": { "containers": [{ "name": "db", "image": "postgres:16" }] },
            },
        },
        "status": { "replicas": 3, "readyReplicas": 3 },
    }))
}

pub fn daemon_set(name: &str, uid: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "apps/v1",
        "kind": "DaemonSet",
        "metadata": metadata(name, uid),
        "spec": {
            "template": {
                "metadata": { "labels": { "app": name } },
                "spec": { "containers": [{ "name": "agent", "image": "fluent-bit:3.0" }] },
            },
        },
        "status": { "desiredNumberScheduled": 4, "numberReady": 3 },
    }))
}

pub fn pod(name: &str, uid: &str, phase: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": metadata(name, uid),
        "spec": { "containers": [{ "name": "web" }, { "name": "envoy" }] },
        "status": { "phase": phase },
    }))
}

pub fn service(name: &str, uid: &str, selector: Value) -> DynamicObject {
    object(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": metadata(name, uid),
        "spec": { "selector": selector },
    }))
}

pub fn ingress(name: &str, uid: &str) -> DynamicObject {
    object(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": metadata(name, uid),
        "spec": { "rules": [] },
    }))
}

pub fn tagged(account: &str, obj: DynamicObject) -> TaggedResource {
    TaggedResource::new(account, APP, obj)
}

/// In-memory cluster with scripted contents, failures and latency.
#[derive(Default)]
pub struct FakeCluster {
    account: String,
    objects: HashMap<String, Vec<DynamicObject>>,
    failing: HashSet<String>,
    fail_discovery: bool,
    latency: Option<Duration>,
    logs: HashMap<(String, String), String>,
    discovered: AtomicBool,
    calls: Mutex<Vec<String>>,
    list_options: Mutex<Vec<ListOptions>>,
}

impl FakeCluster {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, obj: DynamicObject) -> Self {
        let kind = obj
            .types
            .as_ref()
            .map(|t| t.kind.to_ascii_lowercase())
            .unwrap_or_default();
        self.objects.entry(kind).or_default().push(obj);
        self
    }

    pub fn failing(mut self, kind: &str) -> Self {
        self.failing.insert(kind.to_ascii_lowercase());
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    /// Every list call takes this long before answering.
    pub fn slow(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_logs(mut self, pod: &str, container: &str, text: &str) -> Self {
        self.logs
            .insert((pod.to_string(), container.to_string()), text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn list_options(&self) -> Vec<ListOptions> {
        self.list_options.lock().expect("options lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn ensure_discovered(&self) -> Result<()> {
        if self.discovered.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::NotDiscovered(self.account.clone()))
        }
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn account(&self) -> &str {
        &self.account
    }

    async fn discover(&self) -> Result<()> {
        self.record("discover".into());
        if self.fail_discovery {
            return Err(Error::UnknownKind("discovery refused".into()));
        }
        self.discovered.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self, kind: &str, options: &ListOptions) -> Result<Vec<DynamicObject>> {
        self.record(format!("list {kind}"));
        self.list_options
            .lock()
            .expect("options lock")
            .push(options.clone());
        self.ensure_discovered()?;

        if let Some(latency) = self.latency {
            tokio::time::timeout(options.timeout, tokio::time::sleep(latency))
                .await
                .map_err(|_| Error::timeout(format!("list {kind}"), options.timeout))?;
        }
        let kind = kind.to_ascii_lowercase();
        if self.failing.contains(&kind) {
            return Err(Error::UnknownKind(kind));
        }
        Ok(self
            .objects
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|o| match options.namespace.as_deref() {
                Some(ns) => o.metadata.namespace.as_deref() == Some(ns),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        _timeout: Duration,
    ) -> Result<DynamicObject> {
        self.record(format!("get {kind} {name}"));
        self.ensure_discovered()?;
        self.objects
            .get(&kind.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .find(|o| {
                o.metadata.name.as_deref() == Some(name)
                    && o.metadata.namespace.as_deref() == Some(namespace)
            })
            .cloned()
            .ok_or_else(|| Error::NotFound {
                account: self.account.clone(),
                namespace: namespace.to_string(),
                kind: kind.to_string(),
                name: name.to_string(),
            })
    }

    async fn gvr_for_kind(&self, kind: &str) -> Result<ApiResource> {
        self.ensure_discovered()?;
        let plural = format!("{}s", kind.to_ascii_lowercase());
        Ok(ApiResource {
            group: String::new(),
            version: "v1".into(),
            api_version: "v1".into(),
            kind: kind.to_string(),
            plural,
        })
    }

    async fn logs(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        _timeout: Duration,
    ) -> Result<String> {
        self.record(format!("logs {pod} {container}"));
        self.logs
            .get(&(pod.to_string(), container.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                account: self.account.clone(),
                namespace: namespace.to_string(),
                kind: "container".into(),
                name: container.to_string(),
            })
    }
}

/// Hands out pre-built fake clusters by account name.
#[derive(Default)]
pub struct FakeProvider {
    clusters: HashMap<String, Arc<FakeCluster>>,
}

impl FakeProvider {
    pub fn new(clusters: impl IntoIterator<Item = Arc<FakeCluster>>) -> Self {
        Self {
            clusters: clusters
                .into_iter()
                .map(|c| (c.account.clone(), c))
                .collect(),
        }
    }
}

#[async_trait]
impl ClientProvider for FakeProvider {
    async fn client_for(&self, account: &Account) -> Result<Arc<dyn ClusterClient>> {
        let cluster: Arc<dyn ClusterClient> = self
            .clusters
            .get(&account.name)
            .cloned()
            .ok_or_else(|| Error::AccountNotFound(account.name.clone()))?;
        Ok(cluster)
    }
}
