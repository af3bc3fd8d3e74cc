use std::collections::BTreeMap;

use kube::api::DynamicObject;

use crate::{annotations, kinds};

/// A listed object together with the account it came from and the
/// application it was collected for.
#[derive(Clone, Debug)]
pub struct TaggedResource {
    pub account: String,
    pub application: String,
    pub object: DynamicObject,
}

impl TaggedResource {
    pub fn new(
        account: impl Into<String>,
        application: impl Into<String>,
        object: DynamicObject,
    ) -> Self {
        Self {
            account: account.into(),
            application: application.into(),
            object,
        }
    }

    /// Kubernetes kind as listed, e.g. `ReplicaSet`.
    pub fn kind(&self) -> &str {
        self.object
            .types
            .as_ref()
            .map(|t| t.kind.as_str())
            .unwrap_or_default()
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind().eq_ignore_ascii_case(kind)
    }

    /// Kind as Spinnaker spells it, e.g. `replicaSet`.
    pub fn spinnaker_kind(&self) -> String {
        kinds::lower_camel(self.kind())
    }

    pub fn name(&self) -> &str {
        self.object.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.object.metadata.namespace.as_deref().unwrap_or_default()
    }

    pub fn uid(&self) -> &str {
        self.object.metadata.uid.as_deref().unwrap_or_default()
    }

    /// `(account, uid)`, unique across every cluster in one collection.
    pub fn key(&self) -> (&str, &str) {
        (&self.account, self.uid())
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.object.metadata.labels.clone().unwrap_or_default()
    }

    /// `"<kind> <name>"`, the identifier Spinnaker uses for every entity.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.spinnaker_kind(), self.name())
    }

    /// The moniker cluster: the cluster annotation, else `"<kind> <name>"`.
    pub fn cluster(&self) -> String {
        annotations::cluster(&self.object)
            .map(str::to_string)
            .unwrap_or_else(|| self.display_name())
    }

    /// Moniker application: the object's own annotation, else the
    /// application it was collected for.
    pub fn moniker_app(&self) -> &str {
        annotations::application(&self.object).unwrap_or(&self.application)
    }

    pub fn sequence(&self) -> Option<i64> {
        annotations::sequence(&self.object)
    }

    /// UIDs of every owner reference, skipping empty ones.
    pub fn owner_uids(&self) -> impl Iterator<Item = &str> {
        self.object
            .metadata
            .owner_references
            .iter()
            .flatten()
            .map(|r| r.uid.as_str())
            .filter(|uid| !uid.is_empty())
    }

    /// Names of owners of the given kind.
    pub fn owner_names<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.object
            .metadata
            .owner_references
            .iter()
            .flatten()
            .filter(move |r| r.kind.eq_ignore_ascii_case(kind))
            .map(|r| r.name.as_str())
    }

    /// Creation time in epoch milliseconds.
    pub fn created_time(&self) -> Option<i64> {
        self.object
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|ts| ts.0.timestamp_millis())
    }
}
