//! Annotation and label keys Spinnaker writes onto the manifests it deploys,
//! plus the helpers that read monikers back out of them.

use std::collections::BTreeMap;

use kube::api::DynamicObject;

pub const APPLICATION: &str = "moniker.spinnaker.io/application";
pub const CLUSTER: &str = "moniker.spinnaker.io/cluster";
pub const SEQUENCE: &str = "moniker.spinnaker.io/sequence";
pub const STACK: &str = "moniker.spinnaker.io/stack";
pub const DETAIL: &str = "moniker.spinnaker.io/detail";
pub const LOAD_BALANCERS: &str = "traffic.spinnaker.io/load-balancers";
pub const DEPLOYMENT_REVISION: &str = "deployment.kubernetes.io/revision";

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const NAME_LABEL: &str = "app.kubernetes.io/name";

pub const DEFAULT_LABEL_SELECTOR: &str =
    "app.kubernetes.io/managed-by in (spinnaker,spinnaker-operator)";

/// Some manifest-injection tooling wraps annotation values in an extra pair
/// of double quotes.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

/// Strips spurious quoting from every annotation value in place.
pub fn normalize(obj: &mut DynamicObject) {
    if let Some(annotations) = obj.metadata.annotations.as_mut() {
        for value in annotations.values_mut() {
            let stripped = strip_quotes(value);
            if stripped.len() != value.len() {
                *value = stripped.to_string();
            }
        }
    }
}

fn non_empty<'a>(map: Option<&'a BTreeMap<String, String>>, key: &str) -> Option<&'a str> {
    map?.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Spinnaker application an object belongs to: the moniker annotation, or the
/// `app.kubernetes.io/name` label when the annotation is missing.
pub fn application(obj: &DynamicObject) -> Option<&str> {
    non_empty(obj.metadata.annotations.as_ref(), APPLICATION)
        .or_else(|| non_empty(obj.metadata.labels.as_ref(), NAME_LABEL))
}

pub fn cluster(obj: &DynamicObject) -> Option<&str> {
    non_empty(obj.metadata.annotations.as_ref(), CLUSTER)
}

/// Revision of an object: the explicit moniker sequence wins, the deployment
/// controller's revision annotation is the fallback.
pub fn sequence(obj: &DynamicObject) -> Option<i64> {
    let annotations = obj.metadata.annotations.as_ref();
    non_empty(annotations, SEQUENCE)
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| non_empty(annotations, DEPLOYMENT_REVISION).and_then(|v| v.trim().parse().ok()))
}

pub fn load_balancers(obj: &DynamicObject) -> Option<&str> {
    non_empty(obj.metadata.annotations.as_ref(), LOAD_BALANCERS)
}
