//! Path accessors over the schema-less part of a [`DynamicObject`].
//!
//! Every accessor answers `None` when a segment is missing or has the wrong
//! shape; callers decide what absence means.

use std::collections::BTreeMap;

use k8s_openapi::serde_json::Value;
use kube::api::DynamicObject;
use serde_json_path::JsonPath;

const TEMPLATE_LABELS: &[&str] = &["spec", "template", "metadata", "labels"];
const SELECTOR: &[&str] = &["spec", "selector"];
const TEMPLATE_IMAGES: &str = "$.spec.template.spec.containers[*].image";

pub fn value_at<'a>(obj: &'a DynamicObject, path: &[&str]) -> Option<&'a Value> {
    let mut segs = path.iter();
    let mut cur = obj.data.get(segs.next()?)?;
    for s in segs {
        cur = cur.get(s)?;
    }
    Some(cur)
}

pub fn str_at<'a>(obj: &'a DynamicObject, path: &[&str]) -> Option<&'a str> {
    value_at(obj, path)?.as_str()
}

pub fn i64_at(obj: &DynamicObject, path: &[&str]) -> Option<i64> {
    value_at(obj, path)?.as_i64()
}

/// A `string -> string` map at `path`. Non-string values are dropped.
pub fn string_map_at(obj: &DynamicObject, path: &[&str]) -> Option<BTreeMap<String, String>> {
    let map = value_at(obj, path)?.as_object()?;
    Some(
        map.iter()
            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
            .collect(),
    )
}

/// `spec.template.metadata.labels` of a workload.
pub fn template_labels(obj: &DynamicObject) -> Option<BTreeMap<String, String>> {
    string_map_at(obj, TEMPLATE_LABELS)
}

/// The flat `spec.selector` map of a Service. Workload selectors are
/// `LabelSelector` objects and do not read as a flat map.
pub fn selector(obj: &DynamicObject) -> Option<BTreeMap<String, String>> {
    string_map_at(obj, SELECTOR)
}

pub fn template_images(obj: &DynamicObject) -> Vec<String> {
    let Ok(path) = JsonPath::parse(TEMPLATE_IMAGES) else {
        return Vec::new();
    };
    path.query(&obj.data)
        .all()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

pub fn container_names(obj: &DynamicObject) -> Vec<String> {
    value_at(obj, &["spec", "containers"])
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .filter_map(|c| c.get("name")?.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn pod_phase(obj: &DynamicObject) -> Option<&str> {
    str_at(obj, &["status", "phase"])
}
