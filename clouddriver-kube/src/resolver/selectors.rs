use std::collections::{BTreeMap, HashMap};

use crate::document;
use crate::kinds;
use crate::resource::TaggedResource;

/// `(account, uid)`.
type Key = (String, String);

fn key(resource: &TaggedResource) -> Key {
    (resource.account.clone(), resource.uid().to_string())
}

/// Whether `selector` fully covers `labels`: every selector key present with
/// an equal value. An empty selector selects nothing.
pub fn selector_matches(
    selector: &BTreeMap<String, String>,
    labels: &BTreeMap<String, String>,
) -> bool {
    if selector.is_empty() {
        return false;
    }
    let mut matching = 0;
    for (key, value) in selector {
        match labels.get(key) {
            Some(label) if label == value => matching += 1,
            Some(_) => {}
            None => break,
        }
    }
    matching == selector.len()
}

fn is_fronting(resource: &TaggedResource) -> bool {
    resource.is_kind(kinds::SERVICE) || resource.is_kind(kinds::INGRESS)
}

/// Pods are only fronted through their owning workload.
fn is_frontable(resource: &TaggedResource) -> bool {
    resource.is_kind(kinds::REPLICA_SET) || resource.is_kind(kinds::STATEFUL_SET)
}

/// Whether `balancer` routes to `workload`.
pub fn fronts(balancer: &TaggedResource, workload: &TaggedResource) -> bool {
    if !is_frontable(workload)
        || balancer.account != workload.account
        || balancer.namespace() != workload.namespace()
    {
        return false;
    }
    let selector = document::selector(&balancer.object).unwrap_or_default();
    let labels = document::template_labels(&workload.object).unwrap_or_default();
    selector_matches(&selector, &labels)
}

/// Service/Ingress to fronted ReplicaSet/StatefulSet, and the inverse.
#[derive(Debug, Default)]
pub struct SelectorIndex<'a> {
    fronted: HashMap<Key, Vec<&'a TaggedResource>>,
    fronting: HashMap<Key, Vec<&'a TaggedResource>>,
}

impl<'a> SelectorIndex<'a> {
    pub fn build(resources: &'a [TaggedResource]) -> Self {
        let balancers: Vec<_> = resources.iter().filter(|r| is_fronting(r)).collect();
        let workloads: Vec<_> = resources.iter().filter(|r| is_frontable(r)).collect();

        let mut index = Self::default();
        for &balancer in &balancers {
            for &workload in &workloads {
                if fronts(balancer, workload) {
                    index.fronted.entry(key(balancer)).or_default().push(workload);
                    index.fronting.entry(key(workload)).or_default().push(balancer);
                }
            }
        }
        index
    }

    /// Workloads the load balancer routes to.
    pub fn fronted_by(&self, balancer: &TaggedResource) -> &[&'a TaggedResource] {
        self.fronted
            .get(&key(balancer))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Load balancers routing to the workload.
    pub fn fronting(&self, workload: &TaggedResource) -> &[&'a TaggedResource] {
        self.fronting
            .get(&key(workload))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
